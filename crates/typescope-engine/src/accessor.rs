//! Unified Property-or-Field Accessor
//!
//! [`PropertyOrField`] reads and writes a field or a property through one
//! interface. Fields are always readable and writable; a property can read
//! when it has a getter and write when it has a setter.
//!
//! | Operation        | Capability missing       | Runtime failure        |
//! |------------------|--------------------------|------------------------|
//! | `get_value`      | `InvalidOperation`       | propagated             |
//! | `try_get_value`  | `None`                   | `None`                 |
//! | `set_value`      | `InvalidOperation`       | propagated             |
//! | `try_set_value`  | `false`                  | `false`                |
//!
//! Static members take `Value::Null` as receiver.

use typescope_runtime::{TypeHandle, Value, Visibility};

use crate::conventions::{BackingFieldConventions, BackingFieldResolver};
use crate::descriptor::{FieldDescriptor, MemberDescriptor, PropertyDescriptor};
use crate::error::{ReflectError, ReflectResult};
use crate::naming;

/// A field or a property, behind one read/write interface
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyOrField {
    /// Wrapped property
    Property(PropertyDescriptor),
    /// Wrapped field
    Field(FieldDescriptor),
}

impl PropertyOrField {
    /// Wrap a field or property descriptor
    pub fn new(member: MemberDescriptor) -> ReflectResult<Self> {
        match member {
            MemberDescriptor::Property(p) => Ok(PropertyOrField::Property(p)),
            MemberDescriptor::Field(f) => Ok(PropertyOrField::Field(f)),
            other => Err(ReflectError::UnsupportedKind(format!(
                "{} '{}' is not a property or field",
                other.kind(),
                naming::member_name(&other)
            ))),
        }
    }

    /// Member name
    pub fn name(&self) -> &str {
        match self {
            PropertyOrField::Property(p) => p.name(),
            PropertyOrField::Field(f) => f.name(),
        }
    }

    /// Declaring type
    pub fn declaring_type(&self) -> &TypeHandle {
        match self {
            PropertyOrField::Property(p) => p.declaring_type(),
            PropertyOrField::Field(f) => f.declaring_type(),
        }
    }

    /// Accessibility
    pub fn visibility(&self) -> Visibility {
        match self {
            PropertyOrField::Property(p) => p.visibility(),
            PropertyOrField::Field(f) => f.visibility(),
        }
    }

    /// Static member
    pub fn is_static(&self) -> bool {
        match self {
            PropertyOrField::Property(p) => p.is_static(),
            PropertyOrField::Field(f) => f.is_static(),
        }
    }

    /// Type of the stored value
    pub fn value_type(&self) -> &TypeHandle {
        match self {
            PropertyOrField::Property(p) => p.property_type(),
            PropertyOrField::Field(f) => f.field_type(),
        }
    }

    /// Wrapped indexer
    pub fn is_indexer(&self) -> bool {
        matches!(self, PropertyOrField::Property(p) if p.is_indexer())
    }

    /// Whether reads are possible
    pub fn can_read(&self) -> bool {
        match self {
            PropertyOrField::Property(p) => p.has_getter(),
            PropertyOrField::Field(_) => true,
        }
    }

    /// Whether writes are possible
    pub fn can_write(&self) -> bool {
        match self {
            PropertyOrField::Property(p) => p.has_setter(),
            PropertyOrField::Field(_) => true,
        }
    }

    /// The wrapped member as a descriptor
    pub fn descriptor(&self) -> MemberDescriptor {
        match self {
            PropertyOrField::Property(p) => MemberDescriptor::Property(p.clone()),
            PropertyOrField::Field(f) => MemberDescriptor::Field(f.clone()),
        }
    }

    fn qualified_name(&self) -> String {
        naming::member_name(&self.descriptor())
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    /// Read the value from `instance`
    pub fn get_value(&self, instance: &Value) -> ReflectResult<Value> {
        match self {
            PropertyOrField::Field(f) => f.get_value(instance),
            PropertyOrField::Property(p) => match p.getter() {
                Some(getter) => getter.invoke(instance, &[]),
                None => Err(ReflectError::InvalidOperation(format!(
                    "using get on a write-only property '{}'",
                    p.name()
                ))),
            },
        }
    }

    /// Read the value, `None` on any failure
    pub fn try_get_value(&self, instance: &Value) -> Option<Value> {
        match self.get_value(instance) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::trace!(member = %self.qualified_name(), error = %err, "lenient read failed");
                None
            }
        }
    }

    /// Write `value` into `instance`
    pub fn set_value(&self, instance: &Value, value: Value) -> ReflectResult<()> {
        match self {
            PropertyOrField::Field(f) => f.set_value(instance, value),
            PropertyOrField::Property(p) => match p.setter() {
                Some(setter) => setter.invoke(instance, &[value]).map(|_| ()),
                None => Err(ReflectError::InvalidOperation(format!(
                    "using set on a read-only property '{}'",
                    p.name()
                ))),
            },
        }
    }

    /// Write `value`, reporting success instead of failing
    pub fn try_set_value(&self, instance: &Value, value: Value) -> bool {
        match self.set_value(instance, value) {
            Ok(()) => true,
            Err(err) => {
                tracing::trace!(member = %self.qualified_name(), error = %err, "lenient write failed");
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Narrowing
    // ------------------------------------------------------------------------

    /// The wrapped property, if any
    pub fn try_as_property(&self) -> Option<&PropertyDescriptor> {
        match self {
            PropertyOrField::Property(p) => Some(p),
            PropertyOrField::Field(_) => None,
        }
    }

    /// The wrapped property
    pub fn as_property(&self) -> ReflectResult<&PropertyDescriptor> {
        self.try_as_property().ok_or_else(|| {
            ReflectError::InvalidCast(format!("'{}' is a field, not a property", self.qualified_name()))
        })
    }

    /// The wrapped field, if any
    pub fn try_as_field(&self) -> Option<&FieldDescriptor> {
        match self {
            PropertyOrField::Field(f) => Some(f),
            PropertyOrField::Property(_) => None,
        }
    }

    /// The wrapped field
    pub fn as_field(&self) -> ReflectResult<&FieldDescriptor> {
        self.try_as_field().ok_or_else(|| {
            ReflectError::InvalidCast(format!("'{}' is a property, not a field", self.qualified_name()))
        })
    }

    // ------------------------------------------------------------------------
    // Backing fields
    // ------------------------------------------------------------------------

    /// Whether this is a field backing some property, under the default conventions
    pub fn is_backing_field(&self) -> bool {
        self.is_backing_field_with(&BackingFieldConventions::default())
    }

    /// Whether this is a field backing some property, under `conventions`
    pub fn is_backing_field_with(&self, conventions: &BackingFieldConventions) -> bool {
        match self {
            PropertyOrField::Field(f) => {
                BackingFieldResolver::new(conventions.clone()).is_backing_field(f)
            }
            PropertyOrField::Property(_) => false,
        }
    }
}

impl From<PropertyDescriptor> for PropertyOrField {
    fn from(property: PropertyDescriptor) -> Self {
        PropertyOrField::Property(property)
    }
}

impl From<FieldDescriptor> for PropertyOrField {
    fn from(field: FieldDescriptor) -> Self {
        PropertyOrField::Field(field)
    }
}

impl TryFrom<MemberDescriptor> for PropertyOrField {
    type Error = ReflectError;

    fn try_from(member: MemberDescriptor) -> ReflectResult<Self> {
        PropertyOrField::new(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typescope_runtime::{
        interpreter, types, AccessorDefinition, ClassBuilder, ConstructorDefinition,
        FieldDefinition, MethodDefinition, PropertyDefinition,
    };

    use crate::descriptor::ConstructorDescriptor;
    use crate::query::MemberQueries;

    fn sample() -> TypeHandle {
        let mut builder = ClassBuilder::class("Sample");
        builder
            .add_field(FieldDefinition::new("count", types::int32()))
            .unwrap();
        builder
            .add_property(PropertyDefinition::new("Label", types::string()).auto())
            .unwrap();
        builder
            .add_property(
                PropertyDefinition::new("Sink", types::string())
                    .with_setter(AccessorDefinition::native(|_| Ok(Value::Null))),
            )
            .unwrap();
        builder
            .add_property(
                PropertyDefinition::new("Constant", types::int32())
                    .with_getter(AccessorDefinition::native(|_| Ok(Value::i32(7)))),
            )
            .unwrap();
        builder
            .add_method(MethodDefinition::new("Reset").native(|_| Ok(Value::Null)))
            .unwrap();
        builder.add_constructor(ConstructorDefinition::new()).unwrap();
        builder.build().unwrap()
    }

    fn instance(ty: &TypeHandle) -> Value {
        Value::Object(interpreter::construct(ty, &[]).unwrap())
    }

    #[test]
    fn test_field_round_trip() {
        let ty = sample();
        let target = instance(&ty);
        let count = PropertyOrField::from(ty.fields().named("count").unwrap());
        assert!(count.can_read() && count.can_write());
        count.set_value(&target, Value::i32(3)).unwrap();
        assert_eq!(count.get_value(&target).unwrap(), Value::i32(3));
    }

    #[test]
    fn test_write_only_property() {
        let ty = sample();
        let target = instance(&ty);
        let sink = PropertyOrField::from(ty.properties().named("Sink").unwrap());
        assert!(!sink.can_read());
        let err = sink.get_value(&target).unwrap_err();
        assert_eq!(
            err,
            ReflectError::InvalidOperation("using get on a write-only property 'Sink'".to_string())
        );
        assert!(sink.try_get_value(&target).is_none());
        assert!(sink.try_set_value(&target, Value::string("x")));
    }

    #[test]
    fn test_read_only_property() {
        let ty = sample();
        let target = instance(&ty);
        let constant = PropertyOrField::from(ty.properties().named("Constant").unwrap());
        assert_eq!(constant.get_value(&target).unwrap(), Value::i32(7));
        assert!(matches!(
            constant.set_value(&target, Value::i32(1)),
            Err(ReflectError::InvalidOperation(_))
        ));
        assert!(!constant.try_set_value(&target, Value::i32(1)));
    }

    #[test]
    fn test_lenient_calls_swallow_runtime_errors() {
        let ty = sample();
        let label = PropertyOrField::from(ty.properties().named("Label").unwrap());
        assert!(label.try_get_value(&Value::Null).is_none());
        assert!(!label.try_set_value(&instance(&ty), Value::i32(1)));
    }

    #[test]
    fn test_unsupported_kind() {
        let ty = sample();
        let reset = ty.methods().named("Reset").unwrap();
        assert!(matches!(
            PropertyOrField::new(MemberDescriptor::Method(reset)),
            Err(ReflectError::UnsupportedKind(_))
        ));
        let ctor: ConstructorDescriptor = ty.constructors().single().unwrap();
        assert!(PropertyOrField::try_from(MemberDescriptor::Constructor(ctor)).is_err());
    }

    #[test]
    fn test_narrowing() {
        let ty = sample();
        let count = PropertyOrField::from(ty.fields().named("count").unwrap());
        assert!(count.as_field().is_ok());
        assert!(count.try_as_property().is_none());
        let err = count.as_property().unwrap_err();
        assert_eq!(
            err,
            ReflectError::InvalidCast("'Sample.count' is a field, not a property".to_string())
        );
    }

    #[test]
    fn test_auto_storage_is_backing_field() {
        let ty = sample();
        let storage = ty
            .fields()
            .named(&typescope_runtime::backing_field_name("Label"))
            .unwrap();
        assert!(PropertyOrField::from(storage).is_backing_field());
        let count = PropertyOrField::from(ty.fields().named("count").unwrap());
        assert!(!count.is_backing_field());
    }
}
