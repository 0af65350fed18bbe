//! Member Descriptors
//!
//! A descriptor pairs a runtime member definition with the [`TypeHandle`] of
//! the type that declares it. Descriptors of every kind share one identity:
//!
//! > name + declaring type + ordered parameter types + generic arity
//!
//! Return types, flags and attributes do not take part. `PartialEq` and
//! `Hash` follow this identity on every descriptor type.
//!
//! [`MemberSignature`] is the same key without the declaring type; the
//! deduplicator uses it to collapse a member shadowed at several levels of a
//! hierarchy.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use typescope_runtime::{
    interpreter, ConstructorDef, Delegate, EventDef, FieldDef, MemberKind, MethodDef, ObjectRef,
    PropertyDef, TypeHandle, TypeId, Value, Visibility,
};

use crate::error::{ReflectError, ReflectResult};

/// Declaring-type-agnostic member key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberSignature {
    /// Member kind
    pub kind: MemberKind,
    /// Member name
    pub name: String,
    /// Parameter (or index parameter) types
    pub parameter_types: Vec<TypeId>,
    /// Generic arity
    pub generic_arity: usize,
}

#[derive(PartialEq, Eq, Hash)]
struct Identity<'a> {
    name: &'a str,
    declaring_type: TypeId,
    parameter_types: Vec<TypeId>,
    generic_arity: usize,
}

fn type_ids(types: &[TypeHandle]) -> Vec<TypeId> {
    types.iter().map(TypeHandle::id).collect()
}

/// Split a receiver value into the form the runtime expects
pub(crate) fn receiver_of(instance: &Value) -> ReflectResult<Option<&ObjectRef>> {
    match instance {
        Value::Null => Ok(None),
        Value::Object(object) => Ok(Some(object)),
        other => Err(ReflectError::InvalidArgument(format!(
            "receiver must be an object, got {}",
            other.describe()
        ))),
    }
}

macro_rules! descriptor_identity {
    ($descriptor:ident) => {
        impl PartialEq for $descriptor {
            fn eq(&self, other: &Self) -> bool {
                self.identity() == other.identity()
            }
        }

        impl Eq for $descriptor {}

        impl Hash for $descriptor {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.identity().hash(state);
            }
        }
    };
}

// ============================================================================
// Fields
// ============================================================================

/// Descriptor of a field
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    declaring_type: TypeHandle,
    def: Arc<FieldDef>,
}

impl FieldDescriptor {
    /// Wrap a field declared on `declaring_type`
    pub fn new(declaring_type: TypeHandle, def: Arc<FieldDef>) -> Self {
        Self { declaring_type, def }
    }

    fn identity(&self) -> Identity<'_> {
        Identity {
            name: &self.def.name,
            declaring_type: self.declaring_type.id(),
            parameter_types: Vec::new(),
            generic_arity: 0,
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Declaring type
    pub fn declaring_type(&self) -> &TypeHandle {
        &self.declaring_type
    }

    /// Runtime definition
    pub fn def(&self) -> &Arc<FieldDef> {
        &self.def
    }

    /// Field type
    pub fn field_type(&self) -> &TypeHandle {
        &self.def.field_type
    }

    /// Accessibility
    pub fn visibility(&self) -> Visibility {
        self.def.visibility
    }

    /// Static field
    pub fn is_static(&self) -> bool {
        self.def.is_static()
    }

    /// Assignable only during construction
    pub fn is_readonly(&self) -> bool {
        self.def.is_readonly
    }

    /// Storage synthesized for an auto-implemented property
    pub fn is_auto_property_storage(&self) -> bool {
        self.def.is_auto_property_storage
    }

    /// Read the field; pass `Value::Null` for static fields
    pub fn get_value(&self, instance: &Value) -> ReflectResult<Value> {
        Ok(interpreter::read_field(&self.def, receiver_of(instance)?)?)
    }

    /// Write the field; pass `Value::Null` for static fields
    pub fn set_value(&self, instance: &Value, value: Value) -> ReflectResult<()> {
        Ok(interpreter::write_field(&self.def, receiver_of(instance)?, value)?)
    }
}

descriptor_identity!(FieldDescriptor);

// ============================================================================
// Properties
// ============================================================================

/// Descriptor of a property or indexer
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    declaring_type: TypeHandle,
    def: Arc<PropertyDef>,
}

impl PropertyDescriptor {
    /// Wrap a property declared on `declaring_type`
    pub fn new(declaring_type: TypeHandle, def: Arc<PropertyDef>) -> Self {
        Self { declaring_type, def }
    }

    fn identity(&self) -> Identity<'_> {
        Identity {
            name: &self.def.name,
            declaring_type: self.declaring_type.id(),
            parameter_types: type_ids(&self.def.index_parameter_types()),
            generic_arity: 0,
        }
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Declaring type
    pub fn declaring_type(&self) -> &TypeHandle {
        &self.declaring_type
    }

    /// Runtime definition
    pub fn def(&self) -> &Arc<PropertyDef> {
        &self.def
    }

    /// Value type
    pub fn property_type(&self) -> &TypeHandle {
        &self.def.property_type
    }

    /// Widest accessor accessibility
    pub fn visibility(&self) -> Visibility {
        self.def.visibility()
    }

    /// Static property
    pub fn is_static(&self) -> bool {
        self.def.is_static()
    }

    /// Whether a getter exists
    pub fn has_getter(&self) -> bool {
        self.def.getter.is_some()
    }

    /// Whether a setter exists
    pub fn has_setter(&self) -> bool {
        self.def.setter.is_some()
    }

    /// Getter only
    pub fn is_read_only(&self) -> bool {
        self.has_getter() && !self.has_setter()
    }

    /// Setter only
    pub fn is_write_only(&self) -> bool {
        self.has_setter() && !self.has_getter()
    }

    /// Takes index parameters
    pub fn is_indexer(&self) -> bool {
        self.def.is_indexer()
    }

    /// Index parameter types
    pub fn index_parameter_types(&self) -> Vec<TypeHandle> {
        self.def.index_parameter_types()
    }

    /// Backed by runtime-synthesized storage
    pub fn is_auto_property(&self) -> bool {
        let storage = typescope_runtime::backing_field_name(&self.def.name);
        self.declaring_type
            .declared_fields()
            .any(|f| f.is_auto_property_storage && f.name == storage)
    }

    /// Getter accessor
    pub fn getter(&self) -> Option<MethodDescriptor> {
        self.def
            .getter
            .as_ref()
            .map(|m| MethodDescriptor::new(self.declaring_type.clone(), m.clone()))
    }

    /// Setter accessor
    pub fn setter(&self) -> Option<MethodDescriptor> {
        self.def
            .setter
            .as_ref()
            .map(|m| MethodDescriptor::new(self.declaring_type.clone(), m.clone()))
    }
}

descriptor_identity!(PropertyDescriptor);

// ============================================================================
// Methods and Constructors
// ============================================================================

/// Descriptor of a method or accessor
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    declaring_type: TypeHandle,
    def: Arc<MethodDef>,
}

impl MethodDescriptor {
    /// Wrap a method declared on `declaring_type`
    pub fn new(declaring_type: TypeHandle, def: Arc<MethodDef>) -> Self {
        Self { declaring_type, def }
    }

    fn identity(&self) -> Identity<'_> {
        Identity {
            name: &self.def.name,
            declaring_type: self.declaring_type.id(),
            parameter_types: type_ids(&self.def.parameter_types()),
            generic_arity: self.def.generic_arity(),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Declaring type
    pub fn declaring_type(&self) -> &TypeHandle {
        &self.declaring_type
    }

    /// Runtime definition
    pub fn def(&self) -> &Arc<MethodDef> {
        &self.def
    }

    /// Return type
    pub fn return_type(&self) -> &TypeHandle {
        &self.def.return_type
    }

    /// Ordered parameter types
    pub fn parameter_types(&self) -> Vec<TypeHandle> {
        self.def.parameter_types()
    }

    /// Number of generic parameters
    pub fn generic_arity(&self) -> usize {
        self.def.generic_arity()
    }

    /// Accessibility
    pub fn visibility(&self) -> Visibility {
        self.def.visibility
    }

    /// Static method
    pub fn is_static(&self) -> bool {
        self.def.is_static
    }

    /// Virtual method
    pub fn is_virtual(&self) -> bool {
        self.def.is_virtual
    }

    /// Abstract method
    pub fn is_abstract(&self) -> bool {
        self.def.is_abstract
    }

    /// Closed to further overriding
    pub fn is_final(&self) -> bool {
        self.def.is_final
    }

    /// Can be overridden by a derived type
    pub fn is_overridable(&self) -> bool {
        self.def.is_overridable()
    }

    /// Property or event accessor
    pub fn is_special_name(&self) -> bool {
        self.def.is_special_name()
    }

    /// Invoke with virtual dispatch; pass `Value::Null` for static methods
    pub fn invoke(&self, instance: &Value, args: &[Value]) -> ReflectResult<Value> {
        Ok(interpreter::invoke(&self.def, receiver_of(instance)?, args)?)
    }
}

descriptor_identity!(MethodDescriptor);

/// Descriptor of a constructor
#[derive(Debug, Clone)]
pub struct ConstructorDescriptor {
    declaring_type: TypeHandle,
    def: Arc<ConstructorDef>,
}

impl ConstructorDescriptor {
    /// Wrap a constructor declared on `declaring_type`
    pub fn new(declaring_type: TypeHandle, def: Arc<ConstructorDef>) -> Self {
        Self { declaring_type, def }
    }

    fn identity(&self) -> Identity<'_> {
        Identity {
            name: self.name(),
            declaring_type: self.declaring_type.id(),
            parameter_types: type_ids(&self.def.parameter_types()),
            generic_arity: 0,
        }
    }

    /// `.ctor`, or `.cctor` for the type initializer
    pub fn name(&self) -> &str {
        if self.def.is_static {
            ".cctor"
        } else {
            ".ctor"
        }
    }

    /// Declaring type
    pub fn declaring_type(&self) -> &TypeHandle {
        &self.declaring_type
    }

    /// Runtime definition
    pub fn def(&self) -> &Arc<ConstructorDef> {
        &self.def
    }

    /// Ordered parameter types
    pub fn parameter_types(&self) -> Vec<TypeHandle> {
        self.def.parameter_types()
    }

    /// Accessibility
    pub fn visibility(&self) -> Visibility {
        self.def.visibility
    }

    /// Type initializer
    pub fn is_static(&self) -> bool {
        self.def.is_static
    }

    /// Create an instance of the declaring type
    pub fn invoke(&self, args: &[Value]) -> ReflectResult<ObjectRef> {
        Ok(interpreter::invoke_constructor(
            &self.declaring_type,
            &self.def,
            args,
        )?)
    }
}

descriptor_identity!(ConstructorDescriptor);

// ============================================================================
// Events
// ============================================================================

/// Descriptor of an event
#[derive(Debug, Clone)]
pub struct EventDescriptor {
    declaring_type: TypeHandle,
    def: Arc<EventDef>,
}

impl EventDescriptor {
    /// Wrap an event declared on `declaring_type`
    pub fn new(declaring_type: TypeHandle, def: Arc<EventDef>) -> Self {
        Self { declaring_type, def }
    }

    fn identity(&self) -> Identity<'_> {
        Identity {
            name: &self.def.name,
            declaring_type: self.declaring_type.id(),
            parameter_types: Vec::new(),
            generic_arity: 0,
        }
    }

    /// Event name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Declaring type
    pub fn declaring_type(&self) -> &TypeHandle {
        &self.declaring_type
    }

    /// Runtime definition
    pub fn def(&self) -> &Arc<EventDef> {
        &self.def
    }

    /// Delegate type of subscribers
    pub fn handler_type(&self) -> &TypeHandle {
        &self.def.handler_type
    }

    /// Accessibility
    pub fn visibility(&self) -> Visibility {
        self.def.visibility()
    }

    /// Static event
    pub fn is_static(&self) -> bool {
        self.def.is_static()
    }

    /// Subscribe a handler
    pub fn add_handler(&self, instance: &Value, handler: Delegate) -> ReflectResult<()> {
        interpreter::invoke(&self.def.add, receiver_of(instance)?, &[Value::Delegate(handler)])?;
        Ok(())
    }

    /// Unsubscribe a handler
    pub fn remove_handler(&self, instance: &Value, handler: Delegate) -> ReflectResult<()> {
        interpreter::invoke(
            &self.def.remove,
            receiver_of(instance)?,
            &[Value::Delegate(handler)],
        )?;
        Ok(())
    }
}

descriptor_identity!(EventDescriptor);

// ============================================================================
// Any Member
// ============================================================================

/// Descriptor of a member of any kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberDescriptor {
    /// Field
    Field(FieldDescriptor),
    /// Property or indexer
    Property(PropertyDescriptor),
    /// Method or accessor
    Method(MethodDescriptor),
    /// Constructor or type initializer
    Constructor(ConstructorDescriptor),
    /// Event
    Event(EventDescriptor),
}

impl MemberDescriptor {
    /// Member kind
    pub fn kind(&self) -> MemberKind {
        match self {
            MemberDescriptor::Field(_) => MemberKind::Field,
            MemberDescriptor::Property(_) => MemberKind::Property,
            MemberDescriptor::Method(_) => MemberKind::Method,
            MemberDescriptor::Constructor(_) => MemberKind::Constructor,
            MemberDescriptor::Event(_) => MemberKind::Event,
        }
    }

    /// Member name
    pub fn name(&self) -> &str {
        match self {
            MemberDescriptor::Field(f) => f.name(),
            MemberDescriptor::Property(p) => p.name(),
            MemberDescriptor::Method(m) => m.name(),
            MemberDescriptor::Constructor(c) => c.name(),
            MemberDescriptor::Event(e) => e.name(),
        }
    }

    /// Declaring type
    pub fn declaring_type(&self) -> &TypeHandle {
        match self {
            MemberDescriptor::Field(f) => f.declaring_type(),
            MemberDescriptor::Property(p) => p.declaring_type(),
            MemberDescriptor::Method(m) => m.declaring_type(),
            MemberDescriptor::Constructor(c) => c.declaring_type(),
            MemberDescriptor::Event(e) => e.declaring_type(),
        }
    }

    /// Accessibility
    pub fn visibility(&self) -> Visibility {
        match self {
            MemberDescriptor::Field(f) => f.visibility(),
            MemberDescriptor::Property(p) => p.visibility(),
            MemberDescriptor::Method(m) => m.visibility(),
            MemberDescriptor::Constructor(c) => c.visibility(),
            MemberDescriptor::Event(e) => e.visibility(),
        }
    }

    /// Static member
    pub fn is_static(&self) -> bool {
        match self {
            MemberDescriptor::Field(f) => f.is_static(),
            MemberDescriptor::Property(p) => p.is_static(),
            MemberDescriptor::Method(m) => m.is_static(),
            MemberDescriptor::Constructor(c) => c.is_static(),
            MemberDescriptor::Event(e) => e.is_static(),
        }
    }

    /// Parameter types of callables, index parameter types of indexers
    pub fn parameter_types(&self) -> Vec<TypeHandle> {
        match self {
            MemberDescriptor::Property(p) => p.index_parameter_types(),
            MemberDescriptor::Method(m) => m.parameter_types(),
            MemberDescriptor::Constructor(c) => c.parameter_types(),
            MemberDescriptor::Field(_) | MemberDescriptor::Event(_) => Vec::new(),
        }
    }

    /// Generic arity (methods only)
    pub fn generic_arity(&self) -> usize {
        match self {
            MemberDescriptor::Method(m) => m.generic_arity(),
            _ => 0,
        }
    }

    /// Key used to collapse shadowed declarations
    pub fn signature(&self) -> MemberSignature {
        MemberSignature {
            kind: self.kind(),
            name: self.name().to_string(),
            parameter_types: type_ids(&self.parameter_types()),
            generic_arity: self.generic_arity(),
        }
    }

    /// Field descriptor, if this is a field
    pub fn as_field(&self) -> Option<&FieldDescriptor> {
        match self {
            MemberDescriptor::Field(f) => Some(f),
            _ => None,
        }
    }

    /// Property descriptor, if this is a property
    pub fn as_property(&self) -> Option<&PropertyDescriptor> {
        match self {
            MemberDescriptor::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Method descriptor, if this is a method
    pub fn as_method(&self) -> Option<&MethodDescriptor> {
        match self {
            MemberDescriptor::Method(m) => Some(m),
            _ => None,
        }
    }

    /// Constructor descriptor, if this is a constructor
    pub fn as_constructor(&self) -> Option<&ConstructorDescriptor> {
        match self {
            MemberDescriptor::Constructor(c) => Some(c),
            _ => None,
        }
    }

    /// Event descriptor, if this is an event
    pub fn as_event(&self) -> Option<&EventDescriptor> {
        match self {
            MemberDescriptor::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FieldDescriptor> for MemberDescriptor {
    fn from(field: FieldDescriptor) -> Self {
        MemberDescriptor::Field(field)
    }
}

impl From<PropertyDescriptor> for MemberDescriptor {
    fn from(property: PropertyDescriptor) -> Self {
        MemberDescriptor::Property(property)
    }
}

impl From<MethodDescriptor> for MemberDescriptor {
    fn from(method: MethodDescriptor) -> Self {
        MemberDescriptor::Method(method)
    }
}

impl From<ConstructorDescriptor> for MemberDescriptor {
    fn from(constructor: ConstructorDescriptor) -> Self {
        MemberDescriptor::Constructor(constructor)
    }
}

impl From<EventDescriptor> for MemberDescriptor {
    fn from(event: EventDescriptor) -> Self {
        MemberDescriptor::Event(event)
    }
}
