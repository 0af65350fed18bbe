//! Member Definitions
//!
//! Declared members of a runtime type. Each definition records the
//! [`TypeId`] of the type that declares it rather than a handle, so member
//! tables never form reference cycles with their owning [`TypeDef`].
//!
//! Property and event accessors are ordinary [`MethodDef`]s carrying an
//! [`AccessorRole`]; they appear both inside their owner and in the
//! declaring type's method list.
//!
//! [`TypeDef`]: crate::types::TypeDef

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::body::MethodBody;
use crate::types::{TypeHandle, TypeId};
use crate::value::Value;

/// Member accessibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Accessible everywhere
    Public,
    /// Accessible within the defining assembly
    Internal,
    /// Accessible to derived types
    Protected,
    /// Accessible to derived types or the defining assembly
    ProtectedInternal,
    /// Accessible to derived types within the defining assembly
    PrivateProtected,
    /// Accessible to the declaring type only
    Private,
}

impl Visibility {
    /// Source keyword for this visibility
    pub fn keyword(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Protected => "protected",
            Visibility::ProtectedInternal => "protected internal",
            Visibility::PrivateProtected => "private protected",
            Visibility::Private => "private",
        }
    }

    /// Whether accessible everywhere
    pub fn is_public(&self) -> bool {
        *self == Visibility::Public
    }

    /// Ordering from least (0) to most (5) accessible
    pub fn rank(&self) -> u8 {
        match self {
            Visibility::Private => 0,
            Visibility::PrivateProtected => 1,
            Visibility::Internal => 2,
            Visibility::Protected => 3,
            Visibility::ProtectedInternal => 4,
            Visibility::Public => 5,
        }
    }

    /// The more accessible of two visibilities
    pub fn widest(self, other: Visibility) -> Visibility {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Kind of a declared member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Field
    Field,
    /// Property (indexers included)
    Property,
    /// Method (accessors included)
    Method,
    /// Constructor
    Constructor,
    /// Event
    Event,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
            MemberKind::Event => "event",
        })
    }
}

/// Parameter of a method, constructor or indexer
#[derive(Debug, Clone)]
pub struct ParameterDef {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: TypeHandle,
}

/// Storage shared by the static fields of one type
#[derive(Debug, Default)]
pub(crate) struct StaticStorage {
    values: Mutex<Vec<Value>>,
}

impl StaticStorage {
    pub(crate) fn push(&self, value: Value) -> usize {
        let mut values = self.values.lock();
        values.push(value);
        values.len() - 1
    }
}

/// A static storage cell
#[derive(Debug, Clone)]
pub struct StaticSlot {
    storage: Arc<StaticStorage>,
    index: usize,
}

impl StaticSlot {
    pub(crate) fn new(storage: Arc<StaticStorage>, index: usize) -> Self {
        Self { storage, index }
    }

    /// Read the current value
    pub fn load(&self) -> Value {
        self.storage
            .values
            .lock()
            .get(self.index)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Replace the current value
    pub fn store(&self, value: Value) {
        let mut values = self.storage.values.lock();
        if let Some(cell) = values.get_mut(self.index) {
            *cell = value;
        }
    }
}

/// Where a field's value lives
#[derive(Debug, Clone)]
pub enum FieldLocation {
    /// Slot index inside every instance
    Instance(usize),
    /// Cell in the declaring type's static storage
    Static(StaticSlot),
}

impl FieldLocation {
    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        matches!(self, FieldLocation::Static(_))
    }
}

/// Declared field
#[derive(Debug)]
pub struct FieldDef {
    /// Declaring type
    pub declaring_type: TypeId,
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: TypeHandle,
    /// Accessibility
    pub visibility: Visibility,
    /// Whether assignment is limited to construction
    pub is_readonly: bool,
    /// Compiler-synthesized storage of an auto-implemented property
    pub is_auto_property_storage: bool,
    /// Storage location
    pub location: FieldLocation,
}

impl FieldDef {
    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        self.location.is_static()
    }
}

/// What a special-name method implements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorRole {
    /// Property getter
    PropertyGet(String),
    /// Property setter
    PropertySet(String),
    /// Event subscription
    EventAdd(String),
    /// Event unsubscription
    EventRemove(String),
}

impl AccessorRole {
    /// Name of the owning property or event
    pub fn owner(&self) -> &str {
        match self {
            AccessorRole::PropertyGet(name)
            | AccessorRole::PropertySet(name)
            | AccessorRole::EventAdd(name)
            | AccessorRole::EventRemove(name) => name,
        }
    }
}

/// Declared method
#[derive(Debug)]
pub struct MethodDef {
    /// Declaring type
    pub declaring_type: TypeId,
    /// Method name
    pub name: String,
    /// Return type (`void` for none)
    pub return_type: TypeHandle,
    /// Ordered parameters
    pub parameters: Vec<ParameterDef>,
    /// Generic parameter names, in order
    pub generic_parameters: Vec<String>,
    /// Accessibility
    pub visibility: Visibility,
    /// Static method
    pub is_static: bool,
    /// Dispatched on the receiver's runtime type
    pub is_virtual: bool,
    /// No body; must be overridden
    pub is_abstract: bool,
    /// Virtual but closed to further overriding
    pub is_final: bool,
    /// Set for property and event accessors
    pub accessor: Option<AccessorRole>,
    /// Executable body
    pub body: MethodBody,
}

impl MethodDef {
    /// Parameter types in order
    pub fn parameter_types(&self) -> Vec<TypeHandle> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }

    /// Number of generic parameters
    pub fn generic_arity(&self) -> usize {
        self.generic_parameters.len()
    }

    /// Whether this is a property or event accessor
    pub fn is_special_name(&self) -> bool {
        self.accessor.is_some()
    }

    /// Whether a derived type may override this method
    pub fn is_overridable(&self) -> bool {
        (self.is_virtual || self.is_abstract) && !self.is_final && !self.is_static
    }

    /// Same name, parameter types and generic arity
    pub fn has_same_signature(&self, other: &MethodDef) -> bool {
        self.name == other.name
            && self.generic_arity() == other.generic_arity()
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(other.parameters.iter())
                .all(|(a, b)| a.ty == b.ty)
    }
}

/// Declared constructor
#[derive(Debug)]
pub struct ConstructorDef {
    /// Declaring type
    pub declaring_type: TypeId,
    /// Ordered parameters
    pub parameters: Vec<ParameterDef>,
    /// Accessibility
    pub visibility: Visibility,
    /// Type initializer rather than instance constructor
    pub is_static: bool,
    /// Executable body
    pub body: MethodBody,
}

impl ConstructorDef {
    /// Parameter types in order
    pub fn parameter_types(&self) -> Vec<TypeHandle> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }
}

/// Declared property
#[derive(Debug)]
pub struct PropertyDef {
    /// Declaring type
    pub declaring_type: TypeId,
    /// Property name
    pub name: String,
    /// Value type
    pub property_type: TypeHandle,
    /// Index parameters; non-empty for indexers
    pub index_parameters: Vec<ParameterDef>,
    /// Getter accessor
    pub getter: Option<Arc<MethodDef>>,
    /// Setter accessor
    pub setter: Option<Arc<MethodDef>>,
}

impl PropertyDef {
    fn accessors(&self) -> impl Iterator<Item = &Arc<MethodDef>> + '_ {
        self.getter.iter().chain(self.setter.iter())
    }

    /// Widest accessibility among the accessors
    pub fn visibility(&self) -> Visibility {
        self.accessors()
            .map(|m| m.visibility)
            .reduce(Visibility::widest)
            .unwrap_or(Visibility::Private)
    }

    /// Whether the accessors are static
    pub fn is_static(&self) -> bool {
        self.accessors().any(|m| m.is_static)
    }

    /// Whether the property takes index parameters
    pub fn is_indexer(&self) -> bool {
        !self.index_parameters.is_empty()
    }

    /// Index parameter types in order
    pub fn index_parameter_types(&self) -> Vec<TypeHandle> {
        self.index_parameters.iter().map(|p| p.ty.clone()).collect()
    }
}

/// Declared event
#[derive(Debug)]
pub struct EventDef {
    /// Declaring type
    pub declaring_type: TypeId,
    /// Event name
    pub name: String,
    /// Delegate type accepted by the accessors
    pub handler_type: TypeHandle,
    /// Subscription accessor
    pub add: Arc<MethodDef>,
    /// Unsubscription accessor
    pub remove: Arc<MethodDef>,
}

impl EventDef {
    /// Accessibility of the add accessor
    pub fn visibility(&self) -> Visibility {
        self.add.visibility.widest(self.remove.visibility)
    }

    /// Whether the accessors are static
    pub fn is_static(&self) -> bool {
        self.add.is_static
    }
}

/// A declared member of any kind
#[derive(Debug, Clone)]
pub enum MemberDef {
    /// Field
    Field(Arc<FieldDef>),
    /// Property
    Property(Arc<PropertyDef>),
    /// Method
    Method(Arc<MethodDef>),
    /// Constructor
    Constructor(Arc<ConstructorDef>),
    /// Event
    Event(Arc<EventDef>),
}

impl MemberDef {
    /// Member kind
    pub fn kind(&self) -> MemberKind {
        match self {
            MemberDef::Field(_) => MemberKind::Field,
            MemberDef::Property(_) => MemberKind::Property,
            MemberDef::Method(_) => MemberKind::Method,
            MemberDef::Constructor(_) => MemberKind::Constructor,
            MemberDef::Event(_) => MemberKind::Event,
        }
    }

    /// Member name; constructors are named `.ctor`
    pub fn name(&self) -> &str {
        match self {
            MemberDef::Field(f) => &f.name,
            MemberDef::Property(p) => &p.name,
            MemberDef::Method(m) => &m.name,
            MemberDef::Constructor(c) => {
                if c.is_static {
                    ".cctor"
                } else {
                    ".ctor"
                }
            }
            MemberDef::Event(e) => &e.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_ordering() {
        assert_eq!(Visibility::Private.widest(Visibility::Public), Visibility::Public);
        assert_eq!(Visibility::Protected.widest(Visibility::Internal), Visibility::Protected);
        assert_eq!(Visibility::ProtectedInternal.keyword(), "protected internal");
        assert!(Visibility::Public.is_public());
        assert!(!Visibility::Internal.is_public());
    }

    #[test]
    fn test_static_slot_round_trip() {
        let storage = Arc::new(StaticStorage::default());
        let index = storage.push(Value::I32(0));
        let slot = StaticSlot::new(storage, index);

        assert_eq!(slot.load(), Value::I32(0));
        slot.store(Value::I32(7));
        assert_eq!(slot.load(), Value::I32(7));
    }

    #[test]
    fn test_accessor_role_owner() {
        assert_eq!(AccessorRole::PropertyGet("Name".to_string()).owner(), "Name");
        assert_eq!(AccessorRole::EventRemove("Changed".to_string()).owner(), "Changed");
    }
}
