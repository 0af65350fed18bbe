//! Runtime Type Definitions
//!
//! Every type known to the runtime is a [`TypeDef`] shared behind a
//! [`TypeHandle`]. Handles compare and hash by [`TypeId`], which comes from a
//! process-wide counter, so types built on different threads never collide.
//!
//! Primitive types are lazily created singletons:
//!
//! | Function          | Primitive | Default value |
//! |-------------------|-----------|---------------|
//! | `types::void()`    | `void`    | `null`        |
//! | `types::boolean()` | `bool`    | `false`       |
//! | `types::int32()`   | `int`     | `0`           |
//! | `types::int64()`   | `long`    | `0`           |
//! | `types::float64()` | `double`  | `0.0`         |
//! | `types::string()`  | `string`  | `null`        |
//! | `types::object()`  | `object`  | `null`        |

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use crate::dynamic_module::ModuleOrigin;
use crate::members::{ConstructorDef, EventDef, FieldDef, MemberDef, MethodDef, PropertyDef};
use crate::value::Value;

/// Global counter for type IDs
static NEXT_TYPE_ID: AtomicUsize = AtomicUsize::new(1);

/// Generate a unique type ID
pub(crate) fn generate_type_id() -> TypeId {
    TypeId(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Unique identifier for a runtime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    /// Raw numeric identity
    pub fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Primitive types of the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// No value (method return only)
    Void,
    /// Boolean
    Bool,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// IEEE 754 double precision
    Float64,
    /// Immutable string
    String,
    /// Root of every reference type
    Object,
}

impl PrimitiveType {
    /// Keyword used when printing the type
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int32 => "int",
            PrimitiveType::Int64 => "long",
            PrimitiveType::Float64 => "double",
            PrimitiveType::String => "string",
            PrimitiveType::Object => "object",
        }
    }

    /// Zero value for storage of this type
    pub fn default_value(&self) -> Value {
        match self {
            PrimitiveType::Bool => Value::Bool(false),
            PrimitiveType::Int32 => Value::I32(0),
            PrimitiveType::Int64 => Value::I64(0),
            PrimitiveType::Float64 => Value::F64(0.0),
            PrimitiveType::Void | PrimitiveType::String | PrimitiveType::Object => Value::Null,
        }
    }

    /// Whether `null` is a legal value
    pub fn is_reference(&self) -> bool {
        matches!(self, PrimitiveType::String | PrimitiveType::Object)
    }
}

/// Kind of a runtime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Built-in primitive
    Primitive(PrimitiveType),
    /// Class (nominal, single inheritance)
    Class,
    /// Interface (no state, no constructors)
    Interface,
    /// Delegate (callable reference)
    Delegate,
    /// Placeholder for a generic method or type parameter
    GenericParameter,
}

/// Type-level modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFlags {
    /// Cannot be instantiated directly
    pub is_abstract: bool,
    /// Cannot be extended
    pub is_sealed: bool,
    /// Only static members, never instantiated or extended
    pub is_static: bool,
}

/// Definition of a runtime type
#[derive(Debug)]
pub struct TypeDef {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) kind: TypeKind,
    pub(crate) flags: TypeFlags,
    pub(crate) parent: Option<TypeHandle>,
    pub(crate) interfaces: Vec<TypeHandle>,
    pub(crate) generic_arguments: Vec<TypeHandle>,
    /// Declared members in declaration order
    pub(crate) members: Vec<MemberDef>,
    /// Types of every instance slot, inherited slots first
    pub(crate) instance_slots: Vec<TypeHandle>,
    pub(crate) origin: Option<ModuleOrigin>,
}

impl TypeDef {
    /// Bare definition with no members
    pub(crate) fn bare(id: TypeId, name: String, kind: TypeKind, flags: TypeFlags) -> Self {
        Self {
            id,
            name,
            namespace: None,
            kind,
            flags,
            parent: None,
            interfaces: Vec::new(),
            generic_arguments: Vec::new(),
            members: Vec::new(),
            instance_slots: Vec::new(),
            origin: None,
        }
    }
}

/// Shared handle to a runtime type
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeDef>);

impl TypeHandle {
    pub(crate) fn from_def(def: TypeDef) -> Self {
        Self(Arc::new(def))
    }

    fn new_primitive(primitive: PrimitiveType) -> Self {
        let flags = TypeFlags {
            is_sealed: primitive != PrimitiveType::Object,
            ..TypeFlags::default()
        };
        Self::from_def(TypeDef::bare(
            generate_type_id(),
            primitive.type_name().to_string(),
            TypeKind::Primitive(primitive),
            flags,
        ))
    }

    /// Type identity
    pub fn id(&self) -> TypeId {
        self.0.id
    }

    /// Simple name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.0.namespace.as_deref()
    }

    /// Namespace-qualified name
    pub fn full_name(&self) -> String {
        match &self.0.namespace {
            Some(ns) => format!("{}.{}", ns, self.0.name),
            None => self.0.name.clone(),
        }
    }

    /// Type kind
    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    /// Type modifiers
    pub fn flags(&self) -> TypeFlags {
        self.0.flags
    }

    /// Whether this is a class
    pub fn is_class(&self) -> bool {
        self.0.kind == TypeKind::Class
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.0.kind == TypeKind::Interface
    }

    /// Whether this is a primitive
    pub fn is_primitive(&self) -> bool {
        matches!(self.0.kind, TypeKind::Primitive(_))
    }

    /// Primitive kind, if this is a primitive
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self.0.kind {
            TypeKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Whether this is `void`
    pub fn is_void(&self) -> bool {
        self.primitive() == Some(PrimitiveType::Void)
    }

    /// Abstract classes and interfaces
    pub fn is_abstract(&self) -> bool {
        self.0.flags.is_abstract || self.is_interface()
    }

    /// Whether the type cannot be extended
    pub fn is_sealed(&self) -> bool {
        self.0.flags.is_sealed
    }

    /// Whether the type is static
    pub fn is_static(&self) -> bool {
        self.0.flags.is_static
    }

    /// Whether values of this type may be `null`
    pub fn is_reference(&self) -> bool {
        match self.0.kind {
            TypeKind::Primitive(p) => p.is_reference(),
            _ => true,
        }
    }

    /// Parent class
    pub fn parent(&self) -> Option<&TypeHandle> {
        self.0.parent.as_ref()
    }

    /// Directly implemented (class) or extended (interface) interfaces
    pub fn interfaces(&self) -> &[TypeHandle] {
        &self.0.interfaces
    }

    /// Generic arguments of a constructed generic type
    pub fn generic_arguments(&self) -> &[TypeHandle] {
        &self.0.generic_arguments
    }

    /// Whether the type carries generic arguments
    pub fn is_generic(&self) -> bool {
        !self.0.generic_arguments.is_empty()
    }

    /// Module the type was emitted into, for dynamically built types
    pub fn origin(&self) -> Option<&ModuleOrigin> {
        self.0.origin.as_ref()
    }

    /// Declared members in declaration order
    pub fn declared_members(&self) -> &[MemberDef] {
        &self.0.members
    }

    /// Declared fields
    pub fn declared_fields(&self) -> impl Iterator<Item = &Arc<FieldDef>> + '_ {
        self.0.members.iter().filter_map(|m| match m {
            MemberDef::Field(f) => Some(f),
            _ => None,
        })
    }

    /// Declared properties
    pub fn declared_properties(&self) -> impl Iterator<Item = &Arc<PropertyDef>> + '_ {
        self.0.members.iter().filter_map(|m| match m {
            MemberDef::Property(p) => Some(p),
            _ => None,
        })
    }

    /// Declared methods, accessors included
    pub fn declared_methods(&self) -> impl Iterator<Item = &Arc<MethodDef>> + '_ {
        self.0.members.iter().filter_map(|m| match m {
            MemberDef::Method(m) => Some(m),
            _ => None,
        })
    }

    /// Declared constructors
    pub fn declared_constructors(&self) -> impl Iterator<Item = &Arc<ConstructorDef>> + '_ {
        self.0.members.iter().filter_map(|m| match m {
            MemberDef::Constructor(c) => Some(c),
            _ => None,
        })
    }

    /// Declared events
    pub fn declared_events(&self) -> impl Iterator<Item = &Arc<EventDef>> + '_ {
        self.0.members.iter().filter_map(|m| match m {
            MemberDef::Event(e) => Some(e),
            _ => None,
        })
    }

    /// Number of instance slots, inherited slots included
    pub fn instance_slot_count(&self) -> usize {
        self.0.instance_slots.len()
    }

    /// Types of every instance slot, inherited slots first
    pub(crate) fn instance_slots(&self) -> &[TypeHandle] {
        &self.0.instance_slots
    }

    /// Zero value for storage of this type
    pub fn default_value(&self) -> Value {
        match self.0.kind {
            TypeKind::Primitive(p) => p.default_value(),
            _ => Value::Null,
        }
    }

    /// Every interface reachable from this type, nearest first, each once
    pub fn all_interfaces(&self) -> Vec<TypeHandle> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            collect_interfaces(&ty, &mut seen, &mut result);
            current = ty.parent().cloned();
        }
        result
    }

    /// Whether a value of this type can be stored where `target` is expected
    pub fn is_subtype_of(&self, target: &TypeHandle) -> bool {
        if self == target {
            return true;
        }
        if target.primitive() == Some(PrimitiveType::Object) {
            return self.is_reference() && !self.is_void();
        }
        if target.is_interface() {
            return self.all_interfaces().iter().any(|i| i == target);
        }
        let mut current = self.parent();
        while let Some(ty) = current {
            if ty == target {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Whether this type is `target` or derives from it, by identity
    pub fn derives_from_id(&self, target: TypeId) -> bool {
        if self.id() == target {
            return true;
        }
        if self.all_interfaces().iter().any(|i| i.id() == target) {
            return true;
        }
        let mut current = self.parent();
        while let Some(ty) = current {
            if ty.id() == target {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Pointer identity of two handles
    pub fn ptr_eq(&self, other: &TypeHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

fn collect_interfaces(ty: &TypeHandle, seen: &mut FxHashSet<TypeId>, out: &mut Vec<TypeHandle>) {
    for interface in ty.interfaces() {
        if seen.insert(interface.id()) {
            out.push(interface.clone());
            collect_interfaces(interface, seen, out);
        }
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({}#{})", self.full_name(), self.0.id.0)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

// ============================================================================
// Built-in Types
// ============================================================================

static VOID: Lazy<TypeHandle> = Lazy::new(|| TypeHandle::new_primitive(PrimitiveType::Void));
static BOOL: Lazy<TypeHandle> = Lazy::new(|| TypeHandle::new_primitive(PrimitiveType::Bool));
static INT32: Lazy<TypeHandle> = Lazy::new(|| TypeHandle::new_primitive(PrimitiveType::Int32));
static INT64: Lazy<TypeHandle> = Lazy::new(|| TypeHandle::new_primitive(PrimitiveType::Int64));
static FLOAT64: Lazy<TypeHandle> = Lazy::new(|| TypeHandle::new_primitive(PrimitiveType::Float64));
static STRING: Lazy<TypeHandle> = Lazy::new(|| TypeHandle::new_primitive(PrimitiveType::String));
static OBJECT: Lazy<TypeHandle> = Lazy::new(|| TypeHandle::new_primitive(PrimitiveType::Object));
static EVENT_HANDLER: Lazy<TypeHandle> = Lazy::new(|| delegate("EventHandler"));

/// The `void` type
pub fn void() -> TypeHandle {
    VOID.clone()
}

/// The `bool` type
pub fn boolean() -> TypeHandle {
    BOOL.clone()
}

/// The `int` type
pub fn int32() -> TypeHandle {
    INT32.clone()
}

/// The `long` type
pub fn int64() -> TypeHandle {
    INT64.clone()
}

/// The `double` type
pub fn float64() -> TypeHandle {
    FLOAT64.clone()
}

/// The `string` type
pub fn string() -> TypeHandle {
    STRING.clone()
}

/// The `object` type
pub fn object() -> TypeHandle {
    OBJECT.clone()
}

/// Handler type used by events that do not declare their own
pub fn event_handler() -> TypeHandle {
    EVENT_HANDLER.clone()
}

/// Create a fresh delegate type
pub fn delegate(name: &str) -> TypeHandle {
    let flags = TypeFlags {
        is_sealed: true,
        ..TypeFlags::default()
    };
    TypeHandle::from_def(TypeDef::bare(
        generate_type_id(),
        name.to_string(),
        TypeKind::Delegate,
        flags,
    ))
}

/// Create a generic parameter placeholder such as `T`
pub fn generic_parameter(name: &str) -> TypeHandle {
    TypeHandle::from_def(TypeDef::bare(
        generate_type_id(),
        name.to_string(),
        TypeKind::GenericParameter,
        TypeFlags::default(),
    ))
}
