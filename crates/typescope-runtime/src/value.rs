//! Runtime Values
//!
//! [`Value`] is the dynamically typed value passed to and returned from
//! fields, accessors, methods and constructors. Objects are shared by
//! reference ([`ObjectRef`]); their instance slots live behind a mutex so an
//! object can be read and written through `&ObjectRef`.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::{PrimitiveType, TypeHandle, TypeKind};
use crate::{RuntimeError, RuntimeResult};

/// Dynamically typed runtime value
#[derive(Clone, Default)]
pub enum Value {
    /// Null reference (also the result of `void` calls)
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// Double
    F64(f64),
    /// String
    Str(Arc<str>),
    /// Object instance
    Object(ObjectRef),
    /// Delegate instance
    Delegate(Delegate),
}

impl Value {
    /// The null value
    pub fn null() -> Self {
        Value::Null
    }

    /// Boolean value
    pub fn bool(value: bool) -> Self {
        Value::Bool(value)
    }

    /// 32-bit integer value
    pub fn i32(value: i32) -> Self {
        Value::I32(value)
    }

    /// 64-bit integer value
    pub fn i64(value: i64) -> Self {
        Value::I64(value)
    }

    /// Double value
    pub fn f64(value: f64) -> Self {
        Value::F64(value)
    }

    /// String value
    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Value::Str(value.into())
    }

    /// Whether this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// 32-bit integer payload
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// 64-bit integer payload
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Double payload
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Object payload
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Delegate payload
    pub fn as_delegate(&self) -> Option<&Delegate> {
        match self {
            Value::Delegate(d) => Some(d),
            _ => None,
        }
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::I32(_) => "int".to_string(),
            Value::I64(_) => "long".to_string(),
            Value::F64(_) => "double".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Object(o) => o.ty().full_name(),
            Value::Delegate(_) => "delegate".to_string(),
        }
    }

    /// Whether this value can be stored where `ty` is expected
    pub fn is_assignable_to(&self, ty: &TypeHandle) -> bool {
        match ty.kind() {
            TypeKind::GenericParameter => true,
            TypeKind::Primitive(PrimitiveType::Object) => true,
            TypeKind::Primitive(PrimitiveType::Void) => self.is_null(),
            TypeKind::Primitive(PrimitiveType::Bool) => matches!(self, Value::Bool(_)),
            TypeKind::Primitive(PrimitiveType::Int32) => matches!(self, Value::I32(_)),
            TypeKind::Primitive(PrimitiveType::Int64) => {
                matches!(self, Value::I64(_) | Value::I32(_))
            }
            TypeKind::Primitive(PrimitiveType::Float64) => matches!(self, Value::F64(_)),
            TypeKind::Primitive(PrimitiveType::String) => {
                matches!(self, Value::Str(_) | Value::Null)
            }
            TypeKind::Delegate => matches!(self, Value::Delegate(_) | Value::Null),
            TypeKind::Class | TypeKind::Interface => match self {
                Value::Null => true,
                Value::Object(o) => o.ty().is_subtype_of(ty),
                _ => false,
            },
        }
    }

    /// Fail with a type mismatch unless assignable to `ty`
    pub fn check_assignable(&self, ty: &TypeHandle) -> RuntimeResult<()> {
        if self.is_assignable_to(ty) {
            Ok(())
        } else {
            Err(RuntimeError::TypeMismatch {
                expected: ty.full_name(),
                actual: self.describe(),
            })
        }
    }

    /// Widen an `int` to `long` when the target expects it
    pub(crate) fn coerce_to(self, ty: &TypeHandle) -> Value {
        match (self, ty.primitive()) {
            (Value::I32(v), Some(PrimitiveType::Int64)) => Value::I64(v as i64),
            (value, _) => value,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Delegate(a), Value::Delegate(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(v) => write!(f, "{}i32", v),
            Value::I64(v) => write!(f, "{}i64", v),
            Value::F64(v) => write!(f, "{}f64", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(o) => write!(f, "{:?}", o),
            Value::Delegate(d) => write!(f, "{:?}", d),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<Delegate> for Value {
    fn from(value: Delegate) -> Self {
        Value::Delegate(value)
    }
}

// ============================================================================
// Objects
// ============================================================================

struct ObjectData {
    ty: TypeHandle,
    slots: Mutex<Vec<Value>>,
}

/// Shared reference to an object instance
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectData>);

impl ObjectRef {
    /// Allocate an instance with every slot at its default value
    pub(crate) fn allocate(ty: &TypeHandle) -> Self {
        let slots = ty.instance_slots().iter().map(|t| t.default_value()).collect();
        Self(Arc::new(ObjectData {
            ty: ty.clone(),
            slots: Mutex::new(slots),
        }))
    }

    /// Runtime type of the instance
    pub fn ty(&self) -> &TypeHandle {
        &self.0.ty
    }

    /// Read an instance slot
    pub fn load_slot(&self, index: usize) -> RuntimeResult<Value> {
        self.0.slots.lock().get(index).cloned().ok_or_else(|| {
            RuntimeError::InvalidBody(format!(
                "slot {} out of bounds for '{}'",
                index,
                self.0.ty.full_name()
            ))
        })
    }

    /// Write an instance slot
    pub fn store_slot(&self, index: usize, value: Value) -> RuntimeResult<()> {
        let mut slots = self.0.slots.lock();
        match slots.get_mut(index) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(RuntimeError::InvalidBody(format!(
                "slot {} out of bounds for '{}'",
                index,
                self.0.ty.full_name()
            ))),
        }
    }

    /// Reference identity
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address-based identity key
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.0.ty.full_name(), self.identity())
    }
}

// ============================================================================
// Delegates
// ============================================================================

/// Signature of a delegate's target
pub type DelegateFn = dyn Fn(&[Value]) -> RuntimeResult<Value> + Send + Sync;

/// Callable reference handed to events and delegate-typed members
#[derive(Clone)]
pub struct Delegate(Arc<DelegateFn>);

impl Delegate {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Call the target
    pub fn invoke(&self, args: &[Value]) -> RuntimeResult<Value> {
        (self.0)(args)
    }

    /// Reference identity
    pub fn ptr_eq(&self, other: &Delegate) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delegate@{:p}", Arc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types;

    #[test]
    fn test_value_assignability() {
        assert!(Value::i32(1).is_assignable_to(&types::int32()));
        assert!(Value::i32(1).is_assignable_to(&types::int64()));
        assert!(!Value::i64(1).is_assignable_to(&types::int32()));
        assert!(Value::null().is_assignable_to(&types::string()));
        assert!(!Value::null().is_assignable_to(&types::int32()));
        assert!(Value::string("x").is_assignable_to(&types::object()));
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::string("a"), Value::from("a"));
        assert_ne!(Value::i32(1), Value::i64(1));

        let d = Delegate::new(|_| Ok(Value::Null));
        assert_eq!(Value::Delegate(d.clone()), Value::Delegate(d));
        let other = Delegate::new(|_| Ok(Value::Null));
        assert_ne!(Value::Delegate(other), Value::Null);
    }

    #[test]
    fn test_delegate_invoke() {
        let double = Delegate::new(|args| {
            let v = args.first().and_then(Value::as_i32).unwrap_or_default();
            Ok(Value::i32(v * 2))
        });
        assert_eq!(double.invoke(&[Value::i32(21)]).unwrap(), Value::i32(42));
    }

    #[test]
    fn test_check_assignable_error() {
        let err = Value::string("x").check_assignable(&types::int32()).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::TypeMismatch {
                expected: "int".to_string(),
                actual: "string".to_string(),
            }
        );
    }
}
