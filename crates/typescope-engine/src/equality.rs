//! Memberwise value equality and hashing
//!
//! Two objects are memberwise equal when they have the same runtime type and
//! every public, readable, non-indexed instance field or property holds
//! memberwise equal values on both. Non-object values use [`Value`] equality.
//! Object graphs may be cyclic: a pair already under comparison counts as
//! equal, and an object already being hashed contributes only its type.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashSet, FxHasher};
use typescope_runtime::{ObjectRef, TypeHandle, Value};

use crate::accessor::PropertyOrField;
use crate::query::MemberQueries;

fn compared_members(ty: &TypeHandle) -> Vec<PropertyOrField> {
    ty.properties_or_fields()
        .all_where(|o| o.is_public && o.is_instance && o.can_read && !o.is_indexer)
}

/// Compare two values member by member
pub fn memberwise_equals(left: &Value, right: &Value) -> bool {
    let mut active = FxHashSet::default();
    equals(left, right, &mut active)
}

fn equals(left: &Value, right: &Value, active: &mut FxHashSet<(usize, usize)>) -> bool {
    match (left, right) {
        (Value::Object(a), Value::Object(b)) => objects_equal(a, b, active),
        _ => left == right,
    }
}

fn objects_equal(a: &ObjectRef, b: &ObjectRef, active: &mut FxHashSet<(usize, usize)>) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    if a.ty().id() != b.ty().id() {
        return false;
    }
    let pair = (a.identity(), b.identity());
    if !active.insert(pair) {
        return true;
    }

    let receiver_a = Value::Object(a.clone());
    let receiver_b = Value::Object(b.clone());
    let mut result = true;
    for member in compared_members(a.ty()) {
        let same = match (member.get_value(&receiver_a), member.get_value(&receiver_b)) {
            (Ok(x), Ok(y)) => equals(&x, &y, active),
            (Err(e), _) | (_, Err(e)) => {
                tracing::debug!(member = member.name(), error = %e, "memberwise read failed");
                false
            }
        };
        if !same {
            result = false;
            break;
        }
    }

    active.remove(&pair);
    result
}

/// Hash a value consistently with [`memberwise_equals`]
pub fn memberwise_hash(value: &Value) -> u64 {
    let mut hasher = FxHasher::default();
    let mut active = FxHashSet::default();
    hash_value(value, &mut hasher, &mut active);
    hasher.finish()
}

fn hash_value(value: &Value, state: &mut FxHasher, active: &mut FxHashSet<usize>) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(v) => (1u8, v).hash(state),
        Value::I32(v) => (2u8, v).hash(state),
        Value::I64(v) => (3u8, v).hash(state),
        Value::F64(v) => {
            // 0.0 == -0.0
            let bits = if *v == 0.0 { 0 } else { v.to_bits() };
            (4u8, bits).hash(state)
        }
        Value::Str(s) => (5u8, s.as_ref()).hash(state),
        Value::Delegate(_) => 6u8.hash(state),
        Value::Object(object) => {
            7u8.hash(state);
            object.ty().id().hash(state);
            if !active.insert(object.identity()) {
                return;
            }
            let receiver = Value::Object(object.clone());
            for member in compared_members(object.ty()) {
                if let Ok(inner) = member.get_value(&receiver) {
                    hash_value(&inner, state, active);
                }
            }
            active.remove(&object.identity());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typescope_runtime::{
        interpreter, types, ClassBuilder, FieldDefinition, PropertyDefinition, Visibility,
    };

    fn point() -> TypeHandle {
        let mut builder = ClassBuilder::class("Point");
        builder
            .add_property(PropertyDefinition::new("X", types::int32()).auto())
            .unwrap();
        builder
            .add_field(FieldDefinition::new("y", types::int32()))
            .unwrap();
        builder
            .add_field(FieldDefinition::new("tag", types::string()).with_visibility(Visibility::Private))
            .unwrap();
        builder.build().unwrap()
    }

    fn make(ty: &TypeHandle, x: i32, y: i32, tag: &str) -> Value {
        let object = interpreter::construct(ty, &[]).unwrap();
        let value = Value::Object(object);
        let x_prop = ty.properties_or_fields().named("X").unwrap();
        x_prop.set_value(&value, Value::i32(x)).unwrap();
        let y_field = ty.properties_or_fields().named("y").unwrap();
        y_field.set_value(&value, Value::i32(y)).unwrap();
        let tag_field = ty.properties_or_fields().named("tag").unwrap();
        tag_field.set_value(&value, Value::string(tag)).unwrap();
        value
    }

    #[test]
    fn test_equal_members() {
        let ty = point();
        let a = make(&ty, 1, 2, "a");
        let b = make(&ty, 1, 2, "b");
        assert!(memberwise_equals(&a, &b));
        assert_eq!(memberwise_hash(&a), memberwise_hash(&b));
    }

    #[test]
    fn test_different_members() {
        let ty = point();
        assert!(!memberwise_equals(&make(&ty, 1, 2, ""), &make(&ty, 1, 3, "")));
        assert!(!memberwise_equals(&make(&ty, 1, 2, ""), &Value::Null));
    }

    #[test]
    fn test_different_types() {
        let a = make(&point(), 1, 2, "");
        let b = make(&point(), 1, 2, "");
        assert!(!memberwise_equals(&a, &b));
    }

    #[test]
    fn test_cycles_terminate() {
        let mut builder = ClassBuilder::class("Node");
        let next = builder
            .add_field(FieldDefinition::new("next", types::object()))
            .unwrap();
        let node = builder.build().unwrap();

        let a = interpreter::construct(&node, &[]).unwrap();
        let b = interpreter::construct(&node, &[]).unwrap();
        let slot = match next {
            typescope_runtime::FieldLocation::Instance(slot) => slot,
            typescope_runtime::FieldLocation::Static(_) => unreachable!(),
        };
        a.store_slot(slot, Value::Object(a.clone())).unwrap();
        b.store_slot(slot, Value::Object(b.clone())).unwrap();

        let a = Value::Object(a);
        let b = Value::Object(b);
        assert!(memberwise_equals(&a, &b));
        assert_eq!(memberwise_hash(&a), memberwise_hash(&b));
    }
}
