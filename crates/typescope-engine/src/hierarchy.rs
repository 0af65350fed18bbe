//! Hierarchy Walker and Member Deduplicator
//!
//! ## Walk order
//!
//! | Source     | Levels                                                     |
//! |------------|------------------------------------------------------------|
//! | class      | the type, then its parent chain up to the root             |
//! | interface  | the type, then extended interfaces depth-first, each once  |
//!
//! Each level contributes only the members it declares, in declaration order.
//! Constructors are not inherited: only the first level contributes them.
//!
//! ## Deduplication
//!
//! [`distinct`] keeps the first member seen for every
//! [`MemberSignature`](crate::descriptor::MemberSignature), so
//! the most-derived declaration of a shadowed member wins. The query facades
//! apply it only when a predicate or a name filter is supplied.

use rustc_hash::FxHashSet;
use typescope_runtime::{MemberDef, TypeHandle};

use crate::descriptor::{
    ConstructorDescriptor, EventDescriptor, FieldDescriptor, MemberDescriptor, MethodDescriptor,
    PropertyDescriptor,
};

/// The type itself followed by every ancestor, most-derived first
pub fn ancestors(ty: &TypeHandle) -> Vec<TypeHandle> {
    let mut levels = vec![ty.clone()];
    if ty.is_interface() {
        levels.extend(ty.all_interfaces());
    } else {
        let mut current = ty.parent().cloned();
        while let Some(parent) = current {
            current = parent.parent().cloned();
            levels.push(parent);
        }
    }
    levels
}

/// Members declared directly on `ty`, in declaration order
pub fn declared_members(ty: &TypeHandle) -> impl Iterator<Item = MemberDescriptor> + '_ {
    ty.declared_members().iter().map(move |member| match member {
        MemberDef::Field(f) => FieldDescriptor::new(ty.clone(), f.clone()).into(),
        MemberDef::Property(p) => PropertyDescriptor::new(ty.clone(), p.clone()).into(),
        MemberDef::Method(m) => MethodDescriptor::new(ty.clone(), m.clone()).into(),
        MemberDef::Constructor(c) => ConstructorDescriptor::new(ty.clone(), c.clone()).into(),
        MemberDef::Event(e) => EventDescriptor::new(ty.clone(), e.clone()).into(),
    })
}

/// Every member visible from `ty`, most-derived level first
///
/// Shadowed members appear once per declaring level.
pub fn walk(ty: &TypeHandle) -> Vec<MemberDescriptor> {
    let levels = ancestors(ty);
    let mut members = Vec::new();
    for (depth, level) in levels.iter().enumerate() {
        let before = members.len();
        members.extend(
            declared_members(level)
                .filter(|m| depth == 0 || !matches!(m, MemberDescriptor::Constructor(_))),
        );
        tracing::trace!(
            level = %level.full_name(),
            depth,
            declared = members.len() - before,
            "walked hierarchy level"
        );
    }
    tracing::debug!(
        type_name = %ty.full_name(),
        levels = levels.len(),
        members = members.len(),
        "collected hierarchy members"
    );
    members
}

/// Keep the first member per signature
pub fn distinct<I>(members: I) -> Vec<MemberDescriptor>
where
    I: IntoIterator<Item = MemberDescriptor>,
{
    let mut seen = FxHashSet::default();
    members
        .into_iter()
        .filter(|m| seen.insert(m.signature()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use typescope_runtime::{
        types, ClassBuilder, ConstructorDefinition, MethodDefinition, PropertyDefinition, Value,
    };

    fn hierarchy() -> (TypeHandle, TypeHandle) {
        let mut base = ClassBuilder::class("Animal");
        base.add_property(PropertyDefinition::new("Name", types::string()).auto())
            .unwrap();
        base.add_method(
            MethodDefinition::new("Speak")
                .returns(types::string())
                .as_virtual()
                .native(|_| Ok(Value::string("..."))),
        )
        .unwrap();
        base.add_constructor(ConstructorDefinition::new()).unwrap();
        let base = base.build().unwrap();

        let mut derived = ClassBuilder::class("Dog");
        derived.set_parent(base.clone()).unwrap();
        derived
            .add_method(
                MethodDefinition::new("Speak")
                    .returns(types::string())
                    .as_virtual()
                    .native(|_| Ok(Value::string("woof"))),
            )
            .unwrap();
        (base, derived.build().unwrap())
    }

    #[test]
    fn test_class_ancestors() {
        let (base, derived) = hierarchy();
        let levels = ancestors(&derived);
        assert_eq!(levels.len(), 2);
        assert!(levels[0].ptr_eq(&derived));
        assert!(levels[1].ptr_eq(&base));
    }

    #[test]
    fn test_interface_ancestors_visit_once() {
        let root = ClassBuilder::interface("IRoot").build().unwrap();
        let mut left = ClassBuilder::interface("ILeft");
        left.add_interface(root.clone()).unwrap();
        let left = left.build().unwrap();
        let mut right = ClassBuilder::interface("IRight");
        right.add_interface(root.clone()).unwrap();
        let right = right.build().unwrap();
        let mut leaf = ClassBuilder::interface("ILeaf");
        leaf.add_interface(left.clone()).unwrap();
        leaf.add_interface(right.clone()).unwrap();
        let leaf = leaf.build().unwrap();

        let names: Vec<String> = ancestors(&leaf).iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["ILeaf", "ILeft", "IRoot", "IRight"]);
    }

    #[test]
    fn test_walk_keeps_shadowed_members() {
        let (_, derived) = hierarchy();
        let members = walk(&derived);
        let speaks = members.iter().filter(|m| m.name() == "Speak").count();
        assert_eq!(speaks, 2);
        assert!(members[0].declaring_type().ptr_eq(&derived));
    }

    #[test]
    fn test_walk_skips_inherited_constructors() {
        let (_, derived) = hierarchy();
        assert!(!walk(&derived)
            .iter()
            .any(|m| matches!(m, MemberDescriptor::Constructor(_))));
    }

    #[test]
    fn test_distinct_prefers_most_derived() {
        let (_, derived) = hierarchy();
        let members = distinct(walk(&derived));
        let speak: Vec<_> = members.iter().filter(|m| m.name() == "Speak").collect();
        assert_eq!(speak.len(), 1);
        assert!(speak[0].declaring_type().ptr_eq(&derived));
    }
}
