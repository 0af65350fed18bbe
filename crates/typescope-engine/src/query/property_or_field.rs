//! Property-or-field queries

use typescope_runtime::{TypeHandle, Visibility};

use super::{CaseInsensitiveNames, QueryKind};
use crate::accessor::PropertyOrField;
use crate::descriptor::{MemberDescriptor, MemberSignature};

/// Property-or-field facade
pub struct PropertyOrFieldKind;

/// Search options of a property or field
#[derive(Debug, Clone)]
pub struct PropertyOrFieldOptions {
    /// Member name
    pub name: String,
    /// Type of the stored value
    pub value_type: TypeHandle,
    /// Accessibility
    pub visibility: Visibility,
    /// Wraps a field
    pub is_field: bool,
    /// Wraps a property
    pub is_property: bool,
    /// Readable
    pub can_read: bool,
    /// Writable
    pub can_write: bool,
    /// Public member
    pub is_public: bool,
    /// Static member
    pub is_static: bool,
    /// Instance member
    pub is_instance: bool,
    /// Wraps an indexer
    pub is_indexer: bool,
}

impl QueryKind for PropertyOrFieldKind {
    type Item = PropertyOrField;
    type Options = PropertyOrFieldOptions;
    const NAME: &'static str = "property or field";

    fn project(member: &MemberDescriptor) -> Option<PropertyOrField> {
        match member {
            MemberDescriptor::Property(p) => Some(PropertyOrField::Property(p.clone())),
            MemberDescriptor::Field(f) => Some(PropertyOrField::Field(f.clone())),
            _ => None,
        }
    }

    fn options(member: &PropertyOrField) -> PropertyOrFieldOptions {
        PropertyOrFieldOptions {
            name: member.name().to_string(),
            value_type: member.value_type().clone(),
            visibility: member.visibility(),
            is_field: member.try_as_field().is_some(),
            is_property: member.try_as_property().is_some(),
            can_read: member.can_read(),
            can_write: member.can_write(),
            is_public: member.visibility().is_public(),
            is_static: member.is_static(),
            is_instance: !member.is_static(),
            is_indexer: member.is_indexer(),
        }
    }

    fn name(member: &PropertyOrField) -> &str {
        member.name()
    }

    fn signature(member: &PropertyOrField) -> MemberSignature {
        member.descriptor().signature()
    }
}

impl CaseInsensitiveNames for PropertyOrFieldKind {}
