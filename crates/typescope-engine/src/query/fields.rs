//! Field queries

use typescope_runtime::{TypeHandle, Visibility};

use super::QueryKind;
use crate::descriptor::{FieldDescriptor, MemberDescriptor, MemberSignature};

/// Field facade
pub struct FieldKind;

/// Search options of a field
#[derive(Debug, Clone)]
pub struct FieldOptions {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: TypeHandle,
    /// Accessibility
    pub visibility: Visibility,
    /// Public field
    pub is_public: bool,
    /// Static field
    pub is_static: bool,
    /// Instance field
    pub is_instance: bool,
    /// Assignable only during construction
    pub is_readonly: bool,
    /// Runtime storage behind an auto-implemented property
    pub is_auto_property_storage: bool,
}

impl QueryKind for FieldKind {
    type Item = FieldDescriptor;
    type Options = FieldOptions;
    const NAME: &'static str = "field";

    fn project(member: &MemberDescriptor) -> Option<FieldDescriptor> {
        member.as_field().cloned()
    }

    fn options(field: &FieldDescriptor) -> FieldOptions {
        FieldOptions {
            name: field.name().to_string(),
            field_type: field.field_type().clone(),
            visibility: field.visibility(),
            is_public: field.visibility().is_public(),
            is_static: field.is_static(),
            is_instance: !field.is_static(),
            is_readonly: field.is_readonly(),
            is_auto_property_storage: field.is_auto_property_storage(),
        }
    }

    fn name(field: &FieldDescriptor) -> &str {
        field.name()
    }

    fn signature(field: &FieldDescriptor) -> MemberSignature {
        MemberDescriptor::Field(field.clone()).signature()
    }
}
