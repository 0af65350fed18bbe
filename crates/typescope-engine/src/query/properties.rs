//! Property and indexer queries

use typescope_runtime::{TypeHandle, Visibility};

use super::QueryKind;
use crate::descriptor::{MemberDescriptor, MemberSignature, PropertyDescriptor};

/// Property facade
pub struct PropertyKind;

/// Search options of a property
#[derive(Debug, Clone)]
pub struct PropertyOptions {
    /// Property name
    pub name: String,
    /// Value type
    pub property_type: TypeHandle,
    /// Widest accessor accessibility
    pub visibility: Visibility,
    /// Public property
    pub is_public: bool,
    /// Static property
    pub is_static: bool,
    /// Instance property
    pub is_instance: bool,
    /// Has a getter
    pub can_read: bool,
    /// Has a setter
    pub can_write: bool,
    /// Takes index parameters
    pub is_indexer: bool,
    /// Index parameter types
    pub index_parameter_types: Vec<TypeHandle>,
}

impl QueryKind for PropertyKind {
    type Item = PropertyDescriptor;
    type Options = PropertyOptions;
    const NAME: &'static str = "property";

    fn project(member: &MemberDescriptor) -> Option<PropertyDescriptor> {
        member.as_property().cloned()
    }

    fn options(property: &PropertyDescriptor) -> PropertyOptions {
        PropertyOptions {
            name: property.name().to_string(),
            property_type: property.property_type().clone(),
            visibility: property.visibility(),
            is_public: property.visibility().is_public(),
            is_static: property.is_static(),
            is_instance: !property.is_static(),
            can_read: property.has_getter(),
            can_write: property.has_setter(),
            is_indexer: property.is_indexer(),
            index_parameter_types: property.index_parameter_types(),
        }
    }

    fn name(property: &PropertyDescriptor) -> &str {
        property.name()
    }

    fn signature(property: &PropertyDescriptor) -> MemberSignature {
        MemberDescriptor::Property(property.clone()).signature()
    }
}
