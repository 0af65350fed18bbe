//! Queries over members of every kind

use typescope_runtime::{MemberKind, TypeHandle, Visibility};

use super::{QueryKind, SignatureOptions};
use crate::descriptor::{MemberDescriptor, MemberSignature};

/// All-members facade
pub struct AnyMemberKind;

/// Search options of a member of any kind
#[derive(Debug, Clone)]
pub struct MemberOptions {
    /// Member name
    pub name: String,
    /// Member kind
    pub kind: MemberKind,
    /// Accessibility
    pub visibility: Visibility,
    /// Public member
    pub is_public: bool,
    /// Static member
    pub is_static: bool,
    /// Instance member
    pub is_instance: bool,
    /// Property or indexer
    pub is_property: bool,
    /// Field
    pub is_field: bool,
    /// Method or accessor
    pub is_method: bool,
    /// Constructor or type initializer
    pub is_constructor: bool,
    /// Event
    pub is_event: bool,
    parameter_types: Vec<TypeHandle>,
    generic_arity: usize,
}

impl SignatureOptions for MemberOptions {
    fn parameter_list(&self) -> &[TypeHandle] {
        &self.parameter_types
    }

    fn generic_count(&self) -> usize {
        self.generic_arity
    }
}

/// Kind of a member, tested property first, then field, method,
/// constructor and event
fn classify(member: &MemberDescriptor) -> MemberKind {
    if member.as_property().is_some() {
        MemberKind::Property
    } else if member.as_field().is_some() {
        MemberKind::Field
    } else if member.as_method().is_some() {
        MemberKind::Method
    } else if member.as_constructor().is_some() {
        MemberKind::Constructor
    } else {
        MemberKind::Event
    }
}

impl QueryKind for AnyMemberKind {
    type Item = MemberDescriptor;
    type Options = MemberOptions;
    const NAME: &'static str = "member";

    fn project(member: &MemberDescriptor) -> Option<MemberDescriptor> {
        Some(member.clone())
    }

    fn options(member: &MemberDescriptor) -> MemberOptions {
        let kind = classify(member);
        MemberOptions {
            name: member.name().to_string(),
            kind,
            visibility: member.visibility(),
            is_public: member.visibility().is_public(),
            is_static: member.is_static(),
            is_instance: !member.is_static(),
            is_property: kind == MemberKind::Property,
            is_field: kind == MemberKind::Field,
            is_method: kind == MemberKind::Method,
            is_constructor: kind == MemberKind::Constructor,
            is_event: kind == MemberKind::Event,
            parameter_types: member.parameter_types(),
            generic_arity: member.generic_arity(),
        }
    }

    fn name(member: &MemberDescriptor) -> &str {
        member.name()
    }

    fn signature(member: &MemberDescriptor) -> MemberSignature {
        member.signature()
    }
}
