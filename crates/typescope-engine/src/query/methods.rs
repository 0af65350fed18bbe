//! Method and constructor queries
//!
//! Both option views capture the parameter list at projection time, so the
//! signature predicates of [`SignatureOptions`] never touch the runtime again.

use typescope_runtime::{TypeHandle, Visibility};

use super::QueryKind;
use crate::descriptor::{ConstructorDescriptor, MemberDescriptor, MemberSignature, MethodDescriptor};

/// Signature predicates shared by methods and constructors
pub trait SignatureOptions {
    /// Captured parameter types, in order
    fn parameter_list(&self) -> &[TypeHandle];

    /// Captured generic arity
    fn generic_count(&self) -> usize;

    /// Parameter types equal `types` position by position; empty means none
    fn has_parameters(&self, types: &[TypeHandle]) -> bool {
        let parameters = self.parameter_list();
        parameters.len() == types.len()
            && parameters.iter().zip(types).all(|(p, t)| p.id() == t.id())
    }

    /// Exactly `count` parameters
    fn has_parameter_count(&self, count: usize) -> bool {
        self.parameter_list().len() == count
    }

    /// No parameters
    fn has_no_parameter(&self) -> bool {
        self.parameter_list().is_empty()
    }

    /// Exactly `count` generic parameters
    fn has_generic_parameter_count(&self, count: usize) -> bool {
        self.generic_count() == count
    }

    /// At least one generic parameter
    fn is_generic(&self) -> bool {
        self.generic_count() > 0
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Method facade
pub struct MethodKind;

/// Search options of a method
#[derive(Debug, Clone)]
pub struct MethodOptions {
    /// Method name
    pub name: String,
    /// Return type
    pub return_type: TypeHandle,
    /// Accessibility
    pub visibility: Visibility,
    /// Public method
    pub is_public: bool,
    /// Static method
    pub is_static: bool,
    /// Instance method
    pub is_instance: bool,
    /// Virtual method
    pub is_virtual: bool,
    /// Abstract method
    pub is_abstract: bool,
    /// Closed to overriding
    pub is_final: bool,
    /// Property or event accessor
    pub is_special_name: bool,
    parameter_types: Vec<TypeHandle>,
    generic_arity: usize,
}

impl SignatureOptions for MethodOptions {
    fn parameter_list(&self) -> &[TypeHandle] {
        &self.parameter_types
    }

    fn generic_count(&self) -> usize {
        self.generic_arity
    }
}

impl QueryKind for MethodKind {
    type Item = MethodDescriptor;
    type Options = MethodOptions;
    const NAME: &'static str = "method";

    fn project(member: &MemberDescriptor) -> Option<MethodDescriptor> {
        member.as_method().cloned()
    }

    fn options(method: &MethodDescriptor) -> MethodOptions {
        MethodOptions {
            name: method.name().to_string(),
            return_type: method.return_type().clone(),
            visibility: method.visibility(),
            is_public: method.visibility().is_public(),
            is_static: method.is_static(),
            is_instance: !method.is_static(),
            is_virtual: method.is_virtual(),
            is_abstract: method.is_abstract(),
            is_final: method.is_final(),
            is_special_name: method.is_special_name(),
            parameter_types: method.parameter_types(),
            generic_arity: method.generic_arity(),
        }
    }

    fn name(method: &MethodDescriptor) -> &str {
        method.name()
    }

    fn signature(method: &MethodDescriptor) -> MemberSignature {
        MemberDescriptor::Method(method.clone()).signature()
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// Constructor facade
pub struct ConstructorKind;

/// Search options of a constructor
#[derive(Debug, Clone)]
pub struct ConstructorOptions {
    /// Accessibility
    pub visibility: Visibility,
    /// Public constructor
    pub is_public: bool,
    /// Type initializer
    pub is_static: bool,
    /// Instance constructor
    pub is_instance: bool,
    parameter_types: Vec<TypeHandle>,
}

impl SignatureOptions for ConstructorOptions {
    fn parameter_list(&self) -> &[TypeHandle] {
        &self.parameter_types
    }

    fn generic_count(&self) -> usize {
        0
    }
}

impl QueryKind for ConstructorKind {
    type Item = ConstructorDescriptor;
    type Options = ConstructorOptions;
    const NAME: &'static str = "constructor";

    fn project(member: &MemberDescriptor) -> Option<ConstructorDescriptor> {
        member.as_constructor().cloned()
    }

    fn options(constructor: &ConstructorDescriptor) -> ConstructorOptions {
        ConstructorOptions {
            visibility: constructor.visibility(),
            is_public: constructor.visibility().is_public(),
            is_static: constructor.is_static(),
            is_instance: !constructor.is_static(),
            parameter_types: constructor.parameter_types(),
        }
    }

    fn name(constructor: &ConstructorDescriptor) -> &str {
        constructor.name()
    }

    fn signature(constructor: &ConstructorDescriptor) -> MemberSignature {
        MemberDescriptor::Constructor(constructor.clone()).signature()
    }
}
