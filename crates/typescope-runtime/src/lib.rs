//! Typescope Managed Runtime
//!
//! This crate provides the object model that the typescope engine reflects over:
//! - **Types**: classes, interfaces, delegates and primitives (`types` module)
//! - **Members**: fields, properties, methods, constructors and events (`members` module)
//! - **Values**: primitive values, shared object instances and delegates (`value` module)
//! - **Bodies**: native closures and compiled instruction streams (`body` module)
//! - **Interpreter**: invocation, virtual dispatch and field access (`interpreter` module)
//! - **Construction**: class builders and dynamic assemblies/modules
//!   (`class_builder` and `dynamic_module` modules)
//!
//! # Example
//!
//! ```rust,ignore
//! use typescope_runtime::{ClassBuilder, PropertyDefinition, Value, types, interpreter};
//!
//! let mut builder = ClassBuilder::class("Person");
//! builder.add_property(PropertyDefinition::new("Name", types::string()).auto())?;
//! let person = builder.build()?;
//!
//! let instance = interpreter::construct(&person, &[])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![cfg_attr(test, allow(clippy::approx_constant))]
#![allow(clippy::derivable_impls)]
#![allow(clippy::new_without_default)]

pub mod body;
pub mod class_builder;
pub mod dynamic_module;
pub mod interpreter;
pub mod members;
pub mod types;
pub mod value;

pub use body::{BodyBuilder, CallContext, CompiledBody, Instruction, MethodBody, NativeFn};
pub use class_builder::{
    backing_field_name, AccessorDefinition, ClassBuilder, ConstructorDefinition, EventDefinition, FieldDefinition,
    MethodDefinition, ParameterDefinition, PropertyDefinition,
};
pub use dynamic_module::{DynamicAssembly, DynamicModule, ModuleOrigin, ModuleState};
pub use members::{
    AccessorRole, ConstructorDef, EventDef, FieldDef, FieldLocation, MemberDef, MemberKind,
    MethodDef, ParameterDef, PropertyDef, StaticSlot, Visibility,
};
pub use types::{PrimitiveType, TypeDef, TypeFlags, TypeHandle, TypeId, TypeKind};
pub use value::{Delegate, ObjectRef, Value};

/// Runtime execution and construction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    /// Value does not fit the expected type
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual value or type description
        actual: String,
    },

    /// Instance member used without a receiver
    #[error("Null receiver for instance member '{member}'")]
    NullReceiver {
        /// Member name
        member: String,
    },

    /// Wrong number of arguments passed to a callable
    #[error("Argument count mismatch for '{member}': expected {expected}, got {actual}")]
    ArgumentCount {
        /// Callable name
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// Abstract member invoked without an override on the receiver
    #[error("Cannot invoke abstract member '{member}'")]
    AbstractInvocation {
        /// Member name
        member: String,
    },

    /// Type cannot be instantiated (interface, abstract, static or primitive)
    #[error("Type '{type_name}' cannot be instantiated")]
    NotInstantiable {
        /// Type name
        type_name: String,
    },

    /// No constructor accepts the supplied arguments
    #[error("No constructor on '{type_name}' accepts {arity} argument(s)")]
    MissingConstructor {
        /// Type name
        type_name: String,
        /// Supplied argument count
        arity: usize,
    },

    /// Non-abstract class does not implement an inherited abstract member
    #[error("Type '{type_name}' does not implement abstract member '{member}'")]
    MissingImplementation {
        /// Type being built
        type_name: String,
        /// Unimplemented member
        member: String,
    },

    /// Invalid type or member definition
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// Compiled body failed validation or execution
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// Builder or module already finalized
    #[error("{0} is already finalized")]
    Finalized(String),

    /// Native code reported a failure
    #[error("Native error: {0}")]
    Native(String),
}

/// Runtime result type
pub type RuntimeResult<T> = Result<T, RuntimeError>;
