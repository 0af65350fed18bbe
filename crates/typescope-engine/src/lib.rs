//! Typescope Reflection Engine
//!
//! Member resolution, unified property-or-field access and stub type
//! synthesis over the typescope runtime:
//! - **Descriptors**: one identity for fields, properties, methods, constructors and events (`descriptor`)
//! - **Hierarchy**: inheritance walk and shadowed-member deduplication (`hierarchy`)
//! - **Queries**: kind-specific facades with predicate and name search (`query`)
//! - **Accessor**: read/write over fields and properties alike (`accessor`)
//! - **Conventions**: backing-field naming conventions (`conventions`)
//! - **Synthesis**: concrete stub types from interfaces and abstract classes (`synth`)
//! - **Equality**: memberwise comparison and hashing of object values (`equality`)
//!
//! # Example
//!
//! ```rust,ignore
//! use typescope_engine::{synthesize, MemberQueries};
//!
//! let stub = synthesize(&person_interface, None)?;
//! let id = stub.properties_or_fields().named("Id")?;
//! let instance = Value::Object(interpreter::construct(&stub, &[])?);
//! id.set_value(&instance, Value::i32(42))?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod accessor;
pub mod config;
pub mod conventions;
pub mod descriptor;
pub mod equality;
pub mod error;
pub mod hierarchy;
pub mod naming;
pub mod query;
pub mod synth;

pub use accessor::PropertyOrField;
pub use config::ReflectConfig;
pub use conventions::{BackingFieldConvention, BackingFieldConventions, BackingFieldResolver};
pub use descriptor::{
    ConstructorDescriptor, EventDescriptor, FieldDescriptor, MemberDescriptor, MemberSignature,
    MethodDescriptor, PropertyDescriptor,
};
pub use equality::{memberwise_equals, memberwise_hash};
pub use error::{ConfigError, ReflectError, ReflectResult};
pub use query::{MemberQueries, MemberQuery, NameComparison, QueryKind, SignatureOptions};
pub use synth::{
    synthesize, GeneratedTypeSpec, RuntimeTypeConstruction, StubSynthesizer, StubTypeBuilder,
    TypeConstruction,
};
