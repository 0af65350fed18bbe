//! Dynamic Stub-Type Synthesizer
//!
//! Given an interface or a non-sealed, non-static class, builds a brand-new
//! public class that implements or extends it with trivial bodies.
//!
//! ## Member handling
//!
//! Every public instance member the all-members query returns for the source
//! is handled by kind:
//!
//! | Kind        | Emitted                                                     |
//! |-------------|-------------------------------------------------------------|
//! | method      | override returning the default value; accessors and non-overridable methods skipped |
//! | property    | same-named property over a private storage field; indexers keep their index parameters |
//! | event       | add and remove accessors with empty bodies                  |
//! | constructor | forwarding constructor per public base constructor (class sources) |
//! | field       | nothing                                                     |
//!
//! Interface sources receive the implicit parameterless constructor.
//!
//! Each call opens its own assembly and module, so repeated calls produce
//! distinct types even with the same [`GeneratedTypeSpec`]. The build either
//! yields a finished type or an error; nothing partial escapes.
//!
//! Protected abstract members are not public, so they are not implemented and
//! the runtime rejects the type with a missing-implementation error.

mod emit;

use serde::{Deserialize, Serialize};
use typescope_runtime::TypeHandle;

use crate::descriptor::MemberDescriptor;
use crate::error::{require_name, ReflectError, ReflectResult};
use crate::naming;
use crate::query::MemberQueries;

pub use emit::{RuntimeStubBuilder, RuntimeTypeConstruction, StubTypeBuilder, TypeConstruction};

/// Default assembly name
pub const DEFAULT_ASSEMBLY_NAME: &str = "DynamicAssembly";
/// Default module name
pub const DEFAULT_MODULE_NAME: &str = "DynamicModule";
/// Default type name
pub const DEFAULT_TYPE_NAME: &str = "DynamicType";

/// Names of the scope and the type a synthesis call creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedTypeSpec {
    /// Assembly holding the module
    pub assembly_name: String,
    /// Module holding the type
    pub module_name: String,
    /// Name of the generated type
    pub type_name: String,
}

impl Default for GeneratedTypeSpec {
    fn default() -> Self {
        Self {
            assembly_name: DEFAULT_ASSEMBLY_NAME.to_string(),
            module_name: DEFAULT_MODULE_NAME.to_string(),
            type_name: DEFAULT_TYPE_NAME.to_string(),
        }
    }
}

impl GeneratedTypeSpec {
    /// Create a spec; every name must be non-blank
    pub fn new(assembly_name: &str, module_name: &str, type_name: &str) -> ReflectResult<Self> {
        let spec = Self {
            assembly_name: assembly_name.to_string(),
            module_name: module_name.to_string(),
            type_name: type_name.to_string(),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Replace the assembly name
    pub fn with_assembly_name(mut self, name: &str) -> ReflectResult<Self> {
        require_name("assembly_name", name)?;
        self.assembly_name = name.to_string();
        Ok(self)
    }

    /// Replace the module name
    pub fn with_module_name(mut self, name: &str) -> ReflectResult<Self> {
        require_name("module_name", name)?;
        self.module_name = name.to_string();
        Ok(self)
    }

    /// Replace the type name
    pub fn with_type_name(mut self, name: &str) -> ReflectResult<Self> {
        require_name("type_name", name)?;
        self.type_name = name.to_string();
        Ok(self)
    }

    /// Reject blank names
    pub fn validate(&self) -> ReflectResult<()> {
        require_name("assembly_name", &self.assembly_name)?;
        require_name("module_name", &self.module_name)?;
        require_name("type_name", &self.type_name)
    }
}

/// Synthesizes stub types through a [`TypeConstruction`]
#[derive(Debug, Clone, Default)]
pub struct StubSynthesizer<C: TypeConstruction = RuntimeTypeConstruction> {
    construction: C,
}

impl StubSynthesizer {
    /// Synthesizer emitting into runtime dynamic assemblies
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: TypeConstruction> StubSynthesizer<C> {
    /// Synthesizer emitting through `construction`
    pub fn with_construction(construction: C) -> Self {
        Self { construction }
    }

    /// The construction facility
    pub fn construction(&self) -> &C {
        &self.construction
    }

    fn check_source(source: &TypeHandle) -> ReflectResult<()> {
        let name = naming::type_name(source);
        if source.is_static() {
            return Err(ReflectError::InvalidArgument(format!(
                "cannot generate from static type {}",
                name
            )));
        }
        if source.is_sealed() {
            return Err(ReflectError::InvalidArgument(format!(
                "cannot generate from sealed type {}",
                name
            )));
        }
        if !source.is_class() && !source.is_interface() {
            return Err(ReflectError::InvalidArgument(format!(
                "cannot generate from non-class type {}",
                name
            )));
        }
        Ok(())
    }

    /// Build a concrete stub type from `source`
    ///
    /// `spec` defaults to [`GeneratedTypeSpec::default`].
    pub fn synthesize(
        &mut self,
        source: &TypeHandle,
        spec: Option<&GeneratedTypeSpec>,
    ) -> ReflectResult<TypeHandle> {
        Self::check_source(source)?;
        let default_spec = GeneratedTypeSpec::default();
        let spec = spec.unwrap_or(&default_spec);
        spec.validate()?;

        let span = tracing::debug_span!(
            "synthesize",
            source = %naming::type_name(source),
            type_name = %spec.type_name
        );
        let _enter = span.enter();

        let mut builder = self.construction.open_scope(spec, source)?;
        let members = source
            .members()
            .all_where(|o| o.is_public && o.is_instance);

        let mut emitted = 0usize;
        for member in &members {
            match member {
                MemberDescriptor::Method(method) => {
                    if !method.is_overridable() || method.is_special_name() {
                        tracing::trace!(method = method.name(), "skipped method");
                        continue;
                    }
                    builder.define_stub_method(method)?;
                }
                MemberDescriptor::Property(property) => builder.define_storage_property(property)?,
                MemberDescriptor::Event(event) => builder.define_noop_event(event)?,
                MemberDescriptor::Constructor(constructor) => {
                    if !source.is_class() {
                        continue;
                    }
                    builder.define_pass_through_constructor(constructor)?;
                }
                MemberDescriptor::Field(_) => continue,
            }
            emitted += 1;
        }

        let ty = builder.finalize()?;
        tracing::debug!(
            generated = %naming::type_name(&ty),
            considered = members.len(),
            emitted,
            "synthesized stub type"
        );
        Ok(ty)
    }
}

/// Build a concrete stub type from `source` with the runtime construction facility
pub fn synthesize(source: &TypeHandle, spec: Option<&GeneratedTypeSpec>) -> ReflectResult<TypeHandle> {
    StubSynthesizer::new().synthesize(source, spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec() {
        let spec = GeneratedTypeSpec::default();
        assert_eq!(spec.assembly_name, "DynamicAssembly");
        assert_eq!(spec.module_name, "DynamicModule");
        assert_eq!(spec.type_name, "DynamicType");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_blank_names_rejected() {
        assert!(matches!(
            GeneratedTypeSpec::new("A", " ", "T"),
            Err(ReflectError::InvalidArgument(_))
        ));
        assert!(GeneratedTypeSpec::default().with_type_name("").is_err());
        assert!(GeneratedTypeSpec::default().with_assembly_name("Stubs").is_ok());
    }

    #[test]
    fn test_partial_spec_deserializes_with_defaults() {
        let spec: GeneratedTypeSpec = serde_json::from_str(r#"{"type_name": "Stub"}"#).unwrap();
        assert_eq!(spec.type_name, "Stub");
        assert_eq!(spec.module_name, "DynamicModule");
    }
}
