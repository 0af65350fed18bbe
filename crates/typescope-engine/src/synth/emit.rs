//! Stub emission
//!
//! The synthesizer drives a [`TypeConstruction`] through one scope per call:
//! open the scope, define members one at a time, then finalize. The runtime
//! implementation emits into a fresh [`DynamicAssembly`] and seals its module
//! once the type is built.
//!
//! ## Emitted bodies
//!
//! | Member       | Body                                                    |
//! |--------------|---------------------------------------------------------|
//! | method       | `LoadDefault(ret); Return`, or `ReturnVoid` for `void`  |
//! | getter       | `LoadArg 0; LoadField storage; Return`                  |
//! | setter       | `LoadArg 0; LoadArg value; StoreField storage; ReturnVoid` |
//! | event add/remove | `ReturnVoid`                                        |
//! | constructor  | `LoadArg 0..=n; CallConstructor base; ReturnVoid`       |

use rustc_hash::FxHashSet;
use typescope_runtime::{
    backing_field_name, AccessorDefinition, BodyBuilder, ClassBuilder, ConstructorDefinition,
    DynamicAssembly, EventDefinition, FieldDefinition, FieldLocation, MethodBody,
    MethodDefinition, PropertyDefinition, TypeHandle, Visibility,
};

use super::GeneratedTypeSpec;
use crate::descriptor::{
    ConstructorDescriptor, EventDescriptor, MethodDescriptor, PropertyDescriptor,
};
use crate::error::{ReflectError, ReflectResult};

/// Opens one construction scope per synthesized type
pub trait TypeConstruction {
    /// Builder for the type under construction
    type Builder: StubTypeBuilder;

    /// Open a fresh scope and start a public class derived from `source`
    fn open_scope(
        &mut self,
        spec: &GeneratedTypeSpec,
        source: &TypeHandle,
    ) -> ReflectResult<Self::Builder>;
}

/// Defines stub members on a type under construction
pub trait StubTypeBuilder {
    /// Override `method` with a body returning the default of its return type
    fn define_stub_method(&mut self, method: &MethodDescriptor) -> ReflectResult<()>;

    /// Implement `property` over a private storage field
    fn define_storage_property(&mut self, property: &PropertyDescriptor) -> ReflectResult<()>;

    /// Implement `event` with empty add and remove accessors
    fn define_noop_event(&mut self, event: &EventDescriptor) -> ReflectResult<()>;

    /// Declare a constructor forwarding its arguments to `base`
    fn define_pass_through_constructor(&mut self, base: &ConstructorDescriptor) -> ReflectResult<()>;

    /// Build the type and close the scope
    fn finalize(self) -> ReflectResult<TypeHandle>;
}

/// Emission into runtime dynamic assemblies
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeTypeConstruction;

impl TypeConstruction for RuntimeTypeConstruction {
    type Builder = RuntimeStubBuilder;

    fn open_scope(
        &mut self,
        spec: &GeneratedTypeSpec,
        source: &TypeHandle,
    ) -> ReflectResult<RuntimeStubBuilder> {
        let mut assembly = DynamicAssembly::define(&spec.assembly_name)?;
        let mut class = assembly
            .define_module(&spec.module_name)?
            .define_class(&spec.type_name)?;
        if source.is_interface() {
            class.add_interface(source.clone())?;
        } else {
            class.set_parent(source.clone())?;
        }
        tracing::trace!(
            assembly = %spec.assembly_name,
            module = %spec.module_name,
            "opened construction scope"
        );
        Ok(RuntimeStubBuilder {
            assembly,
            module_name: spec.module_name.clone(),
            class,
            storage_names: FxHashSet::default(),
        })
    }
}

/// Type under construction in a runtime dynamic module
#[derive(Debug)]
pub struct RuntimeStubBuilder {
    assembly: DynamicAssembly,
    module_name: String,
    class: ClassBuilder,
    storage_names: FxHashSet<String>,
}

impl RuntimeStubBuilder {
    fn storage_name(&mut self, property: &str) -> String {
        let base = backing_field_name(property);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while !self.storage_names.insert(candidate.clone()) {
            candidate = format!("{}{}", base, suffix);
            suffix += 1;
        }
        candidate
    }

    fn default_return_body(method: &MethodDescriptor) -> ReflectResult<MethodBody> {
        let mut body = BodyBuilder::new(method.name(), method.def().parameters.len() + 1);
        let return_type = method.return_type();
        if return_type.is_void() {
            body.emit_return_void()?;
        } else {
            body.emit_load_default(return_type.clone())?;
            body.emit_return()?;
        }
        Ok(body.build_body()?)
    }

    fn getter_body(
        name: String,
        index_count: usize,
        storage: &FieldLocation,
    ) -> ReflectResult<MethodBody> {
        let mut body = BodyBuilder::new(name, index_count + 1);
        body.emit_load_arg(0)?;
        body.emit_load_field(storage.clone())?;
        body.emit_return()?;
        Ok(body.build_body()?)
    }

    fn setter_body(
        name: String,
        index_count: usize,
        storage: &FieldLocation,
    ) -> ReflectResult<MethodBody> {
        let mut body = BodyBuilder::new(name, index_count + 2);
        body.emit_load_arg(0)?;
        body.emit_load_arg(index_count + 1)?;
        body.emit_store_field(storage.clone())?;
        body.emit_return_void()?;
        Ok(body.build_body()?)
    }
}

impl StubTypeBuilder for RuntimeStubBuilder {
    fn define_stub_method(&mut self, method: &MethodDescriptor) -> ReflectResult<()> {
        let def = method.def();
        let mut definition = MethodDefinition::new(method.name())
            .returns(def.return_type.clone())
            .as_virtual()
            .with_body(Self::default_return_body(method)?);
        for parameter in &def.parameters {
            definition = definition.with_param(&parameter.name, parameter.ty.clone());
        }
        for generic in &def.generic_parameters {
            definition = definition.with_generic_param(generic);
        }
        self.class.add_method(definition)?;
        tracing::trace!(method = method.name(), "defined stub method");
        Ok(())
    }

    fn define_storage_property(&mut self, property: &PropertyDescriptor) -> ReflectResult<()> {
        let name = property.name();
        let storage_name = self.storage_name(name);
        let storage = self.class.add_field(
            FieldDefinition::new(&storage_name, property.property_type().clone())
                .with_visibility(Visibility::Private)
                .as_property_storage(),
        )?;

        let index_parameters = &property.def().index_parameters;
        let mut definition =
            PropertyDefinition::new(name, property.property_type().clone()).as_virtual();
        for parameter in index_parameters {
            definition = definition.with_index_param(&parameter.name, parameter.ty.clone());
        }
        if let Some(getter) = property.getter() {
            let body = Self::getter_body(format!("get_{}", name), index_parameters.len(), &storage)?;
            definition = definition
                .with_getter(AccessorDefinition::new(body).with_visibility(getter.visibility()));
        }
        if let Some(setter) = property.setter() {
            let body = Self::setter_body(format!("set_{}", name), index_parameters.len(), &storage)?;
            definition = definition
                .with_setter(AccessorDefinition::new(body).with_visibility(setter.visibility()));
        }
        self.class.add_property(definition)?;
        tracing::trace!(property = name, storage = %storage_name, "defined storage property");
        Ok(())
    }

    fn define_noop_event(&mut self, event: &EventDescriptor) -> ReflectResult<()> {
        self.class.add_event(
            EventDefinition::new(event.name(), event.handler_type().clone()).as_virtual(),
        )?;
        tracing::trace!(event = event.name(), "defined no-op event");
        Ok(())
    }

    fn define_pass_through_constructor(&mut self, base: &ConstructorDescriptor) -> ReflectResult<()> {
        let parameters = &base.def().parameters;
        let mut body = BodyBuilder::new(".ctor", parameters.len() + 1);
        for index in 0..=parameters.len() {
            body.emit_load_arg(index)?;
        }
        body.emit_call_constructor(base.def().clone())?;
        body.emit_return_void()?;

        let mut definition = ConstructorDefinition::new().with_body(body.build_body()?);
        for parameter in parameters {
            definition = definition.with_param(&parameter.name, parameter.ty.clone());
        }
        self.class.add_constructor(definition)?;
        tracing::trace!(arity = parameters.len(), "defined pass-through constructor");
        Ok(())
    }

    fn finalize(mut self) -> ReflectResult<TypeHandle> {
        let ty = self.class.build()?;
        let module = self
            .assembly
            .get_module_mut(&self.module_name)
            .ok_or_else(|| {
                ReflectError::InvalidOperation(format!(
                    "module '{}' vanished from its assembly",
                    self.module_name
                ))
            })?;
        module.add_type(ty.clone())?;
        module.seal()?;
        Ok(ty)
    }
}
