//! Dynamic Assemblies and Modules
//!
//! Types emitted at runtime live in a [`DynamicModule`] that belongs to a
//! [`DynamicAssembly`]. A module accepts new types while it is
//! [`ModuleState::Building`] and rejects them once sealed.
//!
//! ```rust,ignore
//! let mut assembly = DynamicAssembly::define("Stubs")?;
//! let module = assembly.define_module("Main")?;
//! let mut builder = module.define_class("Stub")?;
//! let stub = builder.build()?;
//! module.add_type(stub)?;
//! module.seal()?;
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use rustc_hash::FxHashMap;

use crate::class_builder::ClassBuilder;
use crate::types::TypeHandle;
use crate::{RuntimeError, RuntimeResult};

/// Global counter for module IDs
static NEXT_MODULE_ID: AtomicUsize = AtomicUsize::new(1);

/// Where a dynamically built type was emitted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleOrigin {
    /// Owning assembly
    pub assembly_name: String,
    /// Owning module
    pub module_name: String,
}

/// Dynamic module state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Module is accepting types
    Building,
    /// Module is closed
    Sealed,
}

/// A module of runtime-emitted types
#[derive(Debug)]
pub struct DynamicModule {
    /// Unique module ID
    pub id: usize,
    /// Module name
    pub name: String,
    /// Owning assembly name
    pub assembly_name: String,
    /// Module state
    pub state: ModuleState,
    types: Vec<TypeHandle>,
    type_names: FxHashMap<String, usize>,
}

impl DynamicModule {
    fn new(assembly_name: String, name: String) -> Self {
        Self {
            id: NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            assembly_name,
            state: ModuleState::Building,
            types: Vec::new(),
            type_names: FxHashMap::default(),
        }
    }

    /// Origin stamped on every type of this module
    pub fn origin(&self) -> ModuleOrigin {
        ModuleOrigin {
            assembly_name: self.assembly_name.clone(),
            module_name: self.name.clone(),
        }
    }

    /// Start a class belonging to this module
    pub fn define_class(&self, name: &str) -> RuntimeResult<ClassBuilder> {
        if self.state != ModuleState::Building {
            return Err(RuntimeError::Finalized(format!("Module '{}'", self.name)));
        }
        if self.type_names.contains_key(name) {
            return Err(RuntimeError::InvalidDefinition(format!(
                "Type '{}' already exists in module '{}'",
                name, self.name
            )));
        }

        let mut builder = ClassBuilder::class(name);
        builder.set_origin(self.origin());
        Ok(builder)
    }

    /// Record a finished type of this module
    pub fn add_type(&mut self, ty: TypeHandle) -> RuntimeResult<()> {
        if self.state != ModuleState::Building {
            return Err(RuntimeError::Finalized(format!("Module '{}'", self.name)));
        }
        if ty.origin() != Some(&self.origin()) {
            return Err(RuntimeError::InvalidDefinition(format!(
                "Type '{}' was not defined in module '{}'",
                ty.full_name(),
                self.name
            )));
        }
        let name = ty.full_name();
        if self.type_names.contains_key(&name) {
            return Err(RuntimeError::InvalidDefinition(format!(
                "Type '{}' already exists in module '{}'",
                name, self.name
            )));
        }

        self.type_names.insert(name, self.types.len());
        self.types.push(ty);
        Ok(())
    }

    /// Look a type up by full name
    pub fn get_type(&self, name: &str) -> Option<&TypeHandle> {
        self.type_names.get(name).map(|&index| &self.types[index])
    }

    /// Types in definition order
    pub fn types(&self) -> &[TypeHandle] {
        &self.types
    }

    /// Close the module
    pub fn seal(&mut self) -> RuntimeResult<()> {
        if self.state != ModuleState::Building {
            return Err(RuntimeError::Finalized(format!("Module '{}'", self.name)));
        }
        self.state = ModuleState::Sealed;
        Ok(())
    }

    /// Check if the module is sealed
    pub fn is_sealed(&self) -> bool {
        self.state == ModuleState::Sealed
    }
}

/// A named collection of dynamic modules
#[derive(Debug)]
pub struct DynamicAssembly {
    /// Assembly name
    pub name: String,
    modules: Vec<DynamicModule>,
}

impl DynamicAssembly {
    /// Define a new, empty assembly
    pub fn define(name: &str) -> RuntimeResult<Self> {
        if name.trim().is_empty() {
            return Err(RuntimeError::InvalidDefinition(
                "Assembly name cannot be blank".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            modules: Vec::new(),
        })
    }

    /// Define a module inside this assembly
    pub fn define_module(&mut self, name: &str) -> RuntimeResult<&mut DynamicModule> {
        if name.trim().is_empty() {
            return Err(RuntimeError::InvalidDefinition(
                "Module name cannot be blank".to_string(),
            ));
        }
        if self.modules.iter().any(|m| m.name == name) {
            return Err(RuntimeError::InvalidDefinition(format!(
                "Module '{}' already exists in assembly '{}'",
                name, self.name
            )));
        }

        let index = self.modules.len();
        self.modules
            .push(DynamicModule::new(self.name.clone(), name.to_string()));
        Ok(&mut self.modules[index])
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&DynamicModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Get a module by name (mutable)
    pub fn get_module_mut(&mut self, name: &str) -> Option<&mut DynamicModule> {
        self.modules.iter_mut().find(|m| m.name == name)
    }

    /// Module names in definition order
    pub fn module_names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_module() {
        let mut assembly = DynamicAssembly::define("Stubs").unwrap();
        let module = assembly.define_module("Main").unwrap();

        assert_eq!(module.name, "Main");
        assert_eq!(module.assembly_name, "Stubs");
        assert!(!module.is_sealed());
        assert_eq!(assembly.module_names(), vec!["Main".to_string()]);
    }

    #[test]
    fn test_duplicate_module_name() {
        let mut assembly = DynamicAssembly::define("Stubs").unwrap();
        assembly.define_module("Main").unwrap();
        assert!(assembly.define_module("Main").is_err());
    }

    #[test]
    fn test_blank_names_rejected() {
        assert!(DynamicAssembly::define("  ").is_err());
        let mut assembly = DynamicAssembly::define("Stubs").unwrap();
        assert!(assembly.define_module("").is_err());
    }

    #[test]
    fn test_add_type_and_lookup() {
        let mut assembly = DynamicAssembly::define("Stubs").unwrap();
        let module = assembly.define_module("Main").unwrap();
        let stub = module.define_class("Stub").unwrap().build().unwrap();

        assert_eq!(stub.origin(), Some(&module.origin()));
        module.add_type(stub.clone()).unwrap();
        assert_eq!(module.get_type("Stub"), Some(&stub));
        assert!(module.define_class("Stub").is_err());
    }

    #[test]
    fn test_foreign_type_rejected() {
        let mut assembly = DynamicAssembly::define("Stubs").unwrap();
        let module = assembly.define_module("Main").unwrap();
        let foreign = ClassBuilder::class("Foreign").build().unwrap();
        assert!(module.add_type(foreign).is_err());
    }

    #[test]
    fn test_cannot_add_to_sealed_module() {
        let mut assembly = DynamicAssembly::define("Stubs").unwrap();
        let module = assembly.define_module("Main").unwrap();
        let stub = module.define_class("Stub").unwrap().build().unwrap();
        module.seal().unwrap();

        assert!(module.is_sealed());
        assert!(module.add_type(stub).is_err());
        assert!(module.define_class("Other").is_err());
        assert!(module.seal().is_err());
    }
}
