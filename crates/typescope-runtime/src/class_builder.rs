//! Class and Interface Builder
//!
//! Runtime types are assembled with a [`ClassBuilder`]: member definitions are
//! described with chainable `*Definition` values and added one at a time, then
//! [`ClassBuilder::build`] validates the whole type and freezes it into a
//! [`TypeHandle`].
//!
//! ```rust,ignore
//! let mut builder = ClassBuilder::class("Greeter");
//! builder.add_property(PropertyDefinition::new("Name", types::string()).auto())?;
//! builder.add_method(
//!     MethodDefinition::new("Greet")
//!         .returns(types::string())
//!         .native(|_| Ok(Value::string("hello"))),
//! )?;
//! let greeter = builder.build()?;
//! ```
//!
//! ## Build-time checks
//!
//! | Check                         | Error                                   |
//! |-------------------------------|-----------------------------------------|
//! | Inherited abstract member     | [`RuntimeError::MissingImplementation`] |
//! | Abstract member, concrete type | [`RuntimeError::InvalidDefinition`]    |
//! | No reachable base constructor | [`RuntimeError::InvalidDefinition`]     |
//! | Instance member on static type | [`RuntimeError::InvalidDefinition`]    |

use std::sync::Arc;

use crate::body::{BodyBuilder, CallContext, MethodBody};
use crate::dynamic_module::ModuleOrigin;
use crate::interpreter;
use crate::members::{
    AccessorRole, ConstructorDef, EventDef, FieldDef, FieldLocation, MemberDef, MethodDef,
    ParameterDef, PropertyDef, StaticSlot, StaticStorage, Visibility,
};
use crate::types::{self, generate_type_id, TypeDef, TypeFlags, TypeHandle, TypeId, TypeKind};
use crate::value::Value;
use crate::{RuntimeError, RuntimeResult};

// ============================================================================
// Definitions
// ============================================================================

/// Parameter definition for method, constructor and indexer signatures
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: TypeHandle,
}

impl ParameterDefinition {
    /// Create a new parameter definition
    pub fn new(name: &str, ty: TypeHandle) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }

    fn to_def(&self) -> ParameterDef {
        ParameterDef {
            name: self.name.clone(),
            ty: self.ty.clone(),
        }
    }
}

/// Definition for a field
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: TypeHandle,
    /// Accessibility
    pub visibility: Visibility,
    /// Whether this is a static field
    pub is_static: bool,
    /// Whether this field is readonly
    pub is_readonly: bool,
    /// Initial value of a static field
    pub initial_value: Option<Value>,
    /// Storage cell of a property
    pub is_auto_property_storage: bool,
}

impl FieldDefinition {
    /// Create a public instance field
    pub fn new(name: &str, field_type: TypeHandle) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            visibility: Visibility::Public,
            is_static: false,
            is_readonly: false,
            initial_value: None,
            is_auto_property_storage: false,
        }
    }

    /// Set the accessibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as static field
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as readonly
    pub fn as_readonly(mut self) -> Self {
        self.is_readonly = true;
        self
    }

    /// Set the initial value (static fields only)
    pub fn initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Flag the field as the storage cell of a property
    pub fn as_property_storage(mut self) -> Self {
        self.is_auto_property_storage = true;
        self
    }
}

/// Definition for a method
#[derive(Debug, Clone)]
pub struct MethodDefinition {
    /// Method name
    pub name: String,
    /// Return type
    pub return_type: TypeHandle,
    /// Parameters
    pub parameters: Vec<ParameterDefinition>,
    /// Generic parameter names
    pub generic_parameters: Vec<String>,
    /// Accessibility
    pub visibility: Visibility,
    /// Whether this is a static method
    pub is_static: bool,
    /// Whether this method is virtual
    pub is_virtual: bool,
    /// Whether overriding stops here
    pub is_final: bool,
    /// Body; [`MethodBody::Abstract`] declares an abstract method
    pub body: MethodBody,
}

impl MethodDefinition {
    /// Create a public `void` method without a body
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            return_type: types::void(),
            parameters: Vec::new(),
            generic_parameters: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
            is_virtual: false,
            is_final: false,
            body: MethodBody::Abstract,
        }
    }

    /// Set return type
    pub fn returns(mut self, ty: TypeHandle) -> Self {
        self.return_type = ty;
        self
    }

    /// Add a parameter
    pub fn with_param(mut self, name: &str, ty: TypeHandle) -> Self {
        self.parameters.push(ParameterDefinition::new(name, ty));
        self
    }

    /// Add a generic parameter
    pub fn with_generic_param(mut self, name: &str) -> Self {
        self.generic_parameters.push(name.to_string());
        self
    }

    /// Set the accessibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Mark as abstract, dropping any body
    pub fn as_abstract(mut self) -> Self {
        self.is_virtual = true;
        self.body = MethodBody::Abstract;
        self
    }

    /// Close a virtual method to further overriding
    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = body;
        self
    }

    /// Set a native body
    pub fn native<F>(self, f: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.with_body(MethodBody::native(f))
    }
}

/// Definition for one property or event accessor
#[derive(Debug, Clone)]
pub struct AccessorDefinition {
    /// Accessibility
    pub visibility: Visibility,
    /// Body; [`MethodBody::Abstract`] declares an abstract accessor
    pub body: MethodBody,
}

impl AccessorDefinition {
    /// Public accessor with the given body
    pub fn new(body: MethodBody) -> Self {
        Self {
            visibility: Visibility::Public,
            body,
        }
    }

    /// Public accessor with a native body
    pub fn native<F>(f: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        Self::new(MethodBody::native(f))
    }

    /// Public accessor without a body
    pub fn declared() -> Self {
        Self::new(MethodBody::Abstract)
    }

    /// Set the accessibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Definition for a property or indexer
#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    /// Property name
    pub name: String,
    /// Value type
    pub property_type: TypeHandle,
    /// Index parameters (indexers only)
    pub index_parameters: Vec<ParameterDefinition>,
    /// Getter
    pub getter: Option<AccessorDefinition>,
    /// Setter
    pub setter: Option<AccessorDefinition>,
    /// Whether the accessors are static
    pub is_static: bool,
    /// Whether the accessors are virtual
    pub is_virtual: bool,
    /// Accessors read and write a synthesized backing field
    pub is_auto: bool,
    /// Accessibility of synthesized accessors
    pub visibility: Visibility,
}

impl PropertyDefinition {
    /// Create a property with no accessors
    pub fn new(name: &str, property_type: TypeHandle) -> Self {
        Self {
            name: name.to_string(),
            property_type,
            index_parameters: Vec::new(),
            getter: None,
            setter: None,
            is_static: false,
            is_virtual: false,
            is_auto: false,
            visibility: Visibility::Public,
        }
    }

    /// Add an index parameter
    pub fn with_index_param(mut self, name: &str, ty: TypeHandle) -> Self {
        self.index_parameters.push(ParameterDefinition::new(name, ty));
        self
    }

    /// Set the getter
    pub fn with_getter(mut self, getter: AccessorDefinition) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Set the setter
    pub fn with_setter(mut self, setter: AccessorDefinition) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Generate get/set accessors over a private backing field
    pub fn auto(mut self) -> Self {
        self.is_auto = true;
        self
    }

    /// Accessibility of auto-implemented accessors
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Definition for an instance or static constructor
#[derive(Debug, Clone)]
pub struct ConstructorDefinition {
    /// Parameters
    pub parameters: Vec<ParameterDefinition>,
    /// Accessibility
    pub visibility: Visibility,
    /// Type initializer rather than instance constructor
    pub is_static: bool,
    /// Body
    pub body: MethodBody,
}

impl ConstructorDefinition {
    /// Public parameterless constructor with an empty body
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
            body: MethodBody::native(|_| Ok(Value::Null)),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, name: &str, ty: TypeHandle) -> Self {
        self.parameters.push(ParameterDefinition::new(name, ty));
        self
    }

    /// Set the accessibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as the type initializer
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = body;
        self
    }

    /// Set a native body
    pub fn native<F>(self, f: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.with_body(MethodBody::native(f))
    }
}

impl Default for ConstructorDefinition {
    fn default() -> Self {
        Self::new()
    }
}

/// Definition for an event
#[derive(Debug, Clone)]
pub struct EventDefinition {
    /// Event name
    pub name: String,
    /// Delegate type of subscribers
    pub handler_type: TypeHandle,
    /// Whether the accessors are static
    pub is_static: bool,
    /// Whether the accessors are virtual
    pub is_virtual: bool,
    /// Subscription accessor; defaults to a no-op (abstract on interfaces)
    pub add: Option<AccessorDefinition>,
    /// Unsubscription accessor; defaults to a no-op (abstract on interfaces)
    pub remove: Option<AccessorDefinition>,
}

impl EventDefinition {
    /// Create an event with default accessors
    pub fn new(name: &str, handler_type: TypeHandle) -> Self {
        Self {
            name: name.to_string(),
            handler_type,
            is_static: false,
            is_virtual: false,
            add: None,
            remove: None,
        }
    }

    /// Set the add accessor
    pub fn with_add(mut self, add: AccessorDefinition) -> Self {
        self.add = Some(add);
        self
    }

    /// Set the remove accessor
    pub fn with_remove(mut self, remove: AccessorDefinition) -> Self {
        self.remove = Some(remove);
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Name of the storage field behind an auto-implemented property
pub fn backing_field_name(property: &str) -> String {
    format!("<{}>k__BackingField", property)
}

/// Builder for classes and interfaces
#[derive(Debug)]
pub struct ClassBuilder {
    id: TypeId,
    name: String,
    namespace: Option<String>,
    kind: TypeKind,
    flags: TypeFlags,
    parent: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    generic_arguments: Vec<TypeHandle>,
    members: Vec<MemberDef>,
    inherited_slots: Vec<TypeHandle>,
    own_slots: Vec<TypeHandle>,
    statics: Arc<StaticStorage>,
    origin: Option<ModuleOrigin>,
    finalized: bool,
}

impl ClassBuilder {
    fn with_kind(name: &str, kind: TypeKind) -> Self {
        Self {
            id: generate_type_id(),
            name: name.to_string(),
            namespace: None,
            kind,
            flags: TypeFlags::default(),
            parent: None,
            interfaces: Vec::new(),
            generic_arguments: Vec::new(),
            members: Vec::new(),
            inherited_slots: Vec::new(),
            own_slots: Vec::new(),
            statics: Arc::new(StaticStorage::default()),
            origin: None,
            finalized: false,
        }
    }

    /// Start a class
    pub fn class(name: &str) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    /// Start an interface
    pub fn interface(name: &str) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    /// Identity the built type will carry
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Simple name of the type being built
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    fn check_open(&self) -> RuntimeResult<()> {
        if self.finalized {
            return Err(RuntimeError::Finalized(format!("ClassBuilder '{}'", self.name)));
        }
        Ok(())
    }

    fn invalid(&self, message: impl std::fmt::Display) -> RuntimeError {
        RuntimeError::InvalidDefinition(format!("{}: {}", self.name, message))
    }

    /// Set the namespace
    pub fn set_namespace(&mut self, namespace: &str) {
        self.namespace = Some(namespace.to_string());
    }

    /// Mark the class abstract
    pub fn set_abstract(&mut self) {
        self.flags.is_abstract = true;
    }

    /// Mark the class sealed
    pub fn set_sealed(&mut self) {
        self.flags.is_sealed = true;
    }

    /// Mark the class static (abstract and sealed, static members only)
    pub fn set_static(&mut self) {
        self.flags.is_static = true;
        self.flags.is_abstract = true;
        self.flags.is_sealed = true;
    }

    /// Record a generic argument of a constructed generic type
    pub fn add_generic_argument(&mut self, ty: TypeHandle) {
        self.generic_arguments.push(ty);
    }

    pub(crate) fn set_origin(&mut self, origin: ModuleOrigin) {
        self.origin = Some(origin);
    }

    /// Set the parent class; must precede instance fields
    pub fn set_parent(&mut self, parent: TypeHandle) -> RuntimeResult<()> {
        self.check_open()?;
        if self.is_interface() {
            return Err(self.invalid("interfaces cannot have a parent class"));
        }
        if !parent.is_class() {
            return Err(self.invalid(format!("'{}' is not a class", parent.full_name())));
        }
        if parent.is_static() {
            return Err(self.invalid(format!("cannot derive from static class '{}'", parent)));
        }
        if parent.is_sealed() {
            return Err(self.invalid(format!("cannot derive from sealed class '{}'", parent)));
        }
        if !self.own_slots.is_empty() {
            return Err(self.invalid("parent must be set before instance fields"));
        }

        self.inherited_slots = parent.instance_slots().to_vec();
        self.parent = Some(parent);
        Ok(())
    }

    /// Implement (class) or extend (interface) an interface
    pub fn add_interface(&mut self, interface: TypeHandle) -> RuntimeResult<()> {
        self.check_open()?;
        if !interface.is_interface() {
            return Err(self.invalid(format!("'{}' is not an interface", interface)));
        }
        if self.interfaces.contains(&interface) {
            return Err(self.invalid(format!("interface '{}' listed twice", interface)));
        }
        self.interfaces.push(interface);
        Ok(())
    }

    fn name_taken(&self, name: &str) -> bool {
        self.members.iter().any(|m| match m {
            MemberDef::Field(f) => f.name == name,
            MemberDef::Property(p) => p.name == name,
            MemberDef::Event(e) => e.name == name,
            MemberDef::Method(m) => m.accessor.is_none() && m.name == name,
            MemberDef::Constructor(_) => false,
        })
    }

    fn check_name(&self, name: &str) -> RuntimeResult<()> {
        if name.trim().is_empty() {
            return Err(self.invalid("member name cannot be blank"));
        }
        if self.name_taken(name) {
            return Err(self.invalid(format!("member '{}' already defined", name)));
        }
        Ok(())
    }

    /// Add a field, returning where its value lives
    pub fn add_field(&mut self, definition: FieldDefinition) -> RuntimeResult<FieldLocation> {
        self.check_open()?;
        self.check_name(&definition.name)?;
        self.push_field(definition)
    }

    fn push_field(&mut self, definition: FieldDefinition) -> RuntimeResult<FieldLocation> {
        let location = if definition.is_static {
            let initial = match definition.initial_value {
                Some(value) => {
                    value.check_assignable(&definition.field_type)?;
                    value.coerce_to(&definition.field_type)
                }
                None => definition.field_type.default_value(),
            };
            let index = self.statics.push(initial);
            FieldLocation::Static(StaticSlot::new(self.statics.clone(), index))
        } else {
            if self.is_interface() {
                return Err(self.invalid("interfaces cannot declare instance fields"));
            }
            if definition.initial_value.is_some() {
                return Err(self.invalid(format!(
                    "initial value on instance field '{}'",
                    definition.name
                )));
            }
            let slot = self.inherited_slots.len() + self.own_slots.len();
            self.own_slots.push(definition.field_type.clone());
            FieldLocation::Instance(slot)
        };

        self.members.push(MemberDef::Field(Arc::new(FieldDef {
            declaring_type: self.id,
            name: definition.name,
            field_type: definition.field_type,
            visibility: definition.visibility,
            is_readonly: definition.is_readonly,
            is_auto_property_storage: definition.is_auto_property_storage,
            location: location.clone(),
        })));
        Ok(location)
    }

    fn find_sealed_override(&self, method: &MethodDef) -> Option<TypeHandle> {
        let mut current = self.parent.clone();
        while let Some(ty) = current {
            if ty
                .declared_methods()
                .any(|m| m.is_final && m.has_same_signature(method))
            {
                return Some(ty);
            }
            current = ty.parent().cloned();
        }
        None
    }

    /// Add a method
    pub fn add_method(&mut self, definition: MethodDefinition) -> RuntimeResult<Arc<MethodDef>> {
        self.check_open()?;
        if definition.name.trim().is_empty() {
            return Err(self.invalid("member name cannot be blank"));
        }
        if self.members.iter().any(|m| match m {
            MemberDef::Field(f) => f.name == definition.name,
            MemberDef::Property(p) => p.name == definition.name,
            MemberDef::Event(e) => e.name == definition.name,
            _ => false,
        }) {
            return Err(self.invalid(format!("member '{}' already defined", definition.name)));
        }

        let is_abstract = definition.body.is_abstract();
        if is_abstract && definition.is_static {
            return Err(self.invalid(format!("static method '{}' has no body", definition.name)));
        }

        let method = Arc::new(MethodDef {
            declaring_type: self.id,
            name: definition.name,
            return_type: definition.return_type,
            parameters: definition.parameters.iter().map(|p| p.to_def()).collect(),
            generic_parameters: definition.generic_parameters,
            visibility: definition.visibility,
            is_static: definition.is_static,
            is_virtual: !definition.is_static
                && (definition.is_virtual || is_abstract || self.is_interface()),
            is_abstract,
            is_final: definition.is_final,
            accessor: None,
            body: definition.body,
        });

        if self
            .members
            .iter()
            .any(|m| matches!(m, MemberDef::Method(other) if other.has_same_signature(&method)))
        {
            return Err(self.invalid(format!(
                "method '{}' already defined with the same signature",
                method.name
            )));
        }
        if method.is_virtual {
            if let Some(owner) = self.find_sealed_override(&method) {
                return Err(self.invalid(format!(
                    "cannot override sealed method '{}.{}'",
                    owner, method.name
                )));
            }
        }

        self.members.push(MemberDef::Method(method.clone()));
        Ok(method)
    }

    #[allow(clippy::too_many_arguments)]
    fn push_accessor(
        &mut self,
        name: String,
        role: AccessorRole,
        return_type: TypeHandle,
        parameters: Vec<ParameterDef>,
        definition: AccessorDefinition,
        is_static: bool,
        is_virtual: bool,
    ) -> Arc<MethodDef> {
        let is_abstract = definition.body.is_abstract();
        let method = Arc::new(MethodDef {
            declaring_type: self.id,
            name,
            return_type,
            parameters,
            generic_parameters: Vec::new(),
            visibility: definition.visibility,
            is_static,
            is_virtual: !is_static && (is_virtual || is_abstract || self.is_interface()),
            is_abstract,
            is_final: false,
            accessor: Some(role),
            body: definition.body,
        });
        self.members.push(MemberDef::Method(method.clone()));
        method
    }

    fn auto_accessors(
        &mut self,
        definition: &PropertyDefinition,
    ) -> RuntimeResult<(AccessorDefinition, AccessorDefinition)> {
        if self.is_interface() {
            return Err(self.invalid(format!(
                "auto property '{}' on an interface",
                definition.name
            )));
        }
        if !definition.index_parameters.is_empty() {
            return Err(self.invalid(format!("indexer '{}' cannot be auto", definition.name)));
        }

        let mut field = FieldDefinition::new(
            &backing_field_name(&definition.name),
            definition.property_type.clone(),
        )
        .with_visibility(Visibility::Private)
        .as_property_storage();
        field.is_static = definition.is_static;
        let location = self.push_field(field)?;

        let receiver = usize::from(!definition.is_static);

        let mut get = BodyBuilder::new(format!("get_{}", definition.name), receiver);
        if !definition.is_static {
            get.emit_load_arg(0)?;
        }
        get.emit_load_field(location.clone())?;
        get.emit_return()?;

        let mut set = BodyBuilder::new(format!("set_{}", definition.name), receiver + 1);
        if !definition.is_static {
            set.emit_load_arg(0)?;
        }
        set.emit_load_arg(receiver)?;
        set.emit_store_field(location)?;
        set.emit_return_void()?;

        Ok((
            AccessorDefinition::new(get.build_body()?).with_visibility(definition.visibility),
            AccessorDefinition::new(set.build_body()?).with_visibility(definition.visibility),
        ))
    }

    /// Add a property or indexer
    pub fn add_property(&mut self, definition: PropertyDefinition) -> RuntimeResult<Arc<PropertyDef>> {
        self.check_open()?;
        let index_types: Vec<TypeHandle> =
            definition.index_parameters.iter().map(|p| p.ty.clone()).collect();
        let overloads_indexer = !index_types.is_empty()
            && self.members.iter().all(|m| match m {
                MemberDef::Property(p) => {
                    p.name != definition.name
                        || (p.is_indexer() && p.index_parameter_types() != index_types)
                }
                MemberDef::Method(_) | MemberDef::Constructor(_) => true,
                other => other.name() != definition.name,
            });
        if !overloads_indexer {
            self.check_name(&definition.name)?;
        }

        let (getter, setter) = if definition.is_auto {
            let (get, set) = self.auto_accessors(&definition)?;
            (Some(get), Some(set))
        } else {
            (definition.getter.clone(), definition.setter.clone())
        };
        if getter.is_none() && setter.is_none() {
            return Err(self.invalid(format!("property '{}' has no accessors", definition.name)));
        }

        let index_params: Vec<ParameterDef> =
            definition.index_parameters.iter().map(|p| p.to_def()).collect();

        let getter = getter.map(|acc| {
            self.push_accessor(
                format!("get_{}", definition.name),
                AccessorRole::PropertyGet(definition.name.clone()),
                definition.property_type.clone(),
                index_params.clone(),
                acc,
                definition.is_static,
                definition.is_virtual,
            )
        });
        let setter = setter.map(|acc| {
            let mut params = index_params.clone();
            params.push(ParameterDef {
                name: "value".to_string(),
                ty: definition.property_type.clone(),
            });
            self.push_accessor(
                format!("set_{}", definition.name),
                AccessorRole::PropertySet(definition.name.clone()),
                types::void(),
                params,
                acc,
                definition.is_static,
                definition.is_virtual,
            )
        });

        let property = Arc::new(PropertyDef {
            declaring_type: self.id,
            name: definition.name,
            property_type: definition.property_type,
            index_parameters: index_params,
            getter,
            setter,
        });
        self.members.push(MemberDef::Property(property.clone()));
        Ok(property)
    }

    fn noop_accessor(&self, name: &str) -> RuntimeResult<AccessorDefinition> {
        if self.is_interface() {
            return Ok(AccessorDefinition::declared());
        }
        let mut body = BodyBuilder::new(name, 2);
        body.emit_return_void()?;
        Ok(AccessorDefinition::new(body.build_body()?))
    }

    /// Add an event
    pub fn add_event(&mut self, definition: EventDefinition) -> RuntimeResult<Arc<EventDef>> {
        self.check_open()?;
        self.check_name(&definition.name)?;

        let add_name = format!("add_{}", definition.name);
        let remove_name = format!("remove_{}", definition.name);
        let add = match definition.add {
            Some(acc) => acc,
            None => self.noop_accessor(&add_name)?,
        };
        let remove = match definition.remove {
            Some(acc) => acc,
            None => self.noop_accessor(&remove_name)?,
        };
        let params = vec![ParameterDef {
            name: "value".to_string(),
            ty: definition.handler_type.clone(),
        }];

        let add = self.push_accessor(
            add_name,
            AccessorRole::EventAdd(definition.name.clone()),
            types::void(),
            params.clone(),
            add,
            definition.is_static,
            definition.is_virtual,
        );
        let remove = self.push_accessor(
            remove_name,
            AccessorRole::EventRemove(definition.name.clone()),
            types::void(),
            params,
            remove,
            definition.is_static,
            definition.is_virtual,
        );

        let event = Arc::new(EventDef {
            declaring_type: self.id,
            name: definition.name,
            handler_type: definition.handler_type,
            add,
            remove,
        });
        self.members.push(MemberDef::Event(event.clone()));
        Ok(event)
    }

    /// Add a constructor or the type initializer
    pub fn add_constructor(
        &mut self,
        definition: ConstructorDefinition,
    ) -> RuntimeResult<Arc<ConstructorDef>> {
        self.check_open()?;
        if definition.body.is_abstract() {
            return Err(self.invalid("constructor has no body"));
        }
        if !definition.is_static && self.is_interface() {
            return Err(self.invalid("interfaces cannot declare instance constructors"));
        }
        if definition.is_static && !definition.parameters.is_empty() {
            return Err(self.invalid("type initializer cannot take parameters"));
        }

        let parameter_types: Vec<TypeHandle> =
            definition.parameters.iter().map(|p| p.ty.clone()).collect();
        let duplicate = self.declared_constructors().any(|c| {
            c.is_static == definition.is_static && c.parameter_types() == parameter_types
        });
        if duplicate {
            return Err(self.invalid("constructor already defined with the same signature"));
        }

        let constructor = Arc::new(ConstructorDef {
            declaring_type: self.id,
            parameters: definition.parameters.iter().map(|p| p.to_def()).collect(),
            visibility: definition.visibility,
            is_static: definition.is_static,
            body: definition.body,
        });
        self.members.push(MemberDef::Constructor(constructor.clone()));
        Ok(constructor)
    }

    fn declared_constructors(&self) -> impl Iterator<Item = &Arc<ConstructorDef>> + '_ {
        self.members.iter().filter_map(|m| match m {
            MemberDef::Constructor(c) => Some(c),
            _ => None,
        })
    }

    fn declared_methods(&self) -> impl Iterator<Item = &Arc<MethodDef>> + '_ {
        self.members.iter().filter_map(|m| match m {
            MemberDef::Method(m) => Some(m),
            _ => None,
        })
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    fn check_static_members(&self) -> RuntimeResult<()> {
        if !self.flags.is_static {
            return Ok(());
        }
        for member in &self.members {
            let is_instance = match member {
                MemberDef::Field(f) => !f.is_static(),
                MemberDef::Property(p) => !p.is_static(),
                MemberDef::Method(m) => !m.is_static,
                MemberDef::Constructor(c) => !c.is_static,
                MemberDef::Event(e) => !e.is_static(),
            };
            if is_instance {
                return Err(self.invalid(format!(
                    "static type declares instance member '{}'",
                    member.name()
                )));
            }
        }
        Ok(())
    }

    fn is_implemented(&self, required: &MethodDef) -> bool {
        let implements = |m: &Arc<MethodDef>| {
            !m.is_abstract && !m.is_static && m.has_same_signature(required)
        };
        if self.declared_methods().any(implements) {
            return true;
        }
        let mut current = self.parent.clone();
        while let Some(ty) = current {
            if ty.declared_methods().any(implements) {
                return true;
            }
            current = ty.parent().cloned();
        }
        false
    }

    fn check_implementations(&self) -> RuntimeResult<()> {
        if self.is_interface() || self.flags.is_abstract {
            return Ok(());
        }

        if let Some(own) = self.declared_methods().find(|m| m.is_abstract) {
            return Err(self.invalid(format!(
                "abstract member '{}' in non-abstract type",
                own.name
            )));
        }

        let mut sources: Vec<TypeHandle> = Vec::new();
        let mut current = self.parent.clone();
        while let Some(ty) = current {
            current = ty.parent().cloned();
            sources.push(ty);
        }
        let mut interfaces: Vec<TypeHandle> = Vec::new();
        for interface in &self.interfaces {
            if !interfaces.contains(interface) {
                interfaces.push(interface.clone());
            }
            for inherited in interface.all_interfaces() {
                if !interfaces.contains(&inherited) {
                    interfaces.push(inherited);
                }
            }
        }
        if let Some(parent) = &self.parent {
            for inherited in parent.all_interfaces() {
                if !interfaces.contains(&inherited) {
                    interfaces.push(inherited);
                }
            }
        }
        sources.extend(interfaces);

        for source in &sources {
            for required in source.declared_methods().filter(|m| m.is_abstract) {
                if !self.is_implemented(required) {
                    return Err(RuntimeError::MissingImplementation {
                        type_name: self.name.clone(),
                        member: format!("{}.{}", source.full_name(), required.name),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_constructor_chain(&self) -> RuntimeResult<()> {
        let parent = match &self.parent {
            Some(parent) => parent,
            None => return Ok(()),
        };
        if interpreter::has_parameterless_constructor(parent) {
            return Ok(());
        }

        let mut instance_ctors = self.declared_constructors().filter(|c| !c.is_static).peekable();
        if instance_ctors.peek().is_none() {
            return Err(self.invalid(format!(
                "base type '{}' has no parameterless constructor",
                parent
            )));
        }
        if instance_ctors.any(|c| c.body.needs_implicit_base_call()) {
            return Err(self.invalid(format!(
                "constructor must chain explicitly: base type '{}' has no parameterless constructor",
                parent
            )));
        }
        Ok(())
    }

    /// Validate and freeze the type
    pub fn build(&mut self) -> RuntimeResult<TypeHandle> {
        self.check_open()?;
        self.check_static_members()?;
        self.check_implementations()?;
        self.check_constructor_chain()?;

        let mut instance_slots = self.inherited_slots.clone();
        instance_slots.extend(self.own_slots.iter().cloned());

        let def = TypeDef {
            id: self.id,
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            kind: self.kind,
            flags: self.flags,
            parent: self.parent.clone(),
            interfaces: self.interfaces.clone(),
            generic_arguments: self.generic_arguments.clone(),
            members: std::mem::take(&mut self.members),
            instance_slots,
            origin: self.origin.clone(),
        };
        let handle = TypeHandle::from_def(def);
        self.finalized = true;

        if let Some(initializer) = handle.declared_constructors().find(|c| c.is_static) {
            interpreter::run_type_initializer(initializer)?;
        }

        tracing::debug!(
            type_name = %handle.full_name(),
            members = handle.declared_members().len(),
            slots = handle.instance_slot_count(),
            "built runtime type"
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_property_storage() {
        let mut builder = ClassBuilder::class("Person");
        let property = builder
            .add_property(PropertyDefinition::new("Name", types::string()).auto())
            .unwrap();
        let person = builder.build().unwrap();

        let backing = person.declared_fields().next().unwrap();
        assert_eq!(backing.name, "<Name>k__BackingField");
        assert!(backing.is_auto_property_storage);
        assert_eq!(backing.visibility, Visibility::Private);

        let instance = interpreter::construct(&person, &[]).unwrap();
        let setter = property.setter.clone().unwrap();
        let getter = property.getter.clone().unwrap();
        interpreter::invoke(&setter, Some(&instance), &[Value::string("Ada")]).unwrap();
        assert_eq!(
            interpreter::invoke(&getter, Some(&instance), &[]).unwrap(),
            Value::string("Ada")
        );
    }

    #[test]
    fn test_instance_slots_follow_parent() {
        let mut base = ClassBuilder::class("Base");
        base.add_field(FieldDefinition::new("a", types::int32())).unwrap();
        let base = base.build().unwrap();

        let mut derived = ClassBuilder::class("Derived");
        derived.set_parent(base.clone()).unwrap();
        let location = derived
            .add_field(FieldDefinition::new("b", types::int32()))
            .unwrap();
        let derived = derived.build().unwrap();

        assert!(matches!(location, FieldLocation::Instance(1)));
        assert_eq!(derived.instance_slot_count(), 2);
    }

    #[test]
    fn test_parent_after_fields_rejected() {
        let base = ClassBuilder::class("Base").build().unwrap();
        let mut derived = ClassBuilder::class("Derived");
        derived.add_field(FieldDefinition::new("b", types::int32())).unwrap();
        assert!(derived.set_parent(base).is_err());
    }

    #[test]
    fn test_sealed_parent_rejected() {
        let mut sealed = ClassBuilder::class("Sealed");
        sealed.set_sealed();
        let sealed = sealed.build().unwrap();
        let mut derived = ClassBuilder::class("Derived");
        assert!(derived.set_parent(sealed).is_err());
        assert!(derived.set_parent(types::string()).is_err());
    }

    #[test]
    fn test_duplicate_members_rejected() {
        let mut builder = ClassBuilder::class("Dup");
        builder.add_field(FieldDefinition::new("x", types::int32())).unwrap();
        assert!(builder.add_field(FieldDefinition::new("x", types::int32())).is_err());
        assert!(builder
            .add_property(PropertyDefinition::new("x", types::int32()).auto())
            .is_err());

        builder
            .add_method(MethodDefinition::new("Run").native(|_| Ok(Value::Null)))
            .unwrap();
        builder
            .add_method(
                MethodDefinition::new("Run")
                    .with_param("n", types::int32())
                    .native(|_| Ok(Value::Null)),
            )
            .unwrap();
        assert!(builder
            .add_method(MethodDefinition::new("Run").native(|_| Ok(Value::Null)))
            .is_err());
    }

    #[test]
    fn test_indexer_overloads() {
        let mut builder = ClassBuilder::class("Table");
        builder
            .add_property(
                PropertyDefinition::new("Item", types::string())
                    .with_index_param("i", types::int32())
                    .with_getter(AccessorDefinition::native(|_| Ok(Value::Null))),
            )
            .unwrap();
        builder
            .add_property(
                PropertyDefinition::new("Item", types::string())
                    .with_index_param("key", types::string())
                    .with_getter(AccessorDefinition::native(|_| Ok(Value::Null))),
            )
            .unwrap();
        let table = builder.build().unwrap();
        assert_eq!(table.declared_properties().count(), 2);
    }

    #[test]
    fn test_missing_interface_implementation() {
        let mut shape = ClassBuilder::interface("IShape");
        shape
            .add_method(MethodDefinition::new("Area").returns(types::float64()))
            .unwrap();
        let shape = shape.build().unwrap();

        let mut square = ClassBuilder::class("Square");
        square.add_interface(shape.clone()).unwrap();
        let err = square.build().unwrap_err();
        assert_eq!(
            err,
            RuntimeError::MissingImplementation {
                type_name: "Square".to_string(),
                member: "IShape.Area".to_string(),
            }
        );

        let mut square = ClassBuilder::class("Square");
        square.add_interface(shape).unwrap();
        square
            .add_method(
                MethodDefinition::new("Area")
                    .returns(types::float64())
                    .native(|_| Ok(Value::f64(4.0))),
            )
            .unwrap();
        assert!(square.build().is_ok());
    }

    #[test]
    fn test_abstract_member_in_concrete_class_rejected() {
        let mut builder = ClassBuilder::class("Concrete");
        builder.add_method(MethodDefinition::new("Run")).unwrap();
        assert!(matches!(
            builder.build(),
            Err(RuntimeError::InvalidDefinition(_))
        ));

        let mut builder = ClassBuilder::class("Base");
        builder.set_abstract();
        builder.add_method(MethodDefinition::new("Run")).unwrap();
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_constructor_chain_validation() {
        let mut base = ClassBuilder::class("Base");
        base.add_constructor(ConstructorDefinition::new().with_param("id", types::int32()))
            .unwrap();
        let base = base.build().unwrap();

        let mut derived = ClassBuilder::class("Derived");
        derived.set_parent(base).unwrap();
        assert!(derived.build().is_err());
    }

    #[test]
    fn test_static_type_rejects_instance_members() {
        let mut builder = ClassBuilder::class("Util");
        builder.set_static();
        builder
            .add_method(MethodDefinition::new("Run").native(|_| Ok(Value::Null)))
            .unwrap();
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_static_field_initial_value_and_initializer() {
        let mut builder = ClassBuilder::class("Counter");
        let location = builder
            .add_field(
                FieldDefinition::new("Count", types::int32())
                    .as_static()
                    .initial_value(Value::i32(5)),
            )
            .unwrap();
        let seen = location.clone();
        builder
            .add_constructor(ConstructorDefinition::new().as_static().native(move |ctx| {
                let current = ctx.load(&seen)?.as_i32().unwrap_or_default();
                ctx.store(&seen, Value::i32(current + 1))?;
                Ok(Value::Null)
            }))
            .unwrap();
        builder.build().unwrap();

        match location {
            FieldLocation::Static(cell) => assert_eq!(cell.load(), Value::i32(6)),
            FieldLocation::Instance(_) => panic!("expected static storage"),
        }
    }

    #[test]
    fn test_build_twice_rejected() {
        let mut builder = ClassBuilder::class("Once");
        builder.build().unwrap();
        assert!(matches!(builder.build(), Err(RuntimeError::Finalized(_))));
        assert!(builder
            .add_field(FieldDefinition::new("x", types::int32()))
            .is_err());
    }

    #[test]
    fn test_interface_event_accessors_are_abstract() {
        let mut builder = ClassBuilder::interface("INotify");
        let event = builder
            .add_event(EventDefinition::new("Changed", types::event_handler()))
            .unwrap();
        assert!(event.add.is_abstract);
        assert!(event.remove.is_abstract);
        assert_eq!(event.add.name, "add_Changed");
    }
}
