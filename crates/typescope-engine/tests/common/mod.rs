//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use typescope_runtime::{
    interpreter, types, AccessorDefinition, ClassBuilder, ConstructorDefinition, EventDefinition,
    FieldDefinition, MethodDefinition, PropertyDefinition, TypeHandle, Value, Visibility,
};

/// `Demo.IPerson { int Id { get; set; } string Greet(); event EventHandler OnChanged; }`
pub fn person_interface() -> TypeHandle {
    let mut builder = ClassBuilder::interface("IPerson");
    builder.set_namespace("Demo");
    builder
        .add_property(
            PropertyDefinition::new("Id", types::int32())
                .with_getter(AccessorDefinition::declared())
                .with_setter(AccessorDefinition::declared()),
        )
        .unwrap();
    builder
        .add_method(
            MethodDefinition::new("Greet")
                .returns(types::string())
                .as_abstract(),
        )
        .unwrap();
    builder
        .add_event(EventDefinition::new("OnChanged", types::event_handler()))
        .unwrap();
    builder.build().unwrap()
}

/// `Animal` with `Name`, `Legs`, virtual `Speak()`, and `Dog : Animal`
/// shadowing `Speak()` and adding `Bark(int)`
pub fn animal_hierarchy() -> (TypeHandle, TypeHandle) {
    let mut animal = ClassBuilder::class("Animal");
    animal.set_namespace("Zoo");
    animal
        .add_field(FieldDefinition::new("Legs", types::int32()))
        .unwrap();
    animal
        .add_property(PropertyDefinition::new("Name", types::string()).auto())
        .unwrap();
    animal
        .add_method(
            MethodDefinition::new("Speak")
                .returns(types::string())
                .as_virtual()
                .native(|_| Ok(Value::string("..."))),
        )
        .unwrap();
    animal
        .add_method(
            MethodDefinition::new("Count")
                .returns(types::int32())
                .as_static()
                .native(|_| Ok(Value::i32(0))),
        )
        .unwrap();
    let animal = animal.build().unwrap();

    let mut dog = ClassBuilder::class("Dog");
    dog.set_namespace("Zoo");
    dog.set_parent(animal.clone()).unwrap();
    dog.add_method(
        MethodDefinition::new("Speak")
            .returns(types::string())
            .as_virtual()
            .native(|_| Ok(Value::string("woof"))),
    )
    .unwrap();
    dog.add_method(
        MethodDefinition::new("Bark")
            .with_param("times", types::int32())
            .native(|_| Ok(Value::Null)),
    )
    .unwrap();
    dog.add_method(
        MethodDefinition::new("Fetch")
            .with_generic_param("T")
            .returns(types::generic_parameter("T"))
            .with_param("item", types::generic_parameter("T"))
            .native(|ctx| Ok(ctx.arg(0)?.clone())),
    )
    .unwrap();
    dog.add_method(
        MethodDefinition::new("Sleep")
            .with_visibility(Visibility::Private)
            .native(|_| Ok(Value::Null)),
    )
    .unwrap();
    (animal, dog.build().unwrap())
}

/// `Account` with a private `_balance` field behind a hand-written `Balance` property
pub fn account() -> TypeHandle {
    let mut builder = ClassBuilder::class("Account");
    let balance = builder
        .add_field(
            FieldDefinition::new("_balance", types::int64()).with_visibility(Visibility::Private),
        )
        .unwrap();
    let read = balance.clone();
    builder
        .add_property(
            PropertyDefinition::new("Balance", types::int64())
                .with_getter(AccessorDefinition::native(move |ctx| ctx.load(&read)))
                .with_setter(AccessorDefinition::native(move |ctx| {
                    ctx.store(&balance, ctx.arg(0)?.clone())?;
                    Ok(Value::Null)
                })),
        )
        .unwrap();
    builder
        .add_field(FieldDefinition::new("_owner", types::string()))
        .unwrap();
    builder.build().unwrap()
}

/// Abstract `Store` with a `(string)` constructor, abstract `Load(int)`,
/// abstract `Capacity` getter and a protected virtual helper
pub fn abstract_store() -> TypeHandle {
    let mut builder = ClassBuilder::class("Store");
    builder.set_namespace("Data");
    builder.set_abstract();
    let name = builder
        .add_field(FieldDefinition::new("name", types::string()).with_visibility(Visibility::Protected))
        .unwrap();
    builder
        .add_constructor(
            ConstructorDefinition::new()
                .with_param("name", types::string())
                .native(move |ctx| {
                    ctx.store(&name, ctx.arg(0)?.clone())?;
                    Ok(Value::Null)
                }),
        )
        .unwrap();
    builder
        .add_method(
            MethodDefinition::new("Load")
                .returns(types::string())
                .with_param("key", types::int32())
                .as_abstract(),
        )
        .unwrap();
    builder
        .add_property(
            PropertyDefinition::new("Capacity", types::int32())
                .as_virtual()
                .with_getter(AccessorDefinition::declared()),
        )
        .unwrap();
    builder
        .add_method(
            MethodDefinition::new("Log")
                .with_visibility(Visibility::Protected)
                .as_virtual()
                .native(|_| Ok(Value::Null)),
        )
        .unwrap();
    builder
        .add_method(
            MethodDefinition::new("Describe")
                .returns(types::string())
                .native(|_| Ok(Value::string("store"))),
        )
        .unwrap();
    builder.build().unwrap()
}

/// A sealed class
pub fn sealed_class() -> TypeHandle {
    let mut builder = ClassBuilder::class("Final");
    builder.set_namespace("Demo");
    builder.set_sealed();
    builder.build().unwrap()
}

/// A static class
pub fn static_class() -> TypeHandle {
    let mut builder = ClassBuilder::class("Helpers");
    builder.set_namespace("Demo");
    builder.set_static();
    builder.build().unwrap()
}

/// Route engine diagnostics to the test writer, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// New instance through the parameterless constructor
pub fn new_instance(ty: &TypeHandle) -> Value {
    Value::Object(interpreter::construct(ty, &[]).unwrap())
}
