//! Integration tests for the unified accessor, backing-field conventions and configuration

mod common;

use std::io::Write;

use typescope_engine::{
    BackingFieldConventions, BackingFieldResolver, ConfigError, MemberDescriptor, MemberQueries,
    PropertyOrField, ReflectConfig, ReflectError,
};
use typescope_runtime::{
    types, AccessorDefinition, ClassBuilder, FieldDefinition, PropertyDefinition, Value,
};

#[test]
fn test_round_trip_on_fields_and_properties() {
    let (_, dog) = common::animal_hierarchy();
    let instance = common::new_instance(&dog);

    let cases = [
        ("Legs", Value::i32(4)),
        ("Name", Value::string("Rex")),
    ];
    for (name, value) in cases {
        let member = dog.properties_or_fields().named(name).unwrap();
        assert!(member.can_read() && member.can_write());
        member.set_value(&instance, value.clone()).unwrap();
        assert_eq!(member.get_value(&instance).unwrap(), value);
        assert_eq!(member.try_get_value(&instance), Some(value));
    }
}

#[test]
fn test_write_only_property() {
    let mut builder = ClassBuilder::class("Logger");
    let last = builder
        .add_field(FieldDefinition::new("last", types::string()))
        .unwrap();
    builder
        .add_property(
            PropertyDefinition::new("Message", types::string()).with_setter(
                AccessorDefinition::native(move |ctx| {
                    ctx.store(&last, ctx.arg(0)?.clone())?;
                    Ok(Value::Null)
                }),
            ),
        )
        .unwrap();
    let logger = builder.build().unwrap();
    let instance = common::new_instance(&logger);

    let message = logger.properties_or_fields().named("Message").unwrap();
    assert!(!message.can_read());
    assert!(message.can_write());
    assert_eq!(
        message.get_value(&instance).unwrap_err(),
        ReflectError::InvalidOperation("using get on a write-only property 'Message'".to_string())
    );
    assert!(message.try_get_value(&instance).is_none());

    message.set_value(&instance, Value::string("hello")).unwrap();
    let last = logger.properties_or_fields().named("last").unwrap();
    assert_eq!(last.get_value(&instance).unwrap(), Value::string("hello"));
}

#[test]
fn test_static_members_take_null_receiver() {
    let mut builder = ClassBuilder::class("Settings");
    builder
        .add_field(
            FieldDefinition::new("Retries", types::int32())
                .as_static()
                .initial_value(Value::i32(3)),
        )
        .unwrap();
    builder
        .add_property(PropertyDefinition::new("Verbose", types::boolean()).auto().as_static())
        .unwrap();
    let settings = builder.build().unwrap();

    let retries = settings.properties_or_fields().named("Retries").unwrap();
    assert!(retries.is_static());
    assert_eq!(retries.get_value(&Value::Null).unwrap(), Value::i32(3));

    let verbose = settings.properties_or_fields().named("Verbose").unwrap();
    assert!(verbose.try_set_value(&Value::Null, Value::bool(true)));
    assert_eq!(verbose.get_value(&Value::Null).unwrap(), Value::bool(true));

    assert!(matches!(
        retries.get_value(&Value::i32(1)),
        Err(ReflectError::InvalidArgument(_))
    ));
}

#[test]
fn test_views_compare_by_member() {
    let (_, dog) = common::animal_hierarchy();
    let a = dog.properties_or_fields().named("Name").unwrap();
    let b = PropertyOrField::new(MemberDescriptor::Property(dog.properties().named("Name").unwrap()))
        .unwrap();
    assert_eq!(a, b);
    assert_ne!(a, dog.properties_or_fields().named("Legs").unwrap());
}

#[test]
fn test_backing_field_default_convention() {
    let account = common::account();
    let balance = account.properties_or_fields().named("_balance").unwrap();
    assert!(balance.is_backing_field());

    let owner = account.properties_or_fields().named("_owner").unwrap();
    assert!(!owner.is_backing_field());

    let property = account.properties_or_fields().named("Balance").unwrap();
    assert!(!property.is_backing_field());
}

#[test]
fn test_backing_field_needs_a_property_on_its_own_type() {
    let mut base = ClassBuilder::class("Sensor");
    base.add_property(
        PropertyDefinition::new("Reading", types::int32())
            .with_getter(AccessorDefinition::native(|_| Ok(Value::i32(0)))),
    )
    .unwrap();
    let base = base.build().unwrap();

    let mut derived = ClassBuilder::class("Thermometer");
    derived.set_parent(base).unwrap();
    derived
        .add_field(FieldDefinition::new("_reading", types::int32()))
        .unwrap();
    let derived = derived.build().unwrap();

    let field = derived.fields().named("_reading").unwrap();
    assert!(!BackingFieldResolver::default().is_backing_field(&field));
    assert!(!PropertyOrField::from(field).is_backing_field());
}

#[test]
fn test_backing_field_custom_conventions() {
    let mut builder = ClassBuilder::class("Gauge");
    builder
        .add_field(FieldDefinition::new("m_level", types::int32()))
        .unwrap();
    builder
        .add_property(
            PropertyDefinition::new("Level", types::int32())
                .with_getter(AccessorDefinition::native(|_| Ok(Value::i32(0)))),
        )
        .unwrap();
    let gauge = builder.build().unwrap();
    let field = gauge.properties_or_fields().named("m_level").unwrap();

    assert!(!field.is_backing_field());
    let mut conventions = BackingFieldConventions::default();
    conventions.add("m_", "");
    assert!(field.is_backing_field_with(&conventions));

    let mut resolver = BackingFieldResolver::default();
    resolver.conventions_mut().add("m_", "");
    let level = gauge.properties().named("Level").unwrap();
    let backing = resolver.backing_field_of(&level).unwrap();
    assert_eq!(backing.name(), "m_level");
}

#[test]
fn test_resolver_prefers_auto_storage() {
    let (animal, _) = common::animal_hierarchy();
    let name = animal.properties().named("Name").unwrap();
    assert!(name.is_auto_property());

    let storage = BackingFieldResolver::default().backing_field_of(&name).unwrap();
    assert!(storage.is_auto_property_storage());
    assert_eq!(storage.name(), typescope_runtime::backing_field_name("Name"));
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "backing_fields": [{{"prefix": "_"}}, {{"prefix": "m_"}}],
            "generated_type": {{"assembly_name": "Stubs", "type_name": "PersonStub"}}
        }}"#
    )
    .unwrap();

    let config = ReflectConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.backing_fields.len(), 2);
    assert_eq!(config.generated_type.assembly_name, "Stubs");
    assert_eq!(config.generated_type.module_name, "DynamicModule");
    assert_eq!(config.generated_type.type_name, "PersonStub");
    assert!(config.resolver().conventions().matches("m_level", "Level"));
}

#[test]
fn test_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ReflectConfig::load_from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
