//! Integration tests for the member query facades

mod common;

use typescope_engine::{MemberDescriptor, MemberQueries, NameComparison, ReflectError, SignatureOptions};
use typescope_runtime::{types, MemberKind, Value};

#[test]
fn test_filtering_never_adds_members() {
    let (_, dog) = common::animal_hierarchy();
    let all = dog.members().all();
    let filtered = dog.members().all_where(|_| true);
    assert!(filtered.len() <= all.len());
    for member in &filtered {
        assert!(all.contains(member));
    }
    let public = dog.methods().all_where(|o| o.is_public);
    assert!(public.len() <= dog.methods().all().len());
}

#[test]
fn test_unfiltered_queries_keep_shadowed_members() {
    let (animal, dog) = common::animal_hierarchy();
    let speaks: Vec<_> = dog
        .methods()
        .all()
        .into_iter()
        .filter(|m| m.name() == "Speak")
        .collect();
    assert_eq!(speaks.len(), 2);
    assert_eq!(speaks[0].declaring_type(), &dog);
    assert_eq!(speaks[1].declaring_type(), &animal);
}

#[test]
fn test_filtered_queries_collapse_shadowed_members() {
    let (_, dog) = common::animal_hierarchy();
    let speak = dog.methods().named("Speak").unwrap();
    assert_eq!(speak.declaring_type(), &dog);

    let speaks = dog.methods().all_where(|o| o.name == "Speak");
    assert_eq!(speaks.len(), 1);
    assert_eq!(speaks[0].declaring_type(), &dog);
}

#[test]
fn test_hidden_member_stays_hidden_under_a_filter() {
    use typescope_runtime::{ClassBuilder, MethodDefinition, Visibility};

    let mut base = ClassBuilder::class("Base");
    base.add_method(MethodDefinition::new("M").native(|_| Ok(Value::Null)))
        .unwrap();
    let base = base.build().unwrap();

    let mut derived = ClassBuilder::class("Derived");
    derived.set_parent(base).unwrap();
    derived
        .add_method(
            MethodDefinition::new("M")
                .with_visibility(Visibility::Private)
                .native(|_| Ok(Value::Null)),
        )
        .unwrap();
    let derived = derived.build().unwrap();

    let visible = derived.methods().all_where(|_| true);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].declaring_type(), &derived);

    assert!(derived
        .methods()
        .all_where(|o| o.is_public && o.name == "M")
        .is_empty());
    assert!(derived
        .methods()
        .named_or_none_where("M", |o| o.is_public)
        .unwrap()
        .is_none());
}

#[test]
fn test_single_matches_all_where_count() {
    let (_, dog) = common::animal_hierarchy();
    let predicates: Vec<Box<dyn Fn(&typescope_engine::query::MethodOptions) -> bool>> = vec![
        Box::new(|o| o.is_static),
        Box::new(|o| o.name == "Bark"),
        Box::new(|o| o.is_public),
        Box::new(|o| o.name == "Missing"),
    ];
    for predicate in &predicates {
        let count = dog.methods().all_where(|o| predicate(o)).len();
        let single = dog.methods().single_where(|o| predicate(o));
        assert_eq!(single.is_ok(), count == 1);
    }
}

#[test]
fn test_cardinality_errors() {
    let (_, dog) = common::animal_hierarchy();
    let err = dog.methods().named("Missing").unwrap_err();
    assert_eq!(
        err,
        ReflectError::Cardinality {
            kind: "method",
            target: "named 'Missing' on 'Zoo.Dog'".to_string(),
            found: 0,
        }
    );
    assert_eq!(
        err.to_string(),
        "Expected exactly one method named 'Missing' on 'Zoo.Dog', found 0"
    );

    assert!(dog.methods().named_or_none("Missing").unwrap().is_none());
    assert!(matches!(
        dog.methods().single_or_none_where(|o| o.is_public),
        Err(ReflectError::Cardinality { .. })
    ));
}

#[test]
fn test_blank_names_rejected() {
    let (_, dog) = common::animal_hierarchy();
    assert!(matches!(
        dog.fields().named("  "),
        Err(ReflectError::InvalidArgument(_))
    ));
    assert!(matches!(
        dog.events().all_named(""),
        Err(ReflectError::InvalidArgument(_))
    ));
}

#[test]
fn test_name_matching_is_ordinal() {
    let (_, dog) = common::animal_hierarchy();
    assert!(dog.methods().named_or_none("speak").unwrap().is_none());
    assert!(dog.properties_or_fields().named_or_none("name").unwrap().is_none());

    let name = dog
        .properties_or_fields()
        .with_name_comparison(NameComparison::OrdinalIgnoreCase)
        .named("name")
        .unwrap();
    assert_eq!(name.name(), "Name");
}

#[test]
fn test_event_names_ignore_case_on_request() {
    let person = common::person_interface();
    assert!(person.events().named_or_none("onchanged").unwrap().is_none());
    let event = person
        .events()
        .with_name_comparison(NameComparison::OrdinalIgnoreCase)
        .named("onchanged")
        .unwrap();
    assert_eq!(event.name(), "OnChanged");
    assert_eq!(event.handler_type(), &types::event_handler());
}

#[test]
fn test_method_signature_options() {
    let (_, dog) = common::animal_hierarchy();
    let bark = dog
        .methods()
        .single_where(|o| o.has_parameters(&[types::int32()]))
        .unwrap();
    assert_eq!(bark.name(), "Bark");

    let speak = dog
        .methods()
        .named_where("Speak", |o| o.has_no_parameter())
        .unwrap();
    assert!(speak.is_virtual());

    let generic = dog.methods().single_where(|o| o.is_generic()).unwrap();
    assert_eq!(generic.name(), "Fetch");
    assert!(dog
        .methods()
        .single_where(|o| o.has_generic_parameter_count(1) && o.has_parameter_count(1))
        .is_ok());
}

#[test]
fn test_accessors_are_special_names() {
    let (animal, _) = common::animal_hierarchy();
    let accessors = animal.methods().all_where(|o| o.is_special_name);
    let names: Vec<&str> = accessors.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["get_Name", "set_Name"]);
}

#[test]
fn test_visibility_filters() {
    let (_, dog) = common::animal_hierarchy();
    let private = dog.methods().single_where(|o| !o.is_public).unwrap();
    assert_eq!(private.name(), "Sleep");

    let statics = dog.methods().all_where(|o| o.is_static);
    assert_eq!(statics.len(), 1);
    assert_eq!(statics[0].name(), "Count");
}

#[test]
fn test_constructors_are_not_inherited() {
    let store = common::abstract_store();
    let ctor = store.constructors().single().unwrap();
    assert_eq!(ctor.parameter_types(), vec![types::string()]);

    let (_, dog) = common::animal_hierarchy();
    assert!(dog.constructors().all().is_empty());
    assert!(dog.constructors().single_or_none().unwrap().is_none());
}

#[test]
fn test_all_members_classification() {
    let person = common::person_interface();
    let members = person.members().all();
    let kinds: Vec<MemberKind> = members.iter().map(MemberDescriptor::kind).collect();
    assert_eq!(
        kinds,
        vec![
            MemberKind::Method,
            MemberKind::Method,
            MemberKind::Property,
            MemberKind::Method,
            MemberKind::Method,
            MemberKind::Method,
            MemberKind::Event,
        ]
    );

    let properties = person.members().all_where(|o| o.is_property);
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].name(), "Id");
    let events = person.members().all_where(|o| o.is_event);
    assert_eq!(events[0].name(), "OnChanged");
}

#[test]
fn test_interface_members_include_extended_interfaces() {
    use typescope_runtime::{ClassBuilder, MethodDefinition};

    let base = common::person_interface();
    let mut employee = ClassBuilder::interface("IEmployee");
    employee.add_interface(base).unwrap();
    employee
        .add_method(MethodDefinition::new("Work").as_abstract())
        .unwrap();
    let employee = employee.build().unwrap();

    assert!(employee.methods().named("Work").is_ok());
    assert!(employee.methods().named("Greet").is_ok());
    assert!(employee.properties().named("Id").is_ok());
}
