// Copyright 2025 Cowboy AI, LLC.

//! End-to-end mapping scenarios

mod common;

use chrono::NaiveDate;
use common::{mapper_with, object_field, person};
use graph_mapper::{
    ClassMap, ConverterRegistration, DateFormatConverter, FieldMap, Object, ObjectRef, TypeRef, Value,
};
use pretty_assertions::assert_eq;

#[test]
fn explicit_field_only_leaves_other_fields_unset() {
    let mapper = mapper_with(vec![ClassMap::new("Person", "PersonSummary")
        .wildcard(false)
        .field_same("age")]);

    let source = Value::from(Object::new("Person").with("name", "Ann").with("age", 30));
    let summary = mapper.map_to_class(&source, "PersonSummary").unwrap();

    assert_eq!(summary.get("age"), Value::Int(30));
    assert_eq!(summary.get("name"), Value::Null);
}

#[test]
fn implicit_matching_fills_same_named_fields_by_default() {
    let mapper = mapper_with(vec![ClassMap::new("Person", "PersonSummary").field_same("age")]);

    let source = Value::from(Object::new("Person").with("name", "Ann").with("age", 30));
    let summary = mapper.map_to_class(&source, "PersonSummary").unwrap();

    assert_eq!(summary.get("age"), Value::Int(30));
    assert_eq!(summary.get("name"), Value::from("Ann"));
}

#[test]
fn registered_converter_formats_dates() {
    let mapper = common::builder_with(vec![])
        .converter(ConverterRegistration::new(
            TypeRef::Date,
            TypeRef::String,
            DateFormatConverter::new("%Y-%m-%d"),
        ))
        .build()
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let source = Value::from(Object::new("Event").with("date", date));
    let view = mapper.map_to_class(&source, "EventView").unwrap();

    assert_eq!(view.get("date"), Value::from("2020-01-01"));
}

#[test]
fn list_maps_into_set_element_wise() {
    let mapper = mapper_with(vec![]);
    let source = Value::List(vec!["a".into(), "b".into(), "c".into()]);

    let mapped = mapper.map(&source, &TypeRef::set(TypeRef::String), None).unwrap();
    assert_eq!(mapped, Value::set_of(vec!["a".into(), "b".into(), "c".into()]));

    let duplicated = Value::List(vec!["a".into(), "b".into(), "a".into()]);
    let collapsed = mapper.map(&duplicated, &TypeRef::set(TypeRef::String), None).unwrap();
    assert_eq!(collapsed.as_elements().map(<[Value]>::len), Some(2));
}

#[test]
fn self_referencing_node_maps_to_self_referencing_destination() {
    let mapper = mapper_with(vec![]);
    let node = ObjectRef::new(Object::new("Node").with("name", "n"));
    node.set("next", node.clone());

    let mapped = mapper.map_to_class(&Value::Object(node), "NodeDto").unwrap();

    assert_eq!(mapped.class(), "NodeDto");
    assert!(object_field(&mapped, "next").ptr_eq(&mapped));
    assert_eq!(mapped.get("name"), Value::from("n"));
}

#[test]
fn nested_objects_collections_and_scalars_map_implicitly() {
    let mapper = mapper_with(vec![
        ClassMap::new("Person", "PersonDto").field(FieldMap::new("name", "fullName")),
        ClassMap::new("Address", "AddressDto"),
    ]);
    let source = person("Ann", 30);
    source.set("favorite", Value::enum_variant("Color", "Green"));

    let dto = mapper.map_to_class(&Value::Object(source), "PersonDto").unwrap();

    assert_eq!(dto.get("fullName"), Value::from("Ann"));
    assert_eq!(dto.get("age"), Value::from("30"));
    assert_eq!(dto.get("favorite"), Value::from("Green"));
    assert_eq!(dto.get("tags"), Value::set_of(vec!["a".into(), "b".into()]));

    let address = object_field(&dto, "address");
    assert_eq!(address.class(), "AddressDto");
    assert_eq!(address.get("city"), Value::from("Oslo"));
}

#[test]
fn map_into_populates_the_given_instance() {
    let mapper = mapper_with(vec![ClassMap::new("Person", "PersonSummary")]);
    let destination = ObjectRef::new(Object::new("PersonSummary").with("name", "old"));

    mapper
        .map_into(&Value::Object(person("Ann", 30)), &destination, None)
        .unwrap();

    assert_eq!(destination.get("name"), Value::from("Ann"));
    assert_eq!(destination.get("age"), Value::Int(30));
}

#[test]
fn scoped_class_map_is_selected_by_scope() {
    let mapper = mapper_with(vec![
        ClassMap::new("Person", "PersonSummary"),
        ClassMap::new("Person", "PersonSummary")
            .scope("age-only")
            .wildcard(false)
            .field_same("age"),
    ]);
    let source = Value::Object(person("Ann", 30));

    let full = mapper.map(&source, &TypeRef::class("PersonSummary"), None).unwrap();
    let scoped = mapper
        .map(&source, &TypeRef::class("PersonSummary"), Some("age-only"))
        .unwrap();

    assert_eq!(full.as_object().unwrap().get("name"), Value::from("Ann"));
    assert_eq!(scoped.as_object().unwrap().get("name"), Value::Null);
    assert_eq!(scoped.as_object().unwrap().get("age"), Value::Int(30));

    let missing = mapper.map(&source, &TypeRef::class("PersonSummary"), Some("nope"));
    assert!(missing.unwrap_err().is_configuration());
}

#[test]
fn report_counts_objects_and_carries_call_id() {
    let mapper = mapper_with(vec![ClassMap::new("Address", "AddressDto")]);
    let report = mapper
        .map_with_report(&Value::Object(person("Ann", 30)), &TypeRef::class("PersonDto"), None)
        .unwrap();

    // the person and its address
    assert_eq!(report.objects_mapped, 2);
    assert!(report.listener_failures.is_empty());
    assert!(!report.call_id.is_nil());
}

#[test]
fn object_flattens_into_map_and_back() {
    let mapper = mapper_with(vec![]);
    let address = Value::from(Object::new("Address").with("street", "Main St 1").with("city", "Oslo"));

    let flattened = mapper
        .map(&address, &TypeRef::map(TypeRef::String, TypeRef::String), None)
        .unwrap();
    assert_eq!(flattened.map_get(&"city".into()), Some(&Value::from("Oslo")));

    let rebuilt = mapper.map_to_class(&flattened, "AddressDto").unwrap();
    assert_eq!(rebuilt.get("street"), Value::from("Main St 1"));
}

#[test]
fn json_maps_onto_objects() {
    let mapper = mapper_with(vec![]);
    let json = serde_json::json!({"name": "Ann", "age": "41", "unknown": true});

    let summary = mapper
        .map_to_class(&Value::from_json(&json), "PersonSummary")
        .unwrap();

    assert_eq!(summary.get("name"), Value::from("Ann"));
    assert_eq!(summary.get("age"), Value::Int(41));
    assert_eq!(Value::Object(summary).to_json()["$type"], serde_json::json!("PersonSummary"));
}
