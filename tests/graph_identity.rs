// Copyright 2025 Cowboy AI, LLC.

//! Identity preservation and cycle handling

mod common;

use common::{mapper_with, object_field, person};
use graph_mapper::{ClassMap, FieldMap, Object, ObjectRef, TypeRef, Value};
use pretty_assertions::assert_eq;

fn node(name: &str) -> ObjectRef {
    ObjectRef::new(Object::new("Node").with("name", name))
}

fn elements(object: &ObjectRef, field: &str) -> Vec<ObjectRef> {
    object
        .get(field)
        .as_elements()
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
}

#[test]
fn shared_reference_maps_to_one_destination() {
    let mapper = mapper_with(vec![ClassMap::new("Person", "PersonDto").field(FieldMap::new("name", "fullName"))]);
    let friend = person("Bob", 40);
    let ann = person("Ann", 30);
    ann.set("friends", vec![Value::from(friend.clone()), Value::from(friend)]);

    let dto = mapper.map_to_class(&Value::Object(ann), "PersonDto").unwrap();
    let friends = elements(&dto, "friends");

    assert_eq!(friends.len(), 2);
    assert!(friends[0].ptr_eq(&friends[1]));
    assert_eq!(friends[0].get("fullName"), Value::from("Bob"));
}

#[test]
fn mutual_references_close_the_cycle() {
    let mapper = mapper_with(vec![]);
    let ann = person("Ann", 30);
    let bob = person("Bob", 40);
    ann.set("friends", vec![Value::from(bob.clone())]);
    bob.set("friends", vec![Value::from(ann.clone())]);

    let dto = mapper.map_to_class(&Value::Object(ann), "PersonDto").unwrap();
    let bob_dto = elements(&dto, "friends").remove(0);
    let back = elements(&bob_dto, "friends").remove(0);

    assert!(back.ptr_eq(&dto));
    assert!(!bob_dto.ptr_eq(&dto));
}

#[test]
fn longer_cycles_terminate() {
    let mapper = mapper_with(vec![]);
    let a = node("a");
    let b = node("b");
    let c = node("c");
    a.set("next", b.clone());
    b.set("next", c.clone());
    c.set("next", a.clone());

    let mapped = mapper.map_to_class(&Value::Object(a), "NodeDto").unwrap();
    let mapped_b = object_field(&mapped, "next");
    let mapped_c = object_field(&mapped_b, "next");

    assert_eq!(mapped_c.get("name"), Value::from("c"));
    assert!(object_field(&mapped_c, "next").ptr_eq(&mapped));
}

#[test]
fn repeated_children_share_one_destination() {
    let mapper = mapper_with(vec![]);
    let root = node("root");
    let leaf = node("leaf");
    root.set("next", leaf.clone());
    root.set("children", vec![Value::from(leaf.clone()), Value::from(leaf)]);

    let mapped = mapper.map_to_class(&Value::Object(root), "NodeDto").unwrap();
    let children = elements(&mapped, "children");
    let next = object_field(&mapped, "next");

    assert!(children[0].ptr_eq(&children[1]));
    assert!(children[0].ptr_eq(&next));
}

#[test]
fn identity_is_scoped_to_one_call() {
    let mapper = mapper_with(vec![]);
    let source = Value::Object(node("n"));

    let first = mapper.map_to_class(&source, "NodeDto").unwrap();
    let second = mapper.map_to_class(&source, "NodeDto").unwrap();

    assert!(!first.ptr_eq(&second));
    assert_eq!(first.get("name"), second.get("name"));
}

#[test]
fn identity_map_counts_each_source_once() {
    let mapper = mapper_with(vec![]);
    let a = node("a");
    let b = node("b");
    a.set("next", b.clone());
    a.set("children", vec![Value::from(b.clone()), Value::from(a.clone())]);
    b.set("next", a.clone());

    let report = mapper
        .map_with_report(&Value::Object(a), &TypeRef::class("NodeDto"), None)
        .unwrap();

    assert_eq!(report.objects_mapped, 2);
}

#[test]
fn cyclic_graph_cannot_be_flattened() {
    let mapper = mapper_with(vec![]);
    let looped = ObjectRef::of("Node");
    looped.set("next", looped.clone());

    let err = mapper
        .map(
            &Value::Object(looped),
            &TypeRef::map(TypeRef::String, TypeRef::map(TypeRef::String, TypeRef::Any)),
            None,
        )
        .unwrap_err();

    assert!(err.is_conversion());
}

#[test]
fn flattening_failure_names_the_field() {
    let mapper = mapper_with(vec![]);
    let a = node("a");
    a.set("next", node("b"));

    let err = mapper
        .map(
            &Value::Object(a),
            &TypeRef::map(TypeRef::String, TypeRef::map(TypeRef::String, TypeRef::Any)),
            None,
        )
        .unwrap_err();

    // `name` holds a string, which cannot become a nested map
    assert!(err.is_conversion());
    assert_eq!(err.breadcrumb()[0].type_name, "Node");
    assert_eq!(err.breadcrumb()[0].field, "name");
}
