// Copyright 2025 Cowboy AI, LLC.

//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use graph_mapper::{
    ClassDescriptor, ClassMap, ClassMappings, EnumDescriptor, Mapper, MapperBuilder, Object, ObjectRef, TypeCatalog,
    TypeRef, Value,
};

/// Catalog covering every fixture model
pub fn catalog() -> Arc<TypeCatalog> {
    let catalog = TypeCatalog::builder()
        .enumeration(EnumDescriptor::new("Color", ["Red", "Green", "Blue"]))
        .class(
            ClassDescriptor::new("Address")
                .field("street", TypeRef::String)
                .field("city", TypeRef::String),
        )
        .class(
            ClassDescriptor::new("AddressDto")
                .field("street", TypeRef::String)
                .field("city", TypeRef::String),
        )
        .class(
            ClassDescriptor::new("Person")
                .field("name", TypeRef::String)
                .field("age", TypeRef::i32())
                .field("address", TypeRef::class("Address"))
                .field("friends", TypeRef::list(TypeRef::class("Person")))
                .field("tags", TypeRef::list(TypeRef::String))
                .field("favorite", TypeRef::enumeration("Color"))
                .field("nickname", TypeRef::String),
        )
        .class(
            ClassDescriptor::new("PersonSummary")
                .field("name", TypeRef::String)
                .field("age", TypeRef::i32()),
        )
        .class(
            ClassDescriptor::new("PersonDto")
                .field("fullName", TypeRef::String)
                .field("age", TypeRef::String)
                .field("address", TypeRef::class("AddressDto"))
                .field("friends", TypeRef::list(TypeRef::class("PersonDto")))
                .field("tags", TypeRef::set(TypeRef::String))
                .field("favorite", TypeRef::String)
                .field("nickname", TypeRef::String),
        )
        .class(ClassDescriptor::new("Event").field("date", TypeRef::Date))
        .class(ClassDescriptor::new("EventView").field("date", TypeRef::String))
        .class(
            ClassDescriptor::new("Node")
                .field("name", TypeRef::String)
                .field("next", TypeRef::class("Node"))
                .field("children", TypeRef::list(TypeRef::class("Node"))),
        )
        .class(
            ClassDescriptor::new("NodeDto")
                .field("name", TypeRef::String)
                .field("next", TypeRef::class("NodeDto"))
                .field("children", TypeRef::list(TypeRef::class("NodeDto"))),
        )
        .build()
        .expect("fixture catalog is valid");
    Arc::new(catalog)
}

/// Mapper over the fixture catalog with the given class maps
pub fn mapper_with(class_maps: Vec<ClassMap>) -> Mapper {
    builder_with(class_maps).build().expect("mapper builds")
}

/// Builder over the fixture catalog with the given class maps
pub fn builder_with(class_maps: Vec<ClassMap>) -> MapperBuilder {
    let mut rules = ClassMappings::builder();
    for class_map in class_maps {
        rules = rules.add(class_map);
    }
    Mapper::builder(catalog()).class_mappings(rules.build().expect("rules are valid"))
}

/// A person with an address
pub fn person(name: &str, age: i32) -> ObjectRef {
    let address = Object::new("Address").with("street", "Main St 1").with("city", "Oslo");
    ObjectRef::new(
        Object::new("Person")
            .with("name", name)
            .with("age", age)
            .with("address", address)
            .with("tags", vec![Value::from("a"), Value::from("b")]),
    )
}

/// Object field of a mapped object
pub fn object_field(object: &ObjectRef, field: &str) -> ObjectRef {
    object
        .get(field)
        .as_object()
        .cloned()
        .unwrap_or_else(|| panic!("field {} holds no object", field))
}
