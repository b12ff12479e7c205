// Copyright 2025 Cowboy AI, LLC.

//! Converter selection, invocation and caching

mod common;

use std::error::Error as _;
use std::sync::Arc;

use anyhow::bail;
use common::{builder_with, person};
use graph_mapper::{
    ClassMap, ConversionRequest, ConverterRegistration, FieldMap, FnConverter, LruCacheManager, MappingErrorKind,
    Object, ObjectRef, TypeRef, Value, CONVERTER_BY_DEST_TYPE,
};
use pretty_assertions::assert_eq;

fn tagged(tag: &'static str) -> FnConverter<impl Fn(&ConversionRequest<'_>) -> anyhow::Result<Value> + Send + Sync> {
    FnConverter::new(tag, move |request: &ConversionRequest<'_>| -> anyhow::Result<Value> {
        let rendered = match request.source {
            Value::Int(i) => i.to_string(),
            Value::Str(s) => s.clone(),
            other => other.kind_name().to_string(),
        };
        Ok(Value::from(format!("{}:{}", tag, rendered)))
    })
}

fn summary_rules() -> Vec<ClassMap> {
    vec![ClassMap::new("Person", "PersonDto").field(FieldMap::new("name", "fullName"))]
}

#[test]
fn field_converter_wins_over_type_pair_converter() {
    let mapper = builder_with(vec![ClassMap::new("Person", "PersonDto")
        .field(FieldMap::new("age", "age").converter_id("by-id"))])
    .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, tagged("pair")))
    .converter_with_id("by-id", tagged("id"))
    .build()
    .unwrap();

    let dto = mapper
        .map_to_class(&Value::Object(person("Ann", 30)), "PersonDto")
        .unwrap();

    assert_eq!(dto.get("age"), Value::from("id:30"));
}

#[test]
fn type_pair_converter_wins_over_builtin_conversion() {
    let mapper = builder_with(summary_rules())
        .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, tagged("pair")))
        .build()
        .unwrap();

    let dto = mapper
        .map_to_class(&Value::Object(person("Ann", 30)), "PersonDto")
        .unwrap();

    assert_eq!(dto.get("age"), Value::from("pair:30"));
    assert_eq!(dto.get("fullName"), Value::from("Ann"));
}

#[test]
fn exact_registration_beats_any_pattern() {
    let mapper = builder_with(summary_rules())
        .converter(ConverterRegistration::new(TypeRef::Any, TypeRef::String, tagged("any")))
        .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, tagged("exact")))
        .build()
        .unwrap();

    let dto = mapper
        .map_to_class(&Value::Object(person("Ann", 30)), "PersonDto")
        .unwrap();

    assert_eq!(dto.get("age"), Value::from("exact:30"));
    assert_eq!(dto.get("fullName"), Value::from("any:Ann"));
}

#[test]
fn equally_specific_registrations_resolve_by_order() {
    let mapper = builder_with(summary_rules())
        .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, tagged("first")))
        .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, tagged("second")))
        .build()
        .unwrap();

    let dto = mapper
        .map_to_class(&Value::Object(person("Ann", 30)), "PersonDto")
        .unwrap();

    assert_eq!(dto.get("age"), Value::from("first:30"));
}

#[test]
fn bidirectional_registration_serves_the_reverse_pair() {
    let converter = FnConverter::new("celsius", |request: &ConversionRequest<'_>| -> anyhow::Result<Value> {
        match (request.source, request.destination_type) {
            (Value::Int(i), TypeRef::String) => Ok(Value::from(format!("{}C", i))),
            (Value::Str(s), TypeRef::Int(_)) => Ok(Value::Int(s.trim_end_matches('C').parse()?)),
            _ => bail!("unexpected direction"),
        }
    });
    let mapper = builder_with(vec![])
        .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, converter).bidirectional())
        .build()
        .unwrap();

    let forward = mapper.map(&Value::Int(21), &TypeRef::String, None).unwrap();
    let back = mapper.map(&forward, &TypeRef::i64(), None).unwrap();

    assert_eq!(forward, Value::from("21C"));
    assert_eq!(back, Value::Int(21));
}

#[test]
fn converter_parameter_reaches_the_converter() {
    let converter = FnConverter::new("prefix", |request: &ConversionRequest<'_>| -> anyhow::Result<Value> {
        let prefix = request.parameter.unwrap_or("");
        Ok(Value::from(format!("{}{}", prefix, request.source.as_str().unwrap_or(""))))
    });
    let mapper = builder_with(vec![ClassMap::new("Person", "PersonDto").field(
        FieldMap::new("name", "fullName")
            .converter_id("prefix")
            .converter_param("Dr. "),
    )])
    .converter_with_id("prefix", converter)
    .build()
    .unwrap();

    let dto = mapper
        .map_to_class(&Value::Object(person("Ann", 30)), "PersonDto")
        .unwrap();

    assert_eq!(dto.get("fullName"), Value::from("Dr. Ann"));
}

#[test]
fn converter_sees_the_existing_destination_value() {
    let converter = FnConverter::new("append", |request: &ConversionRequest<'_>| -> anyhow::Result<Value> {
        let before = request.existing_destination.as_str().unwrap_or("");
        Ok(Value::from(format!("{}+{}", before, request.source.as_str().unwrap_or(""))))
    });
    let mapper = builder_with(vec![ClassMap::new("Person", "PersonDto").field(
        FieldMap::new("name", "fullName").converter_id("append"),
    )])
    .converter_with_id("append", converter)
    .build()
    .unwrap();
    let destination = ObjectRef::new(Object::new("PersonDto").with("fullName", "old"));

    mapper
        .map_into(&Value::Object(person("Ann", 30)), &destination, None)
        .unwrap();

    assert_eq!(destination.get("fullName"), Value::from("old+Ann"));
}

#[test]
fn failing_converter_surfaces_a_conversion_error_with_cause() {
    let failing = FnConverter::new("failing", |_request: &ConversionRequest<'_>| -> anyhow::Result<Value> {
        bail!("boom")
    });
    let mapper = builder_with(summary_rules())
        .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, failing))
        .build()
        .unwrap();

    let err = mapper
        .map_to_class(&Value::Object(person("Ann", 30)), "PersonDto")
        .unwrap_err();

    assert!(matches!(err.kind(), MappingErrorKind::Conversion { cause: Some(_), .. }));
    assert_eq!(err.field_path(), "Person.age");
    assert!(err.kind().source().is_some());
}

#[test]
fn unknown_converter_id_is_a_configuration_error() {
    let mapper = builder_with(vec![ClassMap::new("Person", "PersonDto")
        .field(FieldMap::new("age", "age").converter_id("missing"))])
    .build()
    .unwrap();

    let err = mapper
        .map_to_class(&Value::Object(person("Ann", 30)), "PersonDto")
        .unwrap_err();

    assert!(err.is_configuration());
}

#[test]
fn copy_by_reference_shares_the_source_value() {
    let mapper = builder_with(vec![ClassMap::new("Person", "PersonDto")
        .field(FieldMap::new("address", "address").copy_by_reference())])
    .build()
    .unwrap();
    let source = person("Ann", 30);
    let address = source.get("address");

    let dto = mapper.map_to_class(&Value::Object(source), "PersonDto").unwrap();

    assert_eq!(dto.get("address"), address);
    assert_eq!(dto.get("address").as_object().map(|o| o.class()), Some("Address".to_string()));
}

#[test]
fn resolution_cache_is_transparent() {
    let mapper = builder_with(summary_rules())
        .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, tagged("pair")))
        .build()
        .unwrap();
    let source = Value::Object(person("Ann", 30));

    let first = mapper.map_to_class(&source, "PersonDto").unwrap();
    let cold = mapper.cache_stats(CONVERTER_BY_DEST_TYPE).unwrap();
    let second = mapper.map_to_class(&source, "PersonDto").unwrap();
    let warm = mapper.cache_stats(CONVERTER_BY_DEST_TYPE).unwrap();

    assert_eq!(first.get("age"), second.get("age"));
    assert_eq!(warm.size, cold.size);
    assert!(warm.hits > cold.hits);
    assert!(cold.misses > 0);
}

#[test]
fn converters_are_introspectable() {
    let mapper = builder_with(vec![])
        .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, tagged("pair")))
        .converter_with_id("by-id", tagged("id"))
        .build()
        .unwrap();

    assert_eq!(mapper.converters().len(), 1);
    assert_eq!(mapper.converters()[0].converter.name(), "pair");
    assert_eq!(
        mapper.converters_by_id().keys().cloned().collect::<Vec<_>>(),
        vec!["by-id".to_string()]
    );
}

fn summary_converter() -> ConverterRegistration {
    ConverterRegistration::new(
        TypeRef::class("Person"),
        TypeRef::class("PersonSummary"),
        FnConverter::new("summary", |request: &ConversionRequest<'_>| -> anyhow::Result<Value> {
            let name = request.source.as_object().map(|o| o.get("name")).unwrap_or(Value::Null);
            Ok(Value::from(Object::new("PersonSummary").with("name", format!("summary of {}", name.as_str().unwrap_or("")))))
        }),
    )
}

#[test]
fn class_pair_converter_applies_at_top_level_and_nested() {
    let mapper = builder_with(vec![]).converter(summary_converter()).build().unwrap();
    let ann = Value::Object(person("Ann", 30));

    let top = mapper.map_to_class(&ann, "PersonSummary").unwrap();
    let listed = mapper
        .map(&Value::List(vec![ann.clone()]), &TypeRef::list(TypeRef::class("PersonSummary")), None)
        .unwrap();

    assert_eq!(top.get("name"), Value::from("summary of Ann"));
    assert_eq!(top.get("age"), Value::Null);
    match listed {
        Value::List(items) => assert_eq!(items[0].as_object().unwrap().get("name"), Value::from("summary of Ann")),
        other => panic!("expected a list, got {:?}", other),
    }
}

#[test]
fn class_pair_converter_populates_a_supplied_destination() {
    let mapper = builder_with(vec![]).converter(summary_converter()).build().unwrap();
    let destination = ObjectRef::new(Object::new("PersonSummary").with("age", 99i64));

    mapper
        .map_into(&Value::Object(person("Ann", 30)), &destination, None)
        .unwrap();

    assert_eq!(destination.get("name"), Value::from("summary of Ann"));
    assert_eq!(destination.get("age"), Value::Int(99));
}

#[test]
fn clear_caches_empties_the_engine_caches() {
    let mapper = builder_with(summary_rules())
        .converter(ConverterRegistration::new(TypeRef::i64(), TypeRef::String, tagged("pair")))
        .build()
        .unwrap();
    let source = Value::Object(person("Ann", 30));
    let before = mapper.map_to_class(&source, "PersonDto").unwrap();
    assert!(mapper.cache_stats(CONVERTER_BY_DEST_TYPE).unwrap().size > 0);

    mapper.clear_caches();

    assert_eq!(mapper.cache_stats(CONVERTER_BY_DEST_TYPE).unwrap().size, 0);
    let after = mapper.map_to_class(&source, "PersonDto").unwrap();
    assert_eq!(after.get("age"), before.get("age"));
    assert_eq!(after.get("fullName"), before.get("fullName"));
}

#[test]
fn cache_manager_cannot_back_two_mappers() {
    let caches = Arc::new(LruCacheManager::new());
    builder_with(vec![]).cache_manager(caches.clone()).build().unwrap();

    let err = builder_with(vec![]).cache_manager(caches).build().unwrap_err();

    assert!(err.is_configuration());
}
