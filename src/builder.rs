// Copyright 2025 Cowboy AI, LLC.

//! Destination instantiation
//!
//! The engine never constructs destination objects or containers itself; it
//! asks a [`DestinationBuilder`]. [`CatalogDestinationBuilder`] creates
//! instances from the [`TypeCatalog`], optionally through per-class factories.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::TypeCatalog;
use crate::errors::{MappingError, MappingResult};
use crate::types::TypeRef;
use crate::value::{Object, ObjectRef, Value};

/// Factory closure creating a fresh instance of one class
pub type ObjectFactory = Arc<dyn Fn() -> anyhow::Result<ObjectRef> + Send + Sync>;

/// Creates destination objects and containers
pub trait DestinationBuilder: Send + Sync {
    /// Create a new, unpopulated instance of a class
    fn create_object(&self, class: &str) -> MappingResult<ObjectRef>;

    /// Create an empty container for a list, set, array or map type
    fn create_container(&self, ty: &TypeRef) -> MappingResult<Value> {
        match ty {
            TypeRef::List(_) | TypeRef::Array(_) => Ok(Value::List(Vec::new())),
            TypeRef::Set(_) => Ok(Value::Set(Vec::new())),
            TypeRef::Map(_, _) => Ok(Value::Map(Vec::new())),
            other => Err(MappingError::instantiation(other, "not a container type")),
        }
    }

    /// Default value of a type, used by the map-default null policy
    fn default_value(&self, ty: &TypeRef) -> Value {
        default_value_of(ty)
    }
}

/// Zero value of a type
///
/// Numbers are zero, text is empty, containers are empty; types without a
/// natural zero (dates, enums, classes, `Any`) default to `Null`.
pub fn default_value_of(ty: &TypeRef) -> Value {
    match ty {
        TypeRef::Bool => Value::Bool(false),
        TypeRef::Int(_) => Value::Int(0),
        TypeRef::Float(_) => Value::Float(0.0),
        TypeRef::Char => Value::Char('\0'),
        TypeRef::String => Value::Str(String::new()),
        TypeRef::List(_) | TypeRef::Array(_) => Value::List(Vec::new()),
        TypeRef::Set(_) => Value::Set(Vec::new()),
        TypeRef::Map(_, _) => Value::Map(Vec::new()),
        TypeRef::Any
        | TypeRef::Date
        | TypeRef::DateTime
        | TypeRef::Enum(_)
        | TypeRef::Class(_) => Value::Null,
    }
}

/// Destination builder driven by the type catalog
#[derive(Clone)]
pub struct CatalogDestinationBuilder {
    catalog: Arc<TypeCatalog>,
    factories: HashMap<String, ObjectFactory>,
}

impl CatalogDestinationBuilder {
    /// Create a builder over a catalog
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self {
            catalog,
            factories: HashMap::new(),
        }
    }

    /// Use a factory instead of the default construction for one class
    pub fn with_factory<F>(mut self, class: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<ObjectRef> + Send + Sync + 'static,
    {
        self.factories.insert(class.into(), Arc::new(factory));
        self
    }
}

impl fmt::Debug for CatalogDestinationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factories: Vec<&String> = self.factories.keys().collect();
        factories.sort();
        f.debug_struct("CatalogDestinationBuilder")
            .field("factories", &factories)
            .finish()
    }
}

impl DestinationBuilder for CatalogDestinationBuilder {
    fn create_object(&self, class: &str) -> MappingResult<ObjectRef> {
        if let Some(factory) = self.factories.get(class) {
            let instance =
                factory().map_err(|e| MappingError::instantiation(class, e.to_string()))?;
            let actual = instance.class();
            if actual != class && self.catalog.distance(&actual, class).is_none() {
                return Err(MappingError::instantiation(
                    class,
                    format!("factory produced unrelated class {}", actual),
                ));
            }
            return Ok(instance);
        }

        let descriptor = self
            .catalog
            .class(class)
            .ok_or_else(|| MappingError::instantiation(class, "class is not catalogued"))?;
        if !descriptor.instantiable {
            return Err(MappingError::instantiation(class, "class is not instantiable"));
        }

        let mut object = Object::new(class);
        for (name, _) in self.catalog.fields(class) {
            object.set(name, Value::Null);
        }
        Ok(ObjectRef::new(object))
    }

    fn default_value(&self, ty: &TypeRef) -> Value {
        match ty {
            TypeRef::Enum(name) => self
                .catalog
                .enumeration(name)
                .and_then(|e| e.variants.first())
                .map(|variant| Value::enum_variant(name.clone(), variant.clone()))
                .unwrap_or(Value::Null),
            other => default_value_of(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ClassDescriptor, EnumDescriptor};

    fn builder() -> CatalogDestinationBuilder {
        let catalog = TypeCatalog::builder()
            .class(ClassDescriptor::new("Shape").abstract_class())
            .class(ClassDescriptor::new("Circle").extends("Shape").field("radius", TypeRef::f64()))
            .enumeration(EnumDescriptor::new("Color", ["Red", "Green"]))
            .build()
            .unwrap();
        CatalogDestinationBuilder::new(Arc::new(catalog))
    }

    #[test]
    fn test_creates_catalogued_class_with_declared_fields() {
        let circle = builder().create_object("Circle").unwrap();
        assert_eq!(circle.class(), "Circle");
        assert!(circle.read().has("radius"));
        assert!(circle.get("radius").is_null());
    }

    #[test]
    fn test_abstract_and_unknown_classes_fail() {
        assert!(builder().create_object("Shape").unwrap_err().is_instantiation());
        assert!(builder().create_object("Nope").unwrap_err().is_instantiation());
    }

    #[test]
    fn test_factory_is_used() {
        let builder = builder().with_factory("Shape", || {
            Ok(ObjectRef::new(Object::new("Circle").with("radius", 1.0)))
        });
        let shape = builder.create_object("Shape").unwrap();
        assert_eq!(shape.get("radius"), Value::Float(1.0));
    }

    #[test]
    fn test_containers_and_defaults() {
        let builder = builder();
        assert_eq!(builder.create_container(&TypeRef::set(TypeRef::String)).unwrap(), Value::Set(vec![]));
        assert!(builder.create_container(&TypeRef::String).unwrap_err().is_instantiation());
        assert_eq!(builder.default_value(&TypeRef::i32()), Value::Int(0));
        assert_eq!(
            builder.default_value(&TypeRef::enumeration("Color")),
            Value::enum_variant("Color", "Red")
        );
    }
}
