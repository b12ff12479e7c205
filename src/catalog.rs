// Copyright 2025 Cowboy AI, LLC.

//! Type catalog: the structural metadata of both models
//!
//! The catalog is what the mapper knows about classes and enums: declared
//! fields, inheritance and whether a class can be instantiated. It is built
//! once and shared read-only by the accessor resolver, the destination
//! builder and the converter resolver.

use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

use crate::errors::{MappingError, MappingResult};
use crate::types::TypeRef;

/// Structure of one class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    /// Class name
    pub name: String,
    /// Direct superclass
    pub parent: Option<String>,
    /// Additional supertypes (interfaces)
    pub interfaces: Vec<String>,
    /// Declared fields in declaration order
    pub fields: IndexMap<String, TypeRef>,
    /// Whether instances can be created
    pub instantiable: bool,
}

impl ClassDescriptor {
    /// Create an instantiable class without fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            interfaces: Vec::new(),
            fields: IndexMap::new(),
            instantiable: true,
        }
    }

    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }

    /// Set the superclass
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Mark the class as abstract
    pub fn abstract_class(mut self) -> Self {
        self.instantiable = false;
        self
    }
}

/// Structure of one enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    /// Enum name
    pub name: String,
    /// Variant names in ordinal order
    pub variants: Vec<String>,
}

impl EnumDescriptor {
    /// Create an enum with its variants
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Ordinal of a variant
    pub fn ordinal(&self, variant: &str) -> Option<usize> {
        self.variants.iter().position(|v| v == variant)
    }
}

/// Immutable registry of class and enum descriptors
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    classes: IndexMap<String, ClassDescriptor>,
    enums: IndexMap<String, EnumDescriptor>,
}

impl TypeCatalog {
    /// Start building a catalog
    pub fn builder() -> TypeCatalogBuilder {
        TypeCatalogBuilder::default()
    }

    /// Class descriptor by name
    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    /// Enum descriptor by name
    pub fn enumeration(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name)
    }

    /// All class descriptors in registration order
    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }

    /// Declared type of a field, searching superclasses
    pub fn field_type(&self, class: &str, field: &str) -> Option<&TypeRef> {
        let mut current = self.classes.get(class);
        let mut seen = HashSet::new();
        while let Some(descriptor) = current {
            if !seen.insert(descriptor.name.as_str()) {
                break;
            }
            if let Some(ty) = descriptor.fields.get(field) {
                return Some(ty);
            }
            current = descriptor
                .parent
                .as_deref()
                .and_then(|p| self.classes.get(p));
        }
        None
    }

    /// All fields of a class, inherited fields first
    pub fn fields(&self, class: &str) -> Vec<(String, TypeRef)> {
        let mut chain = Vec::new();
        let mut current = self.classes.get(class);
        let mut seen = HashSet::new();
        while let Some(descriptor) = current {
            if !seen.insert(descriptor.name.as_str()) {
                break;
            }
            chain.push(descriptor);
            current = descriptor
                .parent
                .as_deref()
                .and_then(|p| self.classes.get(p));
        }

        let mut out: IndexMap<String, TypeRef> = IndexMap::new();
        for descriptor in chain.into_iter().rev() {
            for (name, ty) in &descriptor.fields {
                out.insert(name.clone(), ty.clone());
            }
        }
        out.into_iter().collect()
    }

    /// Supertypes of a class with their distance, nearest first
    ///
    /// The class itself is not included.
    pub fn ancestors(&self, class: &str) -> Vec<(String, u32)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(class.to_string());
        let mut queue = VecDeque::new();
        queue.push_back((class.to_string(), 0u32));

        while let Some((name, depth)) = queue.pop_front() {
            let Some(descriptor) = self.classes.get(&name) else {
                continue;
            };
            let supers = descriptor.parent.iter().chain(descriptor.interfaces.iter());
            for sup in supers {
                if seen.insert(sup.clone()) {
                    out.push((sup.clone(), depth + 1));
                    queue.push_back((sup.clone(), depth + 1));
                }
            }
        }
        out
    }

    /// Inheritance distance from `sub` up to `sup`
    ///
    /// `Some(0)` for the same class, `None` when unrelated.
    pub fn distance(&self, sub: &str, sup: &str) -> Option<u32> {
        if sub == sup {
            return Some(0);
        }
        self.ancestors(sub)
            .into_iter()
            .find(|(name, _)| name == sup)
            .map(|(_, d)| d)
    }

    /// Concrete subclasses of a class (including itself when instantiable)
    pub fn instantiable_subclasses(&self, class: &str) -> Vec<&ClassDescriptor> {
        self.classes
            .values()
            .filter(|c| c.instantiable && self.distance(&c.name, class).is_some())
            .collect()
    }
}

/// Builder for [`TypeCatalog`]
#[derive(Debug, Default)]
pub struct TypeCatalogBuilder {
    classes: IndexMap<String, ClassDescriptor>,
    enums: IndexMap<String, EnumDescriptor>,
}

impl TypeCatalogBuilder {
    /// Register a class
    pub fn class(mut self, descriptor: ClassDescriptor) -> Self {
        self.classes.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Register an enum
    pub fn enumeration(mut self, descriptor: EnumDescriptor) -> Self {
        self.enums.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Validate references and build the catalog
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a superclass is not registered or a
    /// field references an unknown class.
    pub fn build(self) -> MappingResult<TypeCatalog> {
        for descriptor in self.classes.values() {
            for sup in descriptor.parent.iter().chain(descriptor.interfaces.iter()) {
                if !self.classes.contains_key(sup) {
                    return Err(MappingError::configuration(format!(
                        "class {} extends unknown type {}",
                        descriptor.name, sup
                    )));
                }
            }
            for (field, ty) in &descriptor.fields {
                if let Some(missing) = self.first_unknown_class(ty) {
                    return Err(MappingError::configuration(format!(
                        "field {}.{} references unknown class {}",
                        descriptor.name, field, missing
                    )));
                }
            }
        }
        Ok(TypeCatalog {
            classes: self.classes,
            enums: self.enums,
        })
    }

    fn first_unknown_class<'a>(&self, ty: &'a TypeRef) -> Option<&'a str> {
        match ty {
            TypeRef::Class(name) if !self.classes.contains_key(name) => Some(name),
            TypeRef::List(e) | TypeRef::Set(e) | TypeRef::Array(e) => self.first_unknown_class(e),
            TypeRef::Map(k, v) => self
                .first_unknown_class(k)
                .or_else(|| self.first_unknown_class(v)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        TypeCatalog::builder()
            .class(ClassDescriptor::new("Named").abstract_class().field("name", TypeRef::String))
            .class(ClassDescriptor::new("Auditable").abstract_class())
            .class(
                ClassDescriptor::new("Person")
                    .extends("Named")
                    .implements("Auditable")
                    .field("age", TypeRef::i32()),
            )
            .class(ClassDescriptor::new("Employee").extends("Person").field("salary", TypeRef::f64()))
            .enumeration(EnumDescriptor::new("Color", ["Red", "Green"]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_inherited_field_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.field_type("Employee", "name"), Some(&TypeRef::String));
        assert_eq!(catalog.field_type("Employee", "missing"), None);

        let names: Vec<String> = catalog.fields("Employee").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "age", "salary"]);
    }

    #[test]
    fn test_distance() {
        let catalog = catalog();
        assert_eq!(catalog.distance("Employee", "Employee"), Some(0));
        assert_eq!(catalog.distance("Employee", "Person"), Some(1));
        assert_eq!(catalog.distance("Employee", "Named"), Some(2));
        assert_eq!(catalog.distance("Employee", "Auditable"), Some(2));
        assert_eq!(catalog.distance("Person", "Employee"), None);
    }

    #[test]
    fn test_instantiable_subclasses() {
        let catalog = catalog();
        let names: Vec<&str> = catalog
            .instantiable_subclasses("Named")
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Person", "Employee"]);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let result = TypeCatalog::builder()
            .class(ClassDescriptor::new("Orphan").extends("Missing"))
            .build();
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_enum_ordinal() {
        let catalog = catalog();
        assert_eq!(catalog.enumeration("Color").and_then(|e| e.ordinal("Green")), Some(1));
    }
}
