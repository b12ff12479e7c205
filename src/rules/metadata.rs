// Copyright 2025 Cowboy AI, LLC.

//! Read-only introspection of the registered class maps

use std::sync::Arc;

use super::class_map::ClassMap;
use super::field_map::FieldMap;
use super::registry::RuleRegistry;
use crate::errors::{MappingError, MappingResult};

/// Query view over a rule registry
#[derive(Clone)]
pub struct MappingMetadata {
    registry: Arc<dyn RuleRegistry>,
}

impl MappingMetadata {
    /// Wrap a registry
    pub fn new(registry: Arc<dyn RuleRegistry>) -> Self {
        Self { registry }
    }

    /// Every indexed class map, reverse maps included
    pub fn class_mappings(&self) -> Vec<Arc<ClassMap>> {
        self.registry.class_maps()
    }

    /// Class maps reading from a source class
    pub fn class_mappings_by_source(&self, source: &str) -> Vec<Arc<ClassMap>> {
        self.registry.by_source(source)
    }

    /// Class maps writing to a destination class
    pub fn class_mappings_by_destination(&self, destination: &str) -> Vec<Arc<ClassMap>> {
        self.registry.by_destination(destination)
    }

    /// The unscoped class map between two classes
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no such class map is registered.
    pub fn class_mapping(&self, source: &str, destination: &str) -> MappingResult<Arc<ClassMap>> {
        self.class_mapping_by_scope(source, destination, None)
    }

    /// The class map between two classes under a scope id
    pub fn class_mapping_by_scope(
        &self,
        source: &str,
        destination: &str,
        scope: Option<&str>,
    ) -> MappingResult<Arc<ClassMap>> {
        self.registry
            .lookup(source, destination, scope)
            .ok_or_else(|| {
                MappingError::configuration(format!(
                    "no class map registered for {} -> {} (scope {:?})",
                    source, destination, scope
                ))
            })
    }

    /// Field rule reading `field` in the class map between two classes
    pub fn field_mapping_by_source(
        &self,
        source: &str,
        destination: &str,
        field: &str,
    ) -> MappingResult<FieldMap> {
        let class_map = self.class_mapping(source, destination)?;
        class_map.field_map_for_source(field).cloned().ok_or_else(|| {
            MappingError::configuration(format!(
                "no field rule reads {}.{} in {}",
                source,
                field,
                class_map.key()
            ))
        })
    }

    /// Field rule writing `field` in the class map between two classes
    pub fn field_mapping_by_destination(
        &self,
        source: &str,
        destination: &str,
        field: &str,
    ) -> MappingResult<FieldMap> {
        let class_map = self.class_mapping(source, destination)?;
        class_map.field_map_for_destination(field).cloned().ok_or_else(|| {
            MappingError::configuration(format!(
                "no field rule writes {}.{} in {}",
                destination,
                field,
                class_map.key()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ClassMappings;

    fn metadata() -> MappingMetadata {
        let registry = ClassMappings::builder()
            .add(ClassMap::new("Person", "PersonDto").field(FieldMap::new("name", "fullName")))
            .build()
            .unwrap();
        MappingMetadata::new(Arc::new(registry))
    }

    #[test]
    fn test_lookups() {
        let metadata = metadata();
        assert_eq!(metadata.class_mappings().len(), 2);
        assert_eq!(metadata.class_mappings_by_source("PersonDto").len(), 1);

        let fm = metadata.field_mapping_by_source("Person", "PersonDto", "name").unwrap();
        assert_eq!(fm.destination, "fullName");
        let rev = metadata.field_mapping_by_destination("PersonDto", "Person", "name").unwrap();
        assert_eq!(rev.source, "fullName");
    }

    #[test]
    fn test_missing_lookups_fail() {
        let metadata = metadata();
        assert!(metadata.class_mapping("Person", "Nope").unwrap_err().is_configuration());
        assert!(metadata
            .field_mapping_by_source("Person", "PersonDto", "age")
            .unwrap_err()
            .is_configuration());
    }
}
