// Copyright 2025 Cowboy AI, LLC.

//! Rule registry
//!
//! The registry is built once and never mutated afterwards. Lookups are
//! keyed by `(source class, destination class, scope)`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::class_map::{ClassMap, ClassMapKey};
use super::field_map::{NullPolicy, Relationship};
use crate::errors::{MappingError, MappingResult};

/// Default policies applied when a class map leaves one unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfiguration {
    /// Pair same-named properties implicitly
    pub wildcard: bool,
    /// Ignore case when pairing implicitly
    pub wildcard_case_insensitive: bool,
    /// Null handling
    pub null_policy: NullPolicy,
    /// Map empty strings
    pub map_empty_string: bool,
    /// Trim strings
    pub trim_strings: bool,
    /// chrono format used for date/string conversion
    pub date_format: String,
    /// Collection population policy
    pub relationship: Relationship,
}

impl Default for GlobalConfiguration {
    fn default() -> Self {
        Self {
            wildcard: true,
            wildcard_case_insensitive: false,
            null_policy: NullPolicy::MapNull,
            map_empty_string: true,
            trim_strings: false,
            date_format: "%Y-%m-%d".to_string(),
            relationship: Relationship::Cumulative,
        }
    }
}

/// Read-only index of class maps
pub trait RuleRegistry: Send + Sync {
    /// Class map for an exact `(source, destination, scope)` triple
    fn lookup(&self, source: &str, destination: &str, scope: Option<&str>) -> Option<Arc<ClassMap>>;

    /// All class maps in registration order
    fn class_maps(&self) -> Vec<Arc<ClassMap>>;

    /// Global default policies
    fn defaults(&self) -> &GlobalConfiguration;

    /// Class maps reading from a source class
    fn by_source(&self, source: &str) -> Vec<Arc<ClassMap>> {
        self.class_maps()
            .into_iter()
            .filter(|cm| cm.source == source)
            .collect()
    }

    /// Class maps writing to a destination class
    fn by_destination(&self, destination: &str) -> Vec<Arc<ClassMap>> {
        self.class_maps()
            .into_iter()
            .filter(|cm| cm.destination == destination)
            .collect()
    }
}

/// In-memory [`RuleRegistry`]
#[derive(Debug, Clone, Default)]
pub struct ClassMappings {
    maps: IndexMap<ClassMapKey, Arc<ClassMap>>,
    defaults: GlobalConfiguration,
}

impl ClassMappings {
    /// Start building a registry
    pub fn builder() -> ClassMappingsBuilder {
        ClassMappingsBuilder::default()
    }

    /// Registry without any class map
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of indexed class maps, reverse maps included
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Check if no class map is indexed
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl RuleRegistry for ClassMappings {
    fn lookup(&self, source: &str, destination: &str, scope: Option<&str>) -> Option<Arc<ClassMap>> {
        self.maps
            .get(&ClassMapKey::new(source, destination, scope))
            .cloned()
    }

    fn class_maps(&self) -> Vec<Arc<ClassMap>> {
        self.maps.values().cloned().collect()
    }

    fn defaults(&self) -> &GlobalConfiguration {
        &self.defaults
    }
}

/// Builder for [`ClassMappings`]
#[derive(Debug, Default)]
pub struct ClassMappingsBuilder {
    explicit: Vec<ClassMap>,
    defaults: GlobalConfiguration,
}

impl ClassMappingsBuilder {
    /// Add a class map
    pub fn add(mut self, class_map: ClassMap) -> Self {
        self.explicit.push(class_map);
        self
    }

    /// Replace the global defaults
    pub fn defaults(mut self, defaults: GlobalConfiguration) -> Self {
        self.defaults = defaults;
        self
    }

    /// Index the class maps
    ///
    /// Bidirectional class maps also index their reverse unless an explicit
    /// map exists for the reverse key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when two explicit class maps share a key
    /// or a field rule has an empty path.
    pub fn build(self) -> MappingResult<ClassMappings> {
        let mut maps: IndexMap<ClassMapKey, Arc<ClassMap>> = IndexMap::new();

        for class_map in &self.explicit {
            for fm in &class_map.field_maps {
                if fm.source.is_empty() || fm.destination.is_empty() {
                    return Err(MappingError::configuration(format!(
                        "class map {} has a field rule with an empty path",
                        class_map.key()
                    )));
                }
            }
            let key = class_map.key();
            if maps.contains_key(&key) {
                return Err(MappingError::configuration(format!(
                    "duplicate class map {}",
                    key
                )));
            }
            maps.insert(key, Arc::new(class_map.clone()));
        }

        for class_map in &self.explicit {
            if !class_map.is_bidirectional() || class_map.source == class_map.destination {
                continue;
            }
            let reversed = class_map.reversed();
            let key = reversed.key();
            if maps.contains_key(&key) {
                continue;
            }
            debug!(class_map = %key, "indexing reverse class map");
            maps.insert(key, Arc::new(reversed));
        }

        Ok(ClassMappings {
            maps,
            defaults: self.defaults,
        })
    }
}
