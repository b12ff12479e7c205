// Copyright 2025 Cowboy AI, LLC.

//! Class-level mapping rules

use serde::{Deserialize, Serialize};
use std::fmt;

use super::field_map::{Direction, FieldMap, NullPolicy, Relationship};
use super::registry::GlobalConfiguration;

/// Registry key of a class map
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassMapKey {
    /// Source class name
    pub source: String,
    /// Destination class name
    pub destination: String,
    /// Optional scope id
    pub scope: Option<String>,
}

impl ClassMapKey {
    /// Create a key
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        scope: Option<&str>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            scope: scope.map(str::to_string),
        }
    }
}

impl fmt::Display for ClassMapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{} -> {} [{}]", self.source, self.destination, scope),
            None => write!(f, "{} -> {}", self.source, self.destination),
        }
    }
}

/// Rule set for one `(source class, destination class, scope)` triple
///
/// Class-level policies left unset fall back to the registry's
/// [`GlobalConfiguration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMap {
    /// Source class name
    pub source: String,
    /// Destination class name
    pub destination: String,
    /// Optional scope id
    pub scope: Option<String>,
    /// Field rules in declaration order
    pub field_maps: Vec<FieldMap>,
    /// Pair same-named properties implicitly
    pub wildcard: Option<bool>,
    /// Ignore case when pairing properties implicitly
    pub wildcard_case_insensitive: Option<bool>,
    /// Default null handling of the field rules
    pub null_policy: Option<NullPolicy>,
    /// Map empty source strings; when false they are treated as absent
    pub map_empty_string: Option<bool>,
    /// Trim source strings before conversion
    pub trim_strings: Option<bool>,
    /// Default date format
    pub date_format: Option<String>,
    /// Default collection population policy
    pub relationship: Option<Relationship>,
    /// Whether the registry also indexes the reverse mapping
    pub direction: Direction,
    /// Allow a `Null` source to produce an unpopulated destination
    pub map_null_source: bool,
}

/// Class-level policies after applying global defaults
#[derive(Debug, Clone, PartialEq)]
pub struct EffectivePolicies {
    /// Implicit matching enabled
    pub wildcard: bool,
    /// Implicit matching ignores case
    pub wildcard_case_insensitive: bool,
    /// Default null handling
    pub null_policy: NullPolicy,
    /// Empty strings are mapped
    pub map_empty_string: bool,
    /// Strings are trimmed
    pub trim_strings: bool,
    /// Date format
    pub date_format: String,
    /// Collection population policy
    pub relationship: Relationship,
}

impl ClassMap {
    /// Create a class map without field rules
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            scope: None,
            field_maps: Vec::new(),
            wildcard: None,
            wildcard_case_insensitive: None,
            null_policy: None,
            map_empty_string: None,
            trim_strings: None,
            date_format: None,
            relationship: None,
            direction: Direction::Bidirectional,
            map_null_source: false,
        }
    }

    /// Registry key of this class map
    pub fn key(&self) -> ClassMapKey {
        ClassMapKey::new(&self.source, &self.destination, self.scope.as_deref())
    }

    /// Restrict the map to a scope id
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Append a field rule
    pub fn field(mut self, field_map: FieldMap) -> Self {
        self.field_maps.push(field_map);
        self
    }

    /// Append a same-named field rule
    pub fn field_same(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.field(FieldMap::new(name.clone(), name))
    }

    /// Exclude a destination field
    pub fn exclude(self, field: impl Into<String>) -> Self {
        self.field(FieldMap::exclude(field))
    }

    /// Enable or disable implicit matching
    pub fn wildcard(mut self, enabled: bool) -> Self {
        self.wildcard = Some(enabled);
        self
    }

    /// Ignore case in implicit matching
    pub fn wildcard_case_insensitive(mut self, enabled: bool) -> Self {
        self.wildcard_case_insensitive = Some(enabled);
        self
    }

    /// Default null policy
    pub fn null_policy(mut self, policy: NullPolicy) -> Self {
        self.null_policy = Some(policy);
        self
    }

    /// Map empty strings or treat them as absent
    pub fn map_empty_string(mut self, enabled: bool) -> Self {
        self.map_empty_string = Some(enabled);
        self
    }

    /// Trim strings
    pub fn trim_strings(mut self, enabled: bool) -> Self {
        self.trim_strings = Some(enabled);
        self
    }

    /// Default date format
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Default collection population policy
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = Some(relationship);
        self
    }

    /// Do not index the reverse mapping
    pub fn one_way(mut self) -> Self {
        self.direction = Direction::OneWay;
        self
    }

    /// Accept `Null` sources
    pub fn map_null_source(mut self) -> Self {
        self.map_null_source = true;
        self
    }

    /// Whether the registry indexes the reverse of this map
    pub fn is_bidirectional(&self) -> bool {
        self.direction == Direction::Bidirectional
    }

    /// Rule for a destination field
    pub fn field_map_for_destination(&self, destination: &str) -> Option<&FieldMap> {
        self.field_maps.iter().find(|fm| fm.destination == destination)
    }

    /// Rule reading a source field
    pub fn field_map_for_source(&self, source: &str) -> Option<&FieldMap> {
        self.field_maps.iter().find(|fm| fm.source == source)
    }

    /// The reverse class map: bidirectional field rules swapped, one-way dropped
    pub fn reversed(&self) -> Self {
        let mut reversed = self.clone();
        std::mem::swap(&mut reversed.source, &mut reversed.destination);
        reversed.field_maps = self
            .field_maps
            .iter()
            .filter(|fm| fm.is_bidirectional() || fm.excluded)
            .map(FieldMap::reversed)
            .collect();
        reversed
    }

    /// Resolve unset policies against global defaults
    pub fn policies(&self, global: &GlobalConfiguration) -> EffectivePolicies {
        EffectivePolicies {
            wildcard: self.wildcard.unwrap_or(global.wildcard),
            wildcard_case_insensitive: self
                .wildcard_case_insensitive
                .unwrap_or(global.wildcard_case_insensitive),
            null_policy: self.null_policy.unwrap_or(global.null_policy),
            map_empty_string: self.map_empty_string.unwrap_or(global.map_empty_string),
            trim_strings: self.trim_strings.unwrap_or(global.trim_strings),
            date_format: self
                .date_format
                .clone()
                .unwrap_or_else(|| global.date_format.clone()),
            relationship: self.relationship.unwrap_or(global.relationship),
        }
    }
}
