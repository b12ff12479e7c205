// Copyright 2025 Cowboy AI, LLC.

//! Field-level mapping rules

use serde::{Deserialize, Serialize};

use crate::types::TypeRef;

/// What to do when the source value of a field is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullPolicy {
    /// Write `Null` to the destination
    MapNull,
    /// Leave the destination untouched
    Skip,
    /// Write the destination type's default value
    MapDefault,
}

/// Direction in which a rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Source to destination only
    OneWay,
    /// Both ways
    Bidirectional,
}

/// How a collection field that already holds elements is populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    /// Keep existing elements and add mapped ones not already present
    Cumulative,
    /// Replace the existing collection
    NonCumulative,
}

/// One field-level rule inside a [`ClassMap`](super::ClassMap)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    /// Source property path
    pub source: String,
    /// Destination property path
    pub destination: String,
    /// Id of the converter to use for this field
    pub converter_id: Option<String>,
    /// Parameter handed to the converter
    pub converter_param: Option<String>,
    /// Direction of the rule
    pub direction: Direction,
    /// Null handling; the class map's policy applies when unset
    pub null_policy: Option<NullPolicy>,
    /// Assign the source value as-is, never deep-convert it
    pub copy_by_reference: bool,
    /// Scope id used when recursing into this field's value
    pub map_id: Option<String>,
    /// Explicit type of the source value (element type for containers)
    pub source_hint: Option<TypeRef>,
    /// Explicit destination type (element type for containers)
    pub destination_hint: Option<TypeRef>,
    /// Collection population policy; the class map's applies when unset
    pub relationship: Option<Relationship>,
    /// Drop existing destination elements that are not mapped from the source
    pub remove_orphans: bool,
    /// chrono format for date/string conversions of this field
    pub date_format: Option<String>,
    /// Exclude the destination field from mapping altogether
    pub excluded: bool,
    /// Silently skip when the destination cannot be resolved or written
    pub optional: bool,
}

impl FieldMap {
    /// Rule copying `source` into `destination`
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            converter_id: None,
            converter_param: None,
            direction: Direction::Bidirectional,
            null_policy: None,
            copy_by_reference: false,
            map_id: None,
            source_hint: None,
            destination_hint: None,
            relationship: None,
            remove_orphans: false,
            date_format: None,
            excluded: false,
            optional: false,
        }
    }

    /// Rule excluding a destination field
    pub fn exclude(field: impl Into<String>) -> Self {
        let field = field.into();
        let mut map = Self::new(field.clone(), field);
        map.excluded = true;
        map
    }

    /// Use the converter registered under `id`
    pub fn converter_id(mut self, id: impl Into<String>) -> Self {
        self.converter_id = Some(id.into());
        self
    }

    /// Parameter passed to the converter
    pub fn converter_param(mut self, param: impl Into<String>) -> Self {
        self.converter_param = Some(param.into());
        self
    }

    /// Apply source to destination only
    pub fn one_way(mut self) -> Self {
        self.direction = Direction::OneWay;
        self
    }

    /// Null handling for this field
    pub fn null_policy(mut self, policy: NullPolicy) -> Self {
        self.null_policy = Some(policy);
        self
    }

    /// Assign by reference
    pub fn copy_by_reference(mut self) -> Self {
        self.copy_by_reference = true;
        self
    }

    /// Scope id for the nested mapping
    pub fn map_id(mut self, id: impl Into<String>) -> Self {
        self.map_id = Some(id.into());
        self
    }

    /// Source type hint
    pub fn source_hint(mut self, ty: TypeRef) -> Self {
        self.source_hint = Some(ty);
        self
    }

    /// Destination type hint
    pub fn destination_hint(mut self, ty: TypeRef) -> Self {
        self.destination_hint = Some(ty);
        self
    }

    /// Collection population policy
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = Some(relationship);
        self
    }

    /// Remove destination elements not present in the source
    pub fn remove_orphans(mut self) -> Self {
        self.remove_orphans = true;
        self
    }

    /// Date format for this field
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Skip silently when the destination is not writable
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Whether this rule also applies in reverse
    pub fn is_bidirectional(&self) -> bool {
        self.direction == Direction::Bidirectional
    }

    /// The same rule with source and destination swapped
    pub fn reversed(&self) -> Self {
        let mut reversed = self.clone();
        std::mem::swap(&mut reversed.source, &mut reversed.destination);
        std::mem::swap(&mut reversed.source_hint, &mut reversed.destination_hint);
        reversed
    }
}
