// Copyright 2025 Cowboy AI, LLC.

//! Declarative mapping rules
//!
//! - [`FieldMap`]: one field-level rule
//! - [`ClassMap`]: the rule set for one class pair, optionally scoped
//! - [`RuleRegistry`] / [`ClassMappings`]: the immutable index of class maps
//! - [`MappingMetadata`]: read-only introspection

pub mod class_map;
pub mod field_map;
pub mod metadata;
pub mod registry;

pub use class_map::{ClassMap, ClassMapKey, EffectivePolicies};
pub use field_map::{Direction, FieldMap, NullPolicy, Relationship};
pub use metadata::MappingMetadata;
pub use registry::{ClassMappings, ClassMappingsBuilder, GlobalConfiguration, RuleRegistry};
