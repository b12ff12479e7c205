// Copyright 2025 Cowboy AI, LLC.

//! Mapper settings

use serde::{Deserialize, Serialize};

/// Instance-level settings of a [`Mapper`](crate::Mapper)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperSettings {
    /// Capacity of the converter-by-type-pair cache; 0 disables it
    pub converter_cache_size: usize,
    /// Capacity of the supertype-check cache; 0 disables it
    pub super_type_cache_size: usize,
    /// Abort the call on the first listener failure
    pub listener_failures_fatal: bool,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            converter_cache_size: 10_000,
            super_type_cache_size: 10_000,
            listener_failures_fatal: false,
        }
    }
}
