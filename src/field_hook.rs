// Copyright 2025 Cowboy AI, LLC.

//! Hook overriding implicit field matching

use crate::types::TypeRef;
use crate::value::{ObjectRef, Value};

/// A field about to be mapped by implicit name matching
#[derive(Debug)]
pub struct FieldHookRequest<'a> {
    /// Source object
    pub source: &'a ObjectRef,
    /// Destination object
    pub destination: &'a ObjectRef,
    /// Source field name
    pub source_field: &'a str,
    /// Destination field name
    pub destination_field: &'a str,
    /// Source field value
    pub value: &'a Value,
    /// Declared type of the destination field
    pub destination_type: &'a TypeRef,
}

/// Takes over fields that no explicit rule covers
///
/// Returning `Ok(true)` marks the field handled; the engine then leaves it
/// alone. `Ok(false)` lets the engine map it as usual.
pub trait CustomFieldMapper: Send + Sync {
    /// Map a field, or decline it
    fn map_field(&self, request: &FieldHookRequest<'_>) -> anyhow::Result<bool>;
}

impl<F> CustomFieldMapper for F
where
    F: Fn(&FieldHookRequest<'_>) -> anyhow::Result<bool> + Send + Sync,
{
    fn map_field(&self, request: &FieldHookRequest<'_>) -> anyhow::Result<bool> {
        self(request)
    }
}
