// Copyright 2025 Cowboy AI, LLC.

//! Type conversion
//!
//! - [`CustomConverter`]: pluggable converter capability
//! - [`ConverterRegistration`]: a converter bound to a type pair
//! - [`ConverterResolver`]: picks the most specific registration, cached
//! - [`scalar`]: the built-in primitive/enum/date conversion table
//! - [`DateFormatConverter`]: stock date <-> string converter

pub mod date;
pub mod resolver;
pub mod scalar;

use std::fmt;
use std::sync::Arc;

use crate::types::TypeRef;
use crate::value::Value;

pub use date::DateFormatConverter;
pub use resolver::{ConverterResolver, ANY_DISTANCE};
pub use scalar::{convert_scalar, ScalarContext};

/// Everything a converter gets to see for one conversion
#[derive(Debug)]
pub struct ConversionRequest<'a> {
    /// Value to convert
    pub source: &'a Value,
    /// Value currently held by the destination, `Null` if none
    pub existing_destination: &'a Value,
    /// Type of the source value
    pub source_type: &'a TypeRef,
    /// Requested destination type
    pub destination_type: &'a TypeRef,
    /// Parameter configured on the field rule
    pub parameter: Option<&'a str>,
}

/// Pluggable conversion between types
///
/// A converter registered bidirectionally receives requests in both
/// directions and must inspect `destination_type` to tell them apart.
pub trait CustomConverter: Send + Sync {
    /// Convert the request's source value
    fn convert(&self, request: &ConversionRequest<'_>) -> anyhow::Result<Value>;

    /// Name used in logs and introspection
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Converter backed by a closure
pub struct FnConverter<F> {
    name: String,
    f: F,
}

impl<F> FnConverter<F>
where
    F: Fn(&ConversionRequest<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> CustomConverter for FnConverter<F>
where
    F: Fn(&ConversionRequest<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    fn convert(&self, request: &ConversionRequest<'_>) -> anyhow::Result<Value> {
        (self.f)(request)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A converter bound to a `(source, destination)` type pattern
///
/// Patterns match the exact type, any subtype, or everything when `Any`.
#[derive(Clone)]
pub struct ConverterRegistration {
    /// Source type pattern
    pub source: TypeRef,
    /// Destination type pattern
    pub destination: TypeRef,
    /// Also match the swapped pair
    pub bidirectional: bool,
    /// The converter
    pub converter: Arc<dyn CustomConverter>,
}

impl ConverterRegistration {
    /// Register a converter for a one-way type pair
    pub fn new<C>(source: TypeRef, destination: TypeRef, converter: C) -> Self
    where
        C: CustomConverter + 'static,
    {
        Self::shared(source, destination, Arc::new(converter))
    }

    /// Register an already shared converter
    pub fn shared(source: TypeRef, destination: TypeRef, converter: Arc<dyn CustomConverter>) -> Self {
        Self {
            source,
            destination,
            bidirectional: false,
            converter,
        }
    }

    /// Also match the swapped type pair
    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }
}

impl fmt::Debug for ConverterRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistration")
            .field("source", &self.source.to_string())
            .field("destination", &self.destination.to_string())
            .field("bidirectional", &self.bidirectional)
            .field("converter", &self.converter.name())
            .finish()
    }
}
