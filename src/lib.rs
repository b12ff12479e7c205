// Copyright 2025 Cowboy AI, LLC.

//! # Graph Mapper
//!
//! Rule-driven mapping between independently defined object graphs.
//!
//! The crate copies data from a source model into a destination model that
//! shares no type hierarchy with it, guided by declarative rules:
//! - **Types and values**: [`TypeRef`] declares types, [`Value`] and [`ObjectRef`] carry graphs
//! - **Catalog**: [`TypeCatalog`] describes classes and enums
//! - **Rules**: [`ClassMap`] and [`FieldMap`] indexed by a [`RuleRegistry`]
//! - **Converters**: pluggable [`CustomConverter`]s selected by type pair or id
//! - **Events**: ordered [`MappingEventListener`] callbacks around calls, objects and fields
//! - **Engine**: [`Mapper`], safe to share across threads
//!
//! ## Guarantees
//!
//! 1. **Identity**: within one call every source object maps to exactly one destination object
//! 2. **Cycles**: cyclic graphs terminate; destinations are registered before they are populated
//! 3. **Isolation**: each call has its own context; only immutable rules and bounded caches are shared
//! 4. **All or nothing**: a call returns a fully mapped value or an error with a field breadcrumb

#![warn(missing_docs)]

pub mod accessor;
pub mod builder;
pub mod cache;
pub mod catalog;
pub mod context;
pub mod converter;
mod engine;
pub mod errors;
pub mod events;
pub mod field_hook;
pub mod rules;
pub mod settings;
pub mod types;
pub mod value;

pub use accessor::{AccessorResolver, CatalogAccessorResolver, PropertyAccessor};
pub use builder::{CatalogDestinationBuilder, DestinationBuilder};
pub use cache::{CacheManager, CacheStats, LruCacheManager, CONVERTER_BY_DEST_TYPE, SUPER_TYPE_CHECK};
pub use catalog::{ClassDescriptor, EnumDescriptor, TypeCatalog};
pub use context::MappingContext;
pub use converter::{
    ConversionRequest, ConverterRegistration, ConverterResolver, CustomConverter, DateFormatConverter, FnConverter,
};
pub use engine::{Mapper, MapperBuilder, MappingReport};
pub use errors::{Breadcrumb, MappingError, MappingErrorKind, MappingResult};
pub use events::{EventNotifier, MappingEvent, MappingEventKind, MappingEventListener, NotificationFailure, Phase};
pub use field_hook::{CustomFieldMapper, FieldHookRequest};
pub use rules::{
    ClassMap, ClassMapKey, ClassMappings, Direction, FieldMap, GlobalConfiguration, MappingMetadata, NullPolicy,
    Relationship, RuleRegistry,
};
pub use settings::MapperSettings;
pub use types::{FloatWidth, IntWidth, TypeRef};
pub use value::{Object, ObjectId, ObjectRef, Value};
