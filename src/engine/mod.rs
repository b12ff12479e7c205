// Copyright 2025 Cowboy AI, LLC.

//! Mapping engine
//!
//! [`Mapper`] is the entry point. It is assembled once by [`MapperBuilder`]
//! and then shared freely: every call creates its own
//! [`MappingContext`](crate::MappingContext), while the rule registry, the
//! converters and the bounded caches are shared by all calls on the instance.
//!
//! # Examples
//!
//! ```rust
//! use graph_mapper::{ClassDescriptor, ClassMap, ClassMappings, FieldMap, Mapper, Object, TypeCatalog, TypeRef, Value};
//!
//! let catalog = TypeCatalog::builder()
//!     .class(ClassDescriptor::new("Person").field("name", TypeRef::String).field("age", TypeRef::i32()))
//!     .class(ClassDescriptor::new("PersonDto").field("fullName", TypeRef::String).field("age", TypeRef::String))
//!     .build()
//!     .unwrap();
//! let rules = ClassMappings::builder()
//!     .add(ClassMap::new("Person", "PersonDto").field(FieldMap::new("name", "fullName")))
//!     .build()
//!     .unwrap();
//! let mapper = Mapper::builder(catalog).class_mappings(rules).build().unwrap();
//!
//! let person = Value::from(Object::new("Person").with("name", "Ann").with("age", 30));
//! let dto = mapper.map_to_class(&person, "PersonDto").unwrap();
//!
//! assert_eq!(dto.get("fullName"), Value::from("Ann"));
//! assert_eq!(dto.get("age"), Value::from("30"));
//! ```

mod class_map_resolver;
mod containers;
mod field_mapper;

use dashmap::DashMap;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, debug_span};
use uuid::Uuid;

use crate::accessor::{AccessorResolver, CatalogAccessorResolver};
use crate::builder::{CatalogDestinationBuilder, DestinationBuilder};
use crate::cache::{CacheManager, CacheStats, LruCacheManager, CONVERTER_BY_DEST_TYPE, SUPER_TYPE_CHECK};
use crate::catalog::TypeCatalog;
use crate::context::MappingContext;
use crate::converter::{ConverterRegistration, ConverterResolver, CustomConverter};
use crate::errors::{MappingError, MappingResult};
use crate::events::{EventNotifier, MappingEvent, MappingEventKind, MappingEventListener, NotificationFailure, Phase};
use crate::field_hook::{CustomFieldMapper, FieldHookRequest};
use crate::rules::{ClassMapKey, ClassMappings, MappingMetadata, RuleRegistry};
use crate::settings::MapperSettings;
use crate::types::TypeRef;
use crate::value::{ObjectRef, Value};

use class_map_resolver::EffectiveClassMap;

/// Outcome of a top-level call
#[derive(Debug, Clone)]
pub struct MappingReport {
    /// Id of the call
    pub call_id: Uuid,
    /// The mapped value
    pub value: Value,
    /// Listener failures that did not abort the call
    pub listener_failures: Vec<NotificationFailure>,
    /// Source objects entered into the identity map during the call
    pub objects_mapped: usize,
}

pub(crate) struct MapperInner {
    catalog: Arc<TypeCatalog>,
    registry: Arc<dyn RuleRegistry>,
    accessors: Arc<dyn AccessorResolver>,
    builder: Arc<dyn DestinationBuilder>,
    caches: Arc<dyn CacheManager>,
    converters: ConverterResolver,
    notifier: EventNotifier,
    field_mapper: Option<Arc<dyn CustomFieldMapper>>,
    settings: MapperSettings,
    effective: DashMap<ClassMapKey, Arc<EffectiveClassMap>>,
}

/// Maps values between object graphs
///
/// Cheap to clone; clones share rules, converters and caches.
#[derive(Clone)]
pub struct Mapper {
    inner: Arc<MapperInner>,
}

impl Mapper {
    /// Start assembling a mapper over a type catalog
    pub fn builder(catalog: impl Into<Arc<TypeCatalog>>) -> MapperBuilder {
        MapperBuilder::new(catalog.into())
    }

    /// Map a value to a destination type
    ///
    /// Objects mapped to a class type produce a new destination instance.
    ///
    /// # Errors
    ///
    /// Fails with the first error met; the partially built destination is
    /// discarded.
    pub fn map(&self, source: &Value, destination_type: &TypeRef, scope: Option<&str>) -> MappingResult<Value> {
        self.map_with_report(source, destination_type, scope)
            .map(|report| report.value)
    }

    /// Map an object to a new instance of a class, without scope
    ///
    /// # Errors
    ///
    /// Fails like [`Mapper::map`].
    pub fn map_to_class(&self, source: &Value, class: &str) -> MappingResult<ObjectRef> {
        match self.map(source, &TypeRef::class(class), None)? {
            Value::Object(object) => Ok(object),
            other => Err(MappingError::conversion(
                other.runtime_type(),
                class,
                "mapping did not produce an object",
            )),
        }
    }

    /// Populate an existing destination object in place
    ///
    /// # Errors
    ///
    /// Fails like [`Mapper::map`]. The destination may be partially updated
    /// and should be discarded.
    pub fn map_into(&self, source: &Value, destination: &ObjectRef, scope: Option<&str>) -> MappingResult<()> {
        self.map_into_with_report(source, destination, scope).map(|_| ())
    }

    /// [`Mapper::map`] returning the call's report
    ///
    /// # Errors
    ///
    /// Fails like [`Mapper::map`].
    pub fn map_with_report(
        &self,
        source: &Value,
        destination_type: &TypeRef,
        scope: Option<&str>,
    ) -> MappingResult<MappingReport> {
        self.run(source, &Value::Null, scope, |run| run.map_top(source, destination_type))
    }

    /// [`Mapper::map_into`] returning the call's report
    ///
    /// # Errors
    ///
    /// Fails like [`Mapper::map_into`].
    pub fn map_into_with_report(
        &self,
        source: &Value,
        destination: &ObjectRef,
        scope: Option<&str>,
    ) -> MappingResult<MappingReport> {
        let target = Value::Object(destination.clone());
        self.run(source, &target, scope, |run| {
            run.map_into_top(source, destination)?;
            Ok(Value::Object(destination.clone()))
        })
    }

    fn run<F>(&self, source: &Value, destination: &Value, scope: Option<&str>, body: F) -> MappingResult<MappingReport>
    where
        F: FnOnce(&mut MappingRun<'_>) -> MappingResult<Value>,
    {
        let mut run = MappingRun {
            inner: &self.inner,
            ctx: MappingContext::new(scope),
        };
        let call_id = run.ctx.call_id();
        let span = debug_span!("map", %call_id, scope = scope.unwrap_or(""));
        let _entered = span.enter();

        run.notify(Phase::Before, MappingEvent::new(MappingEventKind::Call, call_id, source, destination))?;
        let value = body(&mut run)?;
        run.notify(Phase::After, MappingEvent::new(MappingEventKind::Call, call_id, source, &value))?;

        let (listener_failures, objects_mapped) = run.ctx.finish();
        debug!(objects_mapped, failures = listener_failures.len(), "mapping call finished");
        Ok(MappingReport {
            call_id,
            value,
            listener_failures,
            objects_mapped,
        })
    }

    /// Converter registrations in registration order
    pub fn converters(&self) -> &[ConverterRegistration] {
        self.inner.converters.registrations()
    }

    /// Converters registered by id
    pub fn converters_by_id(&self) -> &IndexMap<String, Arc<dyn CustomConverter>> {
        self.inner.converters.converters_by_id()
    }

    /// Event listeners in invocation order
    pub fn event_listeners(&self) -> &[Arc<dyn MappingEventListener>] {
        self.inner.notifier.listeners()
    }

    /// Hook consulted for implicitly matched fields
    pub fn custom_field_mapper(&self) -> Option<&Arc<dyn CustomFieldMapper>> {
        self.inner.field_mapper.as_ref()
    }

    /// Settings of this instance
    pub fn settings(&self) -> &MapperSettings {
        &self.inner.settings
    }

    /// Type catalog of this instance
    pub fn catalog(&self) -> &TypeCatalog {
        &self.inner.catalog
    }

    /// Read-only view of the class maps
    pub fn mapping_metadata(&self) -> MappingMetadata {
        MappingMetadata::new(self.inner.registry.clone())
    }

    /// Counters of a named cache
    pub fn cache_stats(&self, name: &str) -> Option<CacheStats> {
        self.inner.caches.stats(name)
    }

    /// Drop cached converter lookups, subtype checks and effective class maps
    ///
    /// Counters are kept. Mapping results are unaffected.
    pub fn clear_caches(&self) {
        self.inner.caches.clear();
        self.inner.effective.clear();
        debug!("mapper caches cleared");
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("converters", &self.inner.converters)
            .field("notifier", &self.inner.notifier)
            .field("settings", &self.inner.settings)
            .finish()
    }
}

/// Assembles a [`Mapper`]
///
/// Collaborators left unset default to the catalog-backed implementations,
/// an empty rule registry and a fresh [`LruCacheManager`].
pub struct MapperBuilder {
    catalog: Arc<TypeCatalog>,
    registry: Option<Arc<dyn RuleRegistry>>,
    accessors: Option<Arc<dyn AccessorResolver>>,
    builder: Option<Arc<dyn DestinationBuilder>>,
    caches: Option<Arc<dyn CacheManager>>,
    registrations: Vec<ConverterRegistration>,
    by_id: IndexMap<String, Arc<dyn CustomConverter>>,
    listeners: Vec<Arc<dyn MappingEventListener>>,
    field_mapper: Option<Arc<dyn CustomFieldMapper>>,
    settings: MapperSettings,
}

impl MapperBuilder {
    fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self {
            catalog,
            registry: None,
            accessors: None,
            builder: None,
            caches: None,
            registrations: Vec::new(),
            by_id: IndexMap::new(),
            listeners: Vec::new(),
            field_mapper: None,
            settings: MapperSettings::default(),
        }
    }

    /// Use an in-memory rule registry
    pub fn class_mappings(self, mappings: ClassMappings) -> Self {
        self.rule_registry(Arc::new(mappings))
    }

    /// Use a custom rule registry
    pub fn rule_registry(mut self, registry: Arc<dyn RuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use a custom accessor resolver
    pub fn accessor_resolver(mut self, accessors: Arc<dyn AccessorResolver>) -> Self {
        self.accessors = Some(accessors);
        self
    }

    /// Use a custom destination builder
    pub fn destination_builder(mut self, builder: Arc<dyn DestinationBuilder>) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Use a custom cache manager
    ///
    /// The manager must not hold the engine's caches yet, so one manager
    /// cannot back two mappers.
    pub fn cache_manager(mut self, caches: Arc<dyn CacheManager>) -> Self {
        self.caches = Some(caches);
        self
    }

    /// Register a converter for a type pair
    pub fn converter(mut self, registration: ConverterRegistration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Register a converter under an id for use by field rules
    pub fn converter_with_id<C>(mut self, id: impl Into<String>, converter: C) -> Self
    where
        C: CustomConverter + 'static,
    {
        self.by_id.insert(id.into(), Arc::new(converter));
        self
    }

    /// Add an event listener; listeners run in the order they are added
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: MappingEventListener + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Add a shared event listener
    pub fn shared_listener(mut self, listener: Arc<dyn MappingEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Install the implicit-field hook
    pub fn custom_field_mapper(mut self, field_mapper: Arc<dyn CustomFieldMapper>) -> Self {
        self.field_mapper = Some(field_mapper);
        self
    }

    /// Install a closure as the implicit-field hook
    pub fn field_hook<F>(self, hook: F) -> Self
    where
        F: Fn(&FieldHookRequest<'_>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.custom_field_mapper(Arc::new(hook))
    }

    /// Replace the settings
    pub fn settings(mut self, settings: MapperSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Assemble the mapper
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the cache manager rejects the
    /// engine's caches, for instance because a manager already used by
    /// another mapper has them registered.
    pub fn build(self) -> MappingResult<Mapper> {
        let catalog = self.catalog;
        let builder = self
            .builder
            .unwrap_or_else(|| Arc::new(CatalogDestinationBuilder::new(catalog.clone())));
        let accessors = self
            .accessors
            .unwrap_or_else(|| Arc::new(CatalogAccessorResolver::new(catalog.clone(), builder.clone())));
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ClassMappings::empty()));
        let caches = self
            .caches
            .unwrap_or_else(|| Arc::new(LruCacheManager::new()));

        for (name, size) in [
            (CONVERTER_BY_DEST_TYPE, self.settings.converter_cache_size),
            (SUPER_TYPE_CHECK, self.settings.super_type_cache_size),
        ] {
            caches.register_cache(name, size)?;
        }

        let converters = ConverterResolver::new(self.registrations, self.by_id, catalog.clone(), caches.clone());
        let notifier = EventNotifier::new(self.listeners, self.settings.listener_failures_fatal);
        debug!(
            converters = converters.registrations().len(),
            listeners = notifier.listeners().len(),
            "mapper assembled"
        );

        Ok(Mapper {
            inner: Arc::new(MapperInner {
                catalog,
                registry,
                accessors,
                builder,
                caches,
                converters,
                notifier,
                field_mapper: self.field_mapper,
                settings: self.settings,
                effective: DashMap::new(),
            }),
        })
    }
}

/// One top-level call in progress
pub(crate) struct MappingRun<'m> {
    inner: &'m MapperInner,
    ctx: MappingContext,
}

impl MappingRun<'_> {
    fn notify(&mut self, phase: Phase, event: MappingEvent<'_>) -> MappingResult<()> {
        if self.inner.notifier.is_empty() {
            return Ok(());
        }
        let scope = self.ctx.scope().map(str::to_string);
        let event = event.scope(scope.as_deref());
        self.inner
            .notifier
            .notify(phase, &event, self.ctx.failures_mut())
    }
}
