// Copyright 2025 Cowboy AI, LLC.

//! Converter resolution
//!
//! Resolutions by type pair and supertype checks are memoized in the
//! mapper's [`CacheManager`] under [`CONVERTER_BY_DEST_TYPE`] and
//! [`SUPER_TYPE_CHECK`]. Registrations never change after construction, so a
//! cached outcome stays valid for the life of the resolver.

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::trace;

use super::{ConverterRegistration, CustomConverter};
use crate::cache::{CacheKey, CacheManager, CacheValue, CONVERTER_BY_DEST_TYPE, SUPER_TYPE_CHECK};
use crate::catalog::TypeCatalog;
use crate::errors::{MappingError, MappingResult};
use crate::types::TypeRef;

/// Distance of an `Any` pattern from any concrete type
pub const ANY_DISTANCE: u32 = 1000;

/// Selects converters for type pairs and answers supertype questions
pub struct ConverterResolver {
    registrations: Vec<ConverterRegistration>,
    by_id: IndexMap<String, Arc<dyn CustomConverter>>,
    catalog: Arc<TypeCatalog>,
    caches: Arc<dyn CacheManager>,
}

impl ConverterResolver {
    /// Create a resolver; the cache manager must hold the two resolver caches
    pub fn new(
        registrations: Vec<ConverterRegistration>,
        by_id: IndexMap<String, Arc<dyn CustomConverter>>,
        catalog: Arc<TypeCatalog>,
        caches: Arc<dyn CacheManager>,
    ) -> Self {
        Self {
            registrations,
            by_id,
            catalog,
            caches,
        }
    }

    /// Registrations in registration order
    pub fn registrations(&self) -> &[ConverterRegistration] {
        &self.registrations
    }

    /// Converters registered under an id
    pub fn converters_by_id(&self) -> &IndexMap<String, Arc<dyn CustomConverter>> {
        &self.by_id
    }

    /// Converter registered under `id`
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the id is not registered.
    pub fn resolve_by_id(&self, id: &str) -> MappingResult<Arc<dyn CustomConverter>> {
        self.by_id
            .get(id)
            .cloned()
            .ok_or_else(|| MappingError::configuration(format!("no converter registered with id '{}'", id)))
    }

    /// Most specific registration applicable to a type pair
    ///
    /// Scores are `(source distance + destination distance, registration
    /// index)`; the lowest score wins.
    pub fn resolve_by_type_pair(
        &self,
        source: &TypeRef,
        destination: &TypeRef,
    ) -> Option<&ConverterRegistration> {
        if self.registrations.is_empty() {
            return None;
        }
        let key = CacheKey::TypePair(source.clone(), destination.clone());
        match self.caches.get(CONVERTER_BY_DEST_TYPE, &key) {
            Some(CacheValue::Converter(index)) => return self.registrations.get(index),
            Some(CacheValue::NoMatch) => return None,
            _ => {}
        }

        let best = self.scan(source, destination);
        let cached = match best {
            Some(index) => CacheValue::Converter(index),
            None => CacheValue::NoMatch,
        };
        trace!(%source, %destination, outcome = ?cached, "resolved converter");
        self.caches.put(CONVERTER_BY_DEST_TYPE, key, cached);
        best.and_then(|index| self.registrations.get(index))
    }

    fn scan(&self, source: &TypeRef, destination: &TypeRef) -> Option<usize> {
        let mut best: Option<(u32, usize)> = None;
        for (index, registration) in self.registrations.iter().enumerate() {
            let forward = self.pair_distance(&registration.source, &registration.destination, source, destination);
            let reverse = if registration.bidirectional {
                self.pair_distance(&registration.destination, &registration.source, source, destination)
            } else {
                None
            };
            let score = match (forward, reverse) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            if let Some(score) = score {
                if best.map_or(true, |(s, _)| score < s) {
                    best = Some((score, index));
                }
            }
        }
        best.map(|(_, index)| index)
    }

    fn pair_distance(
        &self,
        source_pattern: &TypeRef,
        destination_pattern: &TypeRef,
        source: &TypeRef,
        destination: &TypeRef,
    ) -> Option<u32> {
        Some(self.distance(source_pattern, source)? + self.distance(destination_pattern, destination)?)
    }

    /// Specificity distance of a pattern from a concrete type
    ///
    /// `Some(0)` for an exact match, inheritance hops for superclasses,
    /// [`ANY_DISTANCE`] for `Any`, `None` when the pattern does not apply.
    pub fn distance(&self, pattern: &TypeRef, actual: &TypeRef) -> Option<u32> {
        if pattern == actual {
            return Some(0);
        }
        if !self.is_supertype(pattern, actual) {
            return None;
        }
        match (pattern, actual) {
            (TypeRef::Any, _) => Some(ANY_DISTANCE),
            (TypeRef::Class(sup), TypeRef::Class(sub)) => self.catalog.distance(sub, sup),
            (TypeRef::List(p), TypeRef::List(a))
            | (TypeRef::Set(p), TypeRef::Set(a))
            | (TypeRef::Array(p), TypeRef::Array(a)) => self.distance(p, a),
            (TypeRef::Map(pk, pv), TypeRef::Map(ak, av)) => {
                Some(self.distance(pk, ak)? + self.distance(pv, av)?)
            }
            _ => None,
        }
    }

    /// Whether `supertype` accepts values of `subtype`
    pub fn is_supertype(&self, supertype: &TypeRef, subtype: &TypeRef) -> bool {
        if supertype == subtype || *supertype == TypeRef::Any {
            return true;
        }
        let key = CacheKey::TypePair(supertype.clone(), subtype.clone());
        if let Some(CacheValue::Relation(known)) = self.caches.get(SUPER_TYPE_CHECK, &key) {
            return known;
        }
        let related = match (supertype, subtype) {
            (TypeRef::Class(sup), TypeRef::Class(sub)) => self.catalog.distance(sub, sup).is_some(),
            (TypeRef::List(p), TypeRef::List(a))
            | (TypeRef::Set(p), TypeRef::Set(a))
            | (TypeRef::Array(p), TypeRef::Array(a)) => self.is_supertype(p, a),
            (TypeRef::Map(pk, pv), TypeRef::Map(ak, av)) => {
                self.is_supertype(pk, ak) && self.is_supertype(pv, av)
            }
            _ => false,
        };
        self.caches.put(SUPER_TYPE_CHECK, key, CacheValue::Relation(related));
        related
    }
}

impl std::fmt::Debug for ConverterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterResolver")
            .field("registrations", &self.registrations)
            .field("ids", &self.by_id.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LruCacheManager;
    use crate::catalog::ClassDescriptor;
    use crate::converter::{ConversionRequest, FnConverter};
    use crate::value::Value;

    fn constant(name: &'static str) -> FnConverter<impl Fn(&ConversionRequest<'_>) -> anyhow::Result<Value> + Send + Sync> {
        FnConverter::new(name, move |_req: &ConversionRequest<'_>| Ok(Value::from(name)))
    }

    fn resolver(registrations: Vec<ConverterRegistration>) -> ConverterResolver {
        let catalog = TypeCatalog::builder()
            .class(ClassDescriptor::new("Animal"))
            .class(ClassDescriptor::new("Dog").extends("Animal"))
            .class(ClassDescriptor::new("Puppy").extends("Dog"))
            .build()
            .unwrap();
        let caches = Arc::new(LruCacheManager::new());
        caches.register_cache(CONVERTER_BY_DEST_TYPE, 100).unwrap();
        caches.register_cache(SUPER_TYPE_CHECK, 100).unwrap();
        ConverterResolver::new(registrations, IndexMap::new(), Arc::new(catalog), caches)
    }

    fn winner(resolver: &ConverterResolver, source: TypeRef, destination: TypeRef) -> Option<String> {
        resolver
            .resolve_by_type_pair(&source, &destination)
            .map(|r| r.converter.name().to_string())
    }

    #[test]
    fn test_exact_match_beats_supertype_and_wildcard() {
        let resolver = resolver(vec![
            ConverterRegistration::new(TypeRef::Any, TypeRef::String, constant("any")),
            ConverterRegistration::new(TypeRef::class("Animal"), TypeRef::String, constant("animal")),
            ConverterRegistration::new(TypeRef::class("Dog"), TypeRef::String, constant("dog")),
        ]);

        assert_eq!(winner(&resolver, TypeRef::class("Dog"), TypeRef::String).as_deref(), Some("dog"));
        assert_eq!(winner(&resolver, TypeRef::class("Puppy"), TypeRef::String).as_deref(), Some("dog"));
        assert_eq!(winner(&resolver, TypeRef::class("Animal"), TypeRef::String).as_deref(), Some("animal"));
        assert_eq!(winner(&resolver, TypeRef::Bool, TypeRef::String).as_deref(), Some("any"));
        assert_eq!(winner(&resolver, TypeRef::Bool, TypeRef::Char), None);
    }

    #[test]
    fn test_ties_go_to_first_registration() {
        let resolver = resolver(vec![
            ConverterRegistration::new(TypeRef::class("Dog"), TypeRef::Any, constant("first")),
            ConverterRegistration::new(TypeRef::Any, TypeRef::String, constant("second")),
        ]);
        // both score ANY_DISTANCE
        assert_eq!(winner(&resolver, TypeRef::class("Dog"), TypeRef::String).as_deref(), Some("first"));
    }

    #[test]
    fn test_bidirectional_registration_matches_reverse_pair() {
        let resolver = resolver(vec![ConverterRegistration::new(
            TypeRef::Date,
            TypeRef::String,
            constant("date"),
        )
        .bidirectional()]);

        assert_eq!(winner(&resolver, TypeRef::String, TypeRef::Date).as_deref(), Some("date"));
        assert_eq!(winner(&resolver, TypeRef::Date, TypeRef::String).as_deref(), Some("date"));
    }

    #[test]
    fn test_outcomes_are_cached_and_consistent() {
        let resolver = resolver(vec![ConverterRegistration::new(
            TypeRef::class("Animal"),
            TypeRef::String,
            constant("animal"),
        )]);

        let first = winner(&resolver, TypeRef::class("Puppy"), TypeRef::String);
        let miss = winner(&resolver, TypeRef::Bool, TypeRef::String);
        for _ in 0..5 {
            assert_eq!(winner(&resolver, TypeRef::class("Puppy"), TypeRef::String), first);
            assert_eq!(winner(&resolver, TypeRef::Bool, TypeRef::String), miss);
        }
        let stats = resolver.caches.stats(CONVERTER_BY_DEST_TYPE).unwrap();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.hits, 10);
    }

    #[test]
    fn test_is_supertype() {
        let resolver = resolver(vec![]);
        assert!(resolver.is_supertype(&TypeRef::class("Animal"), &TypeRef::class("Puppy")));
        assert!(!resolver.is_supertype(&TypeRef::class("Puppy"), &TypeRef::class("Animal")));
        assert!(resolver.is_supertype(&TypeRef::Any, &TypeRef::i32()));
        assert!(resolver.is_supertype(
            &TypeRef::list(TypeRef::class("Dog")),
            &TypeRef::list(TypeRef::class("Puppy"))
        ));
        assert!(!resolver.is_supertype(&TypeRef::i64(), &TypeRef::i32()));
        assert_eq!(resolver.distance(&TypeRef::class("Animal"), &TypeRef::class("Puppy")), Some(2));
    }

    #[test]
    fn test_unknown_id_fails() {
        let resolver = resolver(vec![]);
        assert!(resolver.resolve_by_id("nope").err().unwrap().is_configuration());
    }
}
