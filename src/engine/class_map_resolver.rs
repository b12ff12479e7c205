// Copyright 2025 Cowboy AI, LLC.

//! Effective rule sets
//!
//! The field list applied to an object pair combines, in order: the class
//! map's own field rules, rules inherited from class maps of ancestor pairs,
//! and same-named properties matched implicitly. A destination field is
//! mapped once; the first rule naming it wins. Resolutions are memoized per
//! `(source, destination, scope)` on the mapper.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

use super::MapperInner;
use crate::errors::{MappingError, MappingResult};
use crate::rules::{ClassMap, ClassMapKey, EffectivePolicies, FieldMap};
use crate::types::TypeRef;

/// A field rule with its origin
#[derive(Debug, Clone)]
pub(crate) struct ResolvedField {
    pub rule: FieldMap,
    /// Matched by name rather than declared
    pub implicit: bool,
}

/// Rule set applied to one object pair
#[derive(Debug)]
pub(crate) struct EffectiveClassMap {
    pub key: ClassMapKey,
    pub policies: EffectivePolicies,
    /// Date format set on the class map itself
    pub class_date_format: Option<String>,
    pub fields: Vec<ResolvedField>,
}

impl MapperInner {
    pub(super) fn effective_class_map(
        &self,
        source: &str,
        destination: &str,
        scope: Option<&str>,
    ) -> MappingResult<Arc<EffectiveClassMap>> {
        let key = ClassMapKey::new(source, destination, scope);
        if let Some(found) = self.effective.get(&key).map(|e| e.value().clone()) {
            return Ok(found);
        }
        let resolved = Arc::new(self.resolve_class_map(key.clone())?);
        self.effective.insert(key, resolved.clone());
        Ok(resolved)
    }

    fn resolve_class_map(&self, key: ClassMapKey) -> MappingResult<EffectiveClassMap> {
        let source = key.source.as_str();
        let destination = key.destination.as_str();
        let own = self.registry.lookup(source, destination, key.scope.as_deref());
        if own.is_none() {
            if let Some(scope) = &key.scope {
                return Err(MappingError::configuration(format!(
                    "no class map from {} to {} for scope '{}'",
                    source, destination, scope
                )));
            }
        }
        let class_map = match own {
            Some(cm) => cm,
            None => Arc::new(ClassMap::new(source, destination)),
        };
        let policies = class_map.policies(self.registry.defaults());

        let mut covered: HashSet<String> = HashSet::new();
        let mut fields = Vec::new();
        let mut declare = |rule: &FieldMap, fields: &mut Vec<ResolvedField>| {
            if covered.insert(rule.destination.clone()) && !rule.excluded {
                fields.push(ResolvedField {
                    rule: rule.clone(),
                    implicit: false,
                });
            }
        };
        for rule in &class_map.field_maps {
            declare(rule, &mut fields);
        }
        for inherited in self.ancestor_class_maps(source, destination) {
            trace!(class_map = %inherited.key(), "inheriting field rules");
            for rule in &inherited.field_maps {
                declare(rule, &mut fields);
            }
        }

        if policies.wildcard {
            let source_props = self.accessors.properties(source)?;
            for (name, destination_type) in self.accessors.properties(destination)? {
                // declared and excluded destinations are closed to implicit matching
                if covered.contains(&name) {
                    continue;
                }
                let matched = source_props
                    .iter()
                    .find(|(s, _)| *s == name)
                    .or_else(|| {
                        policies
                            .wildcard_case_insensitive
                            .then(|| source_props.iter().find(|(s, _)| s.eq_ignore_ascii_case(&name)))
                            .flatten()
                    });
                let Some((source_name, source_type)) = matched else {
                    continue;
                };
                if !compatible(source_type, &destination_type) {
                    trace!(field = %name, %source_type, %destination_type, "skipping incompatible implicit field");
                    continue;
                }
                fields.push(ResolvedField {
                    rule: FieldMap::new(source_name.clone(), name),
                    implicit: true,
                });
            }
        }

        debug!(class_map = %key, fields = fields.len(), "resolved effective class map");
        Ok(EffectiveClassMap {
            key,
            class_date_format: class_map.date_format.clone(),
            policies,
            fields,
        })
    }

    /// Unscoped class maps registered for ancestor pairs, nearest first
    fn ancestor_class_maps(&self, source: &str, destination: &str) -> Vec<Arc<ClassMap>> {
        let mut sources = vec![(source.to_string(), 0u32)];
        sources.extend(self.catalog.ancestors(source));
        let mut destinations = vec![(destination.to_string(), 0u32)];
        destinations.extend(self.catalog.ancestors(destination));

        let mut found = Vec::new();
        for (s, ds) in &sources {
            for (d, dd) in &destinations {
                if ds + dd == 0 {
                    continue;
                }
                if let Some(cm) = self.registry.lookup(s, d, None) {
                    found.push((ds + dd, *ds, cm));
                }
            }
        }
        found.sort_by_key(|(total, ds, _)| (*total, *ds));
        found.into_iter().map(|(_, _, cm)| cm).collect()
    }

    /// Concrete class to instantiate for a declared destination class
    ///
    /// A non-instantiable declared class is replaced by the destination of a
    /// class map from the source class (or an ancestor) to one of its
    /// instantiable subclasses. Without such a class map the declared class
    /// is kept and the destination builder decides how to create it.
    pub(super) fn concrete_destination(
        &self,
        source_class: &str,
        declared: &str,
        scope: Option<&str>,
    ) -> MappingResult<String> {
        match self.catalog.class(declared) {
            Some(descriptor) if !descriptor.instantiable => {}
            _ => return Ok(declared.to_string()),
        }

        let mut sources = vec![(source_class.to_string(), 0u32)];
        sources.extend(self.catalog.ancestors(source_class));
        for (source, _) in &sources {
            let candidate = self.registry.by_source(source).into_iter().find(|cm| {
                cm.scope.as_deref() == scope
                    && self
                        .catalog
                        .class(&cm.destination)
                        .is_some_and(|c| c.instantiable)
                    && self.catalog.distance(&cm.destination, declared).is_some()
            });
            if let Some(cm) = candidate {
                debug!(declared, concrete = %cm.destination, "selected polymorphic destination");
                return Ok(cm.destination.clone());
            }
        }
        trace!(declared, source = source_class, "no subclass class map, deferring to destination builder");
        Ok(declared.to_string())
    }

    /// Destination class for an object written into an `Any` slot
    ///
    /// The single class map from the source class in this scope decides;
    /// without one the object is copied into its own class when that class
    /// is instantiable.
    pub(super) fn inferred_destination(&self, source_class: &str, scope: Option<&str>) -> Option<String> {
        let candidates: Vec<_> = self
            .registry
            .by_source(source_class)
            .into_iter()
            .filter(|cm| cm.scope.as_deref() == scope)
            .collect();
        if let [only] = candidates.as_slice() {
            return Some(only.destination.clone());
        }
        self.catalog
            .class(source_class)
            .filter(|c| c.instantiable)
            .map(|c| c.name.clone())
    }

    /// Whether a class map writing to `destination` accepts `Null` sources
    pub(super) fn accepts_null_source(&self, destination: &str, scope: Option<&str>) -> bool {
        self.registry
            .by_destination(destination)
            .iter()
            .any(|cm| cm.map_null_source && cm.scope.as_deref() == scope)
    }
}

/// Whether implicit matching may pair properties of these types
pub(crate) fn compatible(source: &TypeRef, destination: &TypeRef) -> bool {
    match (source, destination) {
        (TypeRef::Any, _) | (_, TypeRef::Any) => true,
        (s, d) if s.is_scalar() && d.is_scalar() => true,
        (TypeRef::Class(_), TypeRef::Class(_) | TypeRef::Map(_, _)) => true,
        (TypeRef::Map(_, _), TypeRef::Class(_)) => true,
        (TypeRef::Map(sk, sv), TypeRef::Map(dk, dv)) => compatible(sk, dk) && compatible(sv, dv),
        (s, d) if s.is_sequence() && d.is_sequence() => match (s.element_type(), d.element_type()) {
            (Some(se), Some(de)) => compatible(se, de),
            _ => false,
        },
        _ => false,
    }
}
