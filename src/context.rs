// Copyright 2025 Cowboy AI, LLC.

//! Per-call mapping state
//!
//! A [`MappingContext`] lives for exactly one top-level call and is never
//! shared with another call. Its identity map associates each source object
//! (by identity, not equality) with the destination instance created for it,
//! per destination class. Destinations are registered before they are
//! populated, so a cycle that leads back to an object under construction
//! finds the instance and stops.

use std::collections::{HashMap, HashSet};
use tracing::trace;
use uuid::Uuid;

use crate::events::NotificationFailure;
use crate::value::{ObjectId, ObjectRef};

struct IdentityEntry {
    // keeps the source alive so its ObjectId cannot be reused within the call
    _source: ObjectRef,
    destination: ObjectRef,
}

/// Scratch state of one top-level mapping call
pub struct MappingContext {
    call_id: Uuid,
    scope: Option<String>,
    identity: HashMap<(ObjectId, String), IdentityEntry>,
    flattening: HashSet<ObjectId>,
    listener_failures: Vec<NotificationFailure>,
    objects_mapped: usize,
}

impl MappingContext {
    /// Fresh context for a call
    pub fn new(scope: Option<&str>) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            scope: scope.map(str::to_string),
            identity: HashMap::new(),
            flattening: HashSet::new(),
            listener_failures: Vec::new(),
            objects_mapped: 0,
        }
    }

    /// Id of the call, also recorded on its tracing span
    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    /// Scope id of the top-level call
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Destination already created for a source object and destination class
    pub fn mapped(&self, source: &ObjectRef, destination_class: &str) -> Option<ObjectRef> {
        self.identity
            .get(&(source.id(), destination_class.to_string()))
            .map(|entry| entry.destination.clone())
    }

    /// Record the destination of a source object before populating it
    pub fn register(&mut self, source: &ObjectRef, destination_class: &str, destination: &ObjectRef) {
        trace!(source = %source.id(), destination = %destination.id(), "registered identity");
        self.identity.insert(
            (source.id(), destination_class.to_string()),
            IdentityEntry {
                _source: source.clone(),
                destination: destination.clone(),
            },
        );
        self.objects_mapped += 1;
    }

    /// Mark an object as being flattened into a map value
    ///
    /// Returns `false` when it already is, which means the graph is cyclic.
    pub fn enter_flattening(&mut self, source: &ObjectRef) -> bool {
        self.flattening.insert(source.id())
    }

    /// Unmark an object flattened into a map value
    pub fn exit_flattening(&mut self, source: &ObjectRef) {
        self.flattening.remove(&source.id());
    }

    /// Record a non-fatal listener failure
    pub fn failures_mut(&mut self) -> &mut Vec<NotificationFailure> {
        &mut self.listener_failures
    }

    /// Listener failures recorded so far
    pub fn listener_failures(&self) -> &[NotificationFailure] {
        &self.listener_failures
    }

    /// Number of destination objects created or adopted
    pub fn objects_mapped(&self) -> usize {
        self.objects_mapped
    }

    /// Consume the context, keeping what the caller reports
    pub fn finish(self) -> (Vec<NotificationFailure>, usize) {
        (self.listener_failures, self.objects_mapped)
    }
}

impl std::fmt::Debug for MappingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingContext")
            .field("call_id", &self.call_id)
            .field("scope", &self.scope)
            .field("identities", &self.identity.len())
            .field("objects_mapped", &self.objects_mapped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_per_destination_class() {
        let mut ctx = MappingContext::new(Some("brief"));
        let source = ObjectRef::of("Node");
        let dest = ObjectRef::of("NodeDto");

        assert!(ctx.mapped(&source, "NodeDto").is_none());
        ctx.register(&source, "NodeDto", &dest);

        assert!(ctx.mapped(&source, "NodeDto").unwrap().ptr_eq(&dest));
        assert!(ctx.mapped(&source, "NodeView").is_none());
        assert!(ctx.mapped(&ObjectRef::of("Node"), "NodeDto").is_none());
        assert_eq!(ctx.objects_mapped(), 1);
        assert_eq!(ctx.scope(), Some("brief"));
    }

    #[test]
    fn test_flattening_detects_reentry() {
        let mut ctx = MappingContext::new(None);
        let node = ObjectRef::of("Node");
        assert!(ctx.enter_flattening(&node));
        assert!(!ctx.enter_flattening(&node));
        ctx.exit_flattening(&node);
        assert!(ctx.enter_flattening(&node));
    }

    #[test]
    fn test_calls_get_distinct_ids() {
        assert_ne!(MappingContext::new(None).call_id(), MappingContext::new(None).call_id());
    }
}
