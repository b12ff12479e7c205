// Copyright (c) 2025 - Cowboy AI, LLC.

//! Mapping lifecycle notifications
//!
//! Listeners observe three nested levels of a mapping call: the call itself,
//! each object pair, and each field. Every level fires `before` and `after`.
//! Listeners run in registration order.
//!
//! A failing listener does not stop the others or the mapping. The failure is
//! logged and recorded on the call's [`MappingReport`](crate::MappingReport),
//! unless the mapper is configured to treat listener failures as fatal.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::errors::{MappingError, MappingResult};
use crate::rules::{ClassMapKey, FieldMap};
use crate::value::Value;

/// Level of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MappingEventKind {
    /// Top-level call
    Call,
    /// One source/destination object pair
    Object,
    /// One field
    Field,
}

/// Before or after the mapping step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// The step is about to run
    Before,
    /// The step completed
    After,
}

/// A notification delivered to listeners
#[derive(Debug, Clone, Copy)]
pub struct MappingEvent<'a> {
    /// Level of the step
    pub kind: MappingEventKind,
    /// Id of the top-level call
    pub call_id: Uuid,
    /// Active scope id
    pub scope: Option<&'a str>,
    /// Source object or field value
    pub source: &'a Value,
    /// Destination object; `Null` before a call has one
    pub destination: &'a Value,
    /// Class map in effect
    pub class_map: Option<&'a ClassMapKey>,
    /// Field rule being applied
    pub field_map: Option<&'a FieldMap>,
    /// Value written to the destination field, on field `after` events
    pub written: Option<&'a Value>,
}

impl<'a> MappingEvent<'a> {
    /// Event for a step without class map or field context
    pub fn new(kind: MappingEventKind, call_id: Uuid, source: &'a Value, destination: &'a Value) -> Self {
        Self {
            kind,
            call_id,
            scope: None,
            source,
            destination,
            class_map: None,
            field_map: None,
            written: None,
        }
    }

    /// Attach the scope id
    pub fn scope(mut self, scope: Option<&'a str>) -> Self {
        self.scope = scope;
        self
    }

    /// Attach the class map key
    pub fn class_map(mut self, key: &'a ClassMapKey) -> Self {
        self.class_map = Some(key);
        self
    }

    /// Attach the field rule
    pub fn field_map(mut self, field_map: &'a FieldMap) -> Self {
        self.field_map = Some(field_map);
        self
    }

    /// Attach the written value
    pub fn written(mut self, value: &'a Value) -> Self {
        self.written = Some(value);
        self
    }
}

/// Observer of mapping steps
pub trait MappingEventListener: Send + Sync {
    /// Called before a step
    fn before(&self, _event: &MappingEvent<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after a step
    fn after(&self, _event: &MappingEvent<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Name used in logs and failure records
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A listener failure recorded during a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationFailure {
    /// Listener name
    pub listener: String,
    /// Phase of the failing callback
    pub phase: Phase,
    /// Level of the event
    pub kind: MappingEventKind,
    /// Failure message
    pub message: String,
}

impl fmt::Display for NotificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "listener {} failed on {:?} {:?}: {}",
            self.listener, self.phase, self.kind, self.message
        )
    }
}

/// Delivers events to listeners in registration order
#[derive(Clone, Default)]
pub struct EventNotifier {
    listeners: Vec<Arc<dyn MappingEventListener>>,
    failures_fatal: bool,
}

impl EventNotifier {
    /// Create a notifier
    pub fn new(listeners: Vec<Arc<dyn MappingEventListener>>, failures_fatal: bool) -> Self {
        Self {
            listeners,
            failures_fatal,
        }
    }

    /// Registered listeners in invocation order
    pub fn listeners(&self) -> &[Arc<dyn MappingEventListener>] {
        &self.listeners
    }

    /// Check if no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver an event to every listener
    ///
    /// Failures are appended to `failures`.
    ///
    /// # Errors
    ///
    /// Returns a notification error on the first failure when failures are
    /// fatal.
    pub fn notify(
        &self,
        phase: Phase,
        event: &MappingEvent<'_>,
        failures: &mut Vec<NotificationFailure>,
    ) -> MappingResult<()> {
        for listener in &self.listeners {
            let outcome = match phase {
                Phase::Before => listener.before(event),
                Phase::After => listener.after(event),
            };
            let Err(err) = outcome else { continue };

            let failure = NotificationFailure {
                listener: listener.name().to_string(),
                phase,
                kind: event.kind,
                message: format!("{:#}", err),
            };
            warn!(call_id = %event.call_id, %failure, "mapping listener failed");
            if self.failures_fatal {
                return Err(MappingError::notification(failure.listener, failure.message));
            }
            failures.push(failure);
        }
        Ok(())
    }
}

impl fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventNotifier")
            .field(
                "listeners",
                &self.listeners.iter().map(|l| l.name()).collect::<Vec<_>>(),
            )
            .field("failures_fatal", &self.failures_fatal)
            .finish()
    }
}
