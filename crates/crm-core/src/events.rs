//! Directory change events and the broadcast bus that carries them.
//!
//! Rendering code subscribes to the bus and re-reads the directory snapshot
//! when something changed. Events are notifications only; they never carry
//! the records themselves.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::tenant::OrganizationId;

/// Something observable happened to the contact directory.
///
/// Serialized with a `type` tag, e.g.
/// `{"type":"Loaded","organization_id":"acme","count":2}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DirectoryEvent {
    /// A load for the tenant began; `loading` is now true.
    LoadStarted { organization_id: OrganizationId },
    /// Records were replaced with the tenant's fresh set.
    Loaded {
        organization_id: OrganizationId,
        count: usize,
    },
    /// No tenant is active; the directory was emptied.
    Cleared,
    /// A load finished after a newer one was requested; its result was dropped.
    LoadSuperseded { organization_id: OrganizationId },
    /// The load source failed.
    LoadFailed {
        organization_id: OrganizationId,
        error: String,
    },
    /// A locally created contact was prepended.
    ContactInserted {
        organization_id: OrganizationId,
        contact_id: String,
    },
    /// The remote store confirmed an update. Local records are unchanged.
    ContactUpdated { contact_id: String },
}

impl DirectoryEvent {
    /// Dot-namespaced event type, e.g. `"directory.loaded"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::LoadStarted { .. } => "directory.load_started",
            Self::Loaded { .. } => "directory.loaded",
            Self::Cleared => "directory.cleared",
            Self::LoadSuperseded { .. } => "directory.load_superseded",
            Self::LoadFailed { .. } => "directory.load_failed",
            Self::ContactInserted { .. } => "contact.inserted",
            Self::ContactUpdated { .. } => "contact.updated",
        }
    }

    pub fn organization_id(&self) -> Option<&OrganizationId> {
        match self {
            Self::LoadStarted { organization_id }
            | Self::Loaded {
                organization_id, ..
            }
            | Self::LoadSuperseded { organization_id }
            | Self::LoadFailed {
                organization_id, ..
            }
            | Self::ContactInserted {
                organization_id, ..
            } => Some(organization_id),
            Self::Cleared | Self::ContactUpdated { .. } => None,
        }
    }
}

/// Envelope stamped on every emitted event.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    pub event_type: &'static str,
    pub occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
    pub payload: DirectoryEvent,
}

impl EventEnvelope {
    pub fn new(event: DirectoryEvent) -> Self {
        Self {
            event_id: crate::uuid_utils::new_v7(),
            event_type: event.event_type(),
            occurred_at: Utc::now(),
            organization_id: event.organization_id().cloned(),
            payload: event,
        }
    }
}

/// Broadcast bus for [`DirectoryEvent`]s.
///
/// Cheap to clone; all clones share one channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event to all subscribers.
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub fn emit(&self, event: DirectoryEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::trace!(
            event_type = envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive events. Each subscriber gets its own stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
