//! Event infrastructure for editing sessions.
//!
//! `ArtifactEvent` is what the live surface and any observers react to.
//! Content pushes carry their provenance, so a surface can tag its own
//! mutation as remote and keep it out of the save path.

use crate::document::{DocumentId, Status};
use crate::metadata::Metadata;
use crate::reconciler::Provenance;
use crate::session::Mode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Events emitted by an editing session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ArtifactEvent {
    /// Live content changed.
    #[serde(rename_all = "camelCase")]
    ContentApplied {
        document_id: DocumentId,
        content: String,
        provenance: Provenance,
        status: Status,
    },
    /// Producer started or finished.
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        document_id: DocumentId,
        status: Status,
    },
    /// A version was durably committed.
    #[serde(rename_all = "camelCase")]
    VersionCommitted {
        document_id: DocumentId,
        index: usize,
        /// Creation time in milliseconds since Unix epoch.
        timestamp: u64,
    },
    /// Commit failed; pending content is kept for retry.
    #[serde(rename_all = "camelCase")]
    CommitFailed {
        document_id: DocumentId,
        error: String,
    },
    /// History cursor moved.
    #[serde(rename_all = "camelCase")]
    Navigated {
        document_id: DocumentId,
        index: usize,
        is_current_version: bool,
    },
    /// Edit/diff mode toggled.
    #[serde(rename_all = "camelCase")]
    ModeChanged { document_id: DocumentId, mode: Mode },
    /// UI metadata updated.
    #[serde(rename_all = "camelCase")]
    MetadataChanged {
        document_id: DocumentId,
        metadata: Metadata,
    },
}

type Listener = Arc<dyn Fn(&ArtifactEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_key: u64,
    by_key: BTreeMap<u64, Listener>,
}

/// Fan-out of session events to listeners, in subscription order.
///
/// Listeners are removed when their [`Subscription`] is dropped. Hold the bus
/// in an `Arc`; subscriptions keep only a weak reference to it.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Listeners>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&ArtifactEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut listeners = self.lock();
        let key = listeners.next_key;
        listeners.next_key += 1;
        listeners.by_key.insert(key, Arc::new(listener));

        Subscription {
            bus: Arc::downgrade(self),
            key,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.lock().by_key.len()
    }

    /// Deliver an event to every listener.
    ///
    /// The lock is released before listeners run, so a listener may subscribe
    /// or drop a subscription.
    pub fn emit(&self, event: ArtifactEvent) {
        let listeners: Vec<Listener> = self.lock().by_key.values().cloned().collect();
        for listener in listeners {
            listener(&event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<EventBus>,
    key: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.lock().by_key.remove(&self.key);
        }
    }
}
