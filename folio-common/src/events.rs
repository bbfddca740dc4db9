//! Event types for the Folio event system
//!
//! Repository mutations and sync outcomes are published as `FolioEvent`s so the
//! presentation layer can re-render without polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::Assignment;

/// Remote operation that a sync attempt was mirroring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Pull,
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncOperation::Pull => "pull",
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Folio event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FolioEvent {
    /// A record was created locally
    AssignmentCreated {
        assignment: Assignment,
        timestamp: DateTime<Utc>,
    },

    /// A record was changed locally
    AssignmentUpdated {
        assignment: Assignment,
        timestamp: DateTime<Utc>,
    },

    /// A record was removed locally
    AssignmentDeleted { id: i64, timestamp: DateTime<Utc> },

    /// The local collection was replaced by the remote table contents
    CollectionHydrated {
        /// Number of records now held
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A best-effort remote call failed; local state was kept
    RemoteSyncFailed {
        operation: SyncOperation,
        /// Record the call concerned (None for pull)
        id: Option<i64>,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl FolioEvent {
    /// Variant name, used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            FolioEvent::AssignmentCreated { .. } => "AssignmentCreated",
            FolioEvent::AssignmentUpdated { .. } => "AssignmentUpdated",
            FolioEvent::AssignmentDeleted { .. } => "AssignmentDeleted",
            FolioEvent::CollectionHydrated { .. } => "CollectionHydrated",
            FolioEvent::RemoteSyncFailed { .. } => "RemoteSyncFailed",
        }
    }
}

/// Central event distribution bus
///
/// Wraps a tokio broadcast channel: publishing never blocks, slow subscribers
/// observe a lag error instead of holding up producers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FolioEvent>,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<FolioEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: FolioEvent) {
        let _ = self.tx.send(event);
    }
}
