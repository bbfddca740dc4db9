//! Assignment repository
//!
//! The single entry point for reading and changing assignments. Each mutation
//! runs the same protocol:
//! 1. apply the change to the in-memory collection (the result the caller sees)
//! 2. write the full collection to the local cache
//! 3. spawn the matching remote call and return without waiting for it
//!
//! Steps 1 and 2 happen under one lock so the cache always matches memory.
//! Remote failures are logged and published as events; local state is never
//! rolled back because of them.

use std::sync::Arc;

use folio_common::events::{EventBus, FolioEvent, SyncOperation};
use folio_common::model::{allocate_id, Assignment, AssignmentPatch, NewAssignment};
use folio_common::{time, Error, Result};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::LocalCacheStore;
use crate::remote::RemoteSync;

const EVENT_CAPACITY: usize = 256;

/// Result of a startup pull from the remote table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// Remote rows replaced the local collection
    Replaced(usize),
    /// Remote table is empty; local collection kept
    RemoteEmpty,
    /// Pull failed; local collection kept
    Failed,
    /// No remote configured
    Disabled,
}

/// Remote call queued by a mutation
#[derive(Debug, Clone)]
enum SyncRequest {
    Create(Assignment),
    Update(i64, AssignmentPatch),
    Delete(i64),
}

impl SyncRequest {
    fn operation(&self) -> SyncOperation {
        match self {
            SyncRequest::Create(_) => SyncOperation::Create,
            SyncRequest::Update(..) => SyncOperation::Update,
            SyncRequest::Delete(_) => SyncOperation::Delete,
        }
    }

    fn id(&self) -> i64 {
        match self {
            SyncRequest::Create(assignment) => assignment.id,
            SyncRequest::Update(id, _) | SyncRequest::Delete(id) => *id,
        }
    }
}

struct Inner {
    /// Authoritative collection; held while mutating and persisting
    assignments: Mutex<Vec<Assignment>>,
    /// Last committed collection, readable without the lock
    snapshot: watch::Sender<Vec<Assignment>>,
    cache: LocalCacheStore,
    remote: Option<Arc<dyn RemoteSync>>,
    events: EventBus,
}

/// Handle to the assignment collection
///
/// Clones share the same state.
#[derive(Clone)]
pub struct AssignmentRepository {
    inner: Arc<Inner>,
}

impl AssignmentRepository {
    /// Load the collection from the local cache (or the seed records)
    pub async fn open(cache: LocalCacheStore, remote: Option<Arc<dyn RemoteSync>>) -> Self {
        let assignments = cache.load().await;
        info!(
            count = assignments.len(),
            remote = remote.as_ref().map(|r| r.name()).unwrap_or("disabled"),
            "Assignment repository opened"
        );

        let (snapshot, _) = watch::channel(assignments.clone());

        Self {
            inner: Arc::new(Inner {
                assignments: Mutex::new(assignments),
                snapshot,
                cache,
                remote,
                events: EventBus::new(EVENT_CAPACITY),
            }),
        }
    }

    /// Current collection
    pub fn list(&self) -> Vec<Assignment> {
        self.inner.snapshot.borrow().clone()
    }

    /// Look up one record; no side effects
    pub fn get(&self, id: i64) -> Option<Assignment> {
        self.inner
            .snapshot
            .borrow()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    /// Receiver that observes every committed collection
    pub fn subscribe(&self) -> watch::Receiver<Vec<Assignment>> {
        self.inner.snapshot.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FolioEvent> {
        self.inner.events.subscribe()
    }

    pub fn remote_enabled(&self) -> bool {
        self.inner.remote.is_some()
    }

    /// Create a record with the next free id
    ///
    /// Returns once the record is in memory and the cache; the remote insert
    /// continues in the background. Fails without side effects when the
    /// largest id in use is `i64::MAX`.
    pub async fn create(&self, new: NewAssignment) -> Result<Assignment> {
        let created = {
            let mut assignments = self.inner.assignments.lock().await;
            let Some(id) = allocate_id(&assignments) else {
                warn!("No identifier left for a new assignment");
                return Err(Error::IdsExhausted(i64::MAX));
            };
            let created = Assignment::from_new(id, new);
            assignments.push(created.clone());
            self.commit(&assignments).await;
            created
        };

        debug!(id = created.id, title = %created.title, "Created assignment");
        self.inner.events.emit_lossy(FolioEvent::AssignmentCreated {
            assignment: created.clone(),
            timestamp: time::now(),
        });
        self.dispatch(SyncRequest::Create(created.clone()));

        Ok(created)
    }

    /// Merge `patch` into the record with `id`
    ///
    /// An unknown id is a no-op: nothing is persisted or synced and None is returned.
    pub async fn update(&self, id: i64, patch: AssignmentPatch) -> Option<Assignment> {
        let updated = {
            let mut assignments = self.inner.assignments.lock().await;
            let Some(assignment) = assignments.iter_mut().find(|a| a.id == id) else {
                debug!(id, "Update ignored, no such assignment");
                return None;
            };
            patch.apply(assignment);
            let updated = assignment.clone();
            self.commit(&assignments).await;
            updated
        };

        debug!(id, "Updated assignment");
        self.inner.events.emit_lossy(FolioEvent::AssignmentUpdated {
            assignment: updated.clone(),
            timestamp: time::now(),
        });
        self.dispatch(SyncRequest::Update(id, patch));

        Some(updated)
    }

    /// Remove the record with `id`; returns false (and does nothing) when absent
    pub async fn delete(&self, id: i64) -> bool {
        {
            let mut assignments = self.inner.assignments.lock().await;
            let before = assignments.len();
            assignments.retain(|a| a.id != id);
            if assignments.len() == before {
                debug!(id, "Delete ignored, no such assignment");
                return false;
            }
            self.commit(&assignments).await;
        }

        debug!(id, "Deleted assignment");
        self.inner.events.emit_lossy(FolioEvent::AssignmentDeleted {
            id,
            timestamp: time::now(),
        });
        self.dispatch(SyncRequest::Delete(id));

        true
    }

    /// Pull the remote table and, if it has rows, replace the local collection
    ///
    /// Remote wins wholesale: records that exist only locally are discarded.
    pub async fn hydrate(&self) -> HydrationOutcome {
        let Some(remote) = self.inner.remote.clone() else {
            debug!("Remote sync disabled, skipping hydration");
            return HydrationOutcome::Disabled;
        };

        let pulled = match remote.pull().await {
            Ok(pulled) => pulled,
            Err(e) => {
                warn!(remote = remote.name(), "Remote pull failed, keeping local assignments: {}", e);
                self.inner.events.emit_lossy(FolioEvent::RemoteSyncFailed {
                    operation: SyncOperation::Pull,
                    id: None,
                    error: e.to_string(),
                    timestamp: time::now(),
                });
                return HydrationOutcome::Failed;
            }
        };

        if pulled.is_empty() {
            info!(remote = remote.name(), "Remote table is empty, keeping local assignments");
            return HydrationOutcome::RemoteEmpty;
        }

        let count = pulled.len();
        {
            let mut assignments = self.inner.assignments.lock().await;
            *assignments = pulled;
            self.commit(&assignments).await;
        }

        info!(remote = remote.name(), count, "Replaced local assignments with remote rows");
        self.inner.events.emit_lossy(FolioEvent::CollectionHydrated {
            count,
            timestamp: time::now(),
        });

        HydrationOutcome::Replaced(count)
    }

    /// Run `hydrate` in a detached task
    pub fn spawn_hydration(&self) -> JoinHandle<HydrationOutcome> {
        let repository = self.clone();
        tokio::spawn(async move { repository.hydrate().await })
    }

    /// Persist and publish; caller holds the collection lock
    async fn commit(&self, assignments: &[Assignment]) {
        if let Err(e) = self.inner.cache.save(assignments).await {
            warn!(key = self.inner.cache.key(), "Failed to persist assignments: {}", e);
        }
        self.inner.snapshot.send_replace(assignments.to_vec());
    }

    /// Fire the remote call for a mutation without waiting for it
    fn dispatch(&self, request: SyncRequest) {
        let Some(remote) = self.inner.remote.clone() else {
            return;
        };
        let events = self.inner.events.clone();

        tokio::spawn(async move {
            let operation = request.operation();
            let id = request.id();

            let result = match &request {
                SyncRequest::Create(assignment) => remote.push_create(assignment).await,
                SyncRequest::Update(id, patch) => remote.push_update(*id, patch).await,
                SyncRequest::Delete(id) => remote.push_delete(*id).await,
            };

            match result {
                Ok(()) => debug!(remote = remote.name(), %operation, id, "Remote sync succeeded"),
                Err(e) => {
                    warn!(remote = remote.name(), %operation, id, "Remote sync failed: {}", e);
                    events.emit_lossy(FolioEvent::RemoteSyncFailed {
                        operation,
                        id: Some(id),
                        error: e.to_string(),
                        timestamp: time::now(),
                    });
                }
            }
        });
    }
}
