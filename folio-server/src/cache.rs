//! Local cache store
//!
//! Holds the whole assignment collection as one JSON array in a single row of
//! the `settings` table. Every save rewrites the row; there are no partial writes.

use folio_common::model::{seed_assignments, Assignment};
use folio_common::Result;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Durable slot for the serialized assignment collection
#[derive(Clone)]
pub struct LocalCacheStore {
    db: SqlitePool,
    key: String,
}

impl LocalCacheStore {
    pub fn new(db: SqlitePool, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last persisted collection, or the seed collection
    ///
    /// Never fails: a missing slot, a read error and an unparsable payload all
    /// fall back to the seed records.
    pub async fn load(&self) -> Vec<Assignment> {
        let payload: Option<Option<String>> =
            match sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
                .bind(&self.key)
                .fetch_optional(&self.db)
                .await
            {
                Ok(row) => row,
                Err(e) => {
                    warn!(key = %self.key, "Failed to read local cache, using seed records: {}", e);
                    return seed_assignments();
                }
            };

        let Some(payload) = payload.flatten() else {
            info!(key = %self.key, "No cached assignments, using seed records");
            return seed_assignments();
        };

        match serde_json::from_str::<Vec<Assignment>>(&payload) {
            Ok(assignments) => {
                debug!(key = %self.key, count = assignments.len(), "Loaded cached assignments");
                assignments
            }
            Err(e) => {
                warn!(key = %self.key, "Cached assignments are unreadable, using seed records: {}", e);
                seed_assignments()
            }
        }
    }

    /// Overwrite the slot with the full collection
    pub async fn save(&self, assignments: &[Assignment]) -> Result<()> {
        let payload = serde_json::to_string(assignments)?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.key)
        .bind(&payload)
        .execute(&self.db)
        .await?;

        debug!(key = %self.key, count = assignments.len(), "Saved assignments to local cache");
        Ok(())
    }
}
