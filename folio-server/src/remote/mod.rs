//! Remote sync adapter
//!
//! Mirrors local mutations to a hosted record table and hydrates the local
//! cache from it. Every call is attempted exactly once; failures come back as
//! `RemoteError` values for the repository to log.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use folio_common::model::{Assignment, AssignmentPatch};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

mod supabase;

pub use supabase::SupabaseClient;

/// Remote sync errors
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Best-effort bridge to the remote record table
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Name used in log lines
    fn name(&self) -> &'static str;

    /// All remote rows, newest first
    async fn pull(&self) -> Result<Vec<Assignment>, RemoteError>;

    async fn push_create(&self, assignment: &Assignment) -> Result<(), RemoteError>;

    async fn push_update(&self, id: i64, patch: &AssignmentPatch) -> Result<(), RemoteError>;

    async fn push_delete(&self, id: i64) -> Result<(), RemoteError>;
}

/// Empty optional text is stored as NULL remotely
fn nullable(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Accept `timestamptz` and plain `timestamp` renderings; anything else is dropped
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|t| t.and_utc())
            })
    }))
}

/// Row as read from the remote table
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteRow {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub section: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
}

impl From<RemoteRow> for Assignment {
    fn from(row: RemoteRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            section: row.section,
            description: row.description.unwrap_or_default(),
            content: row.content.unwrap_or_default(),
            youtube_url: row.youtube_url.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insert body; the locally allocated id is sent so later updates address the same row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteInsert {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub section: String,
    pub content: Option<String>,
    pub youtube_url: Option<String>,
}

impl From<&Assignment> for RemoteInsert {
    fn from(assignment: &Assignment) -> Self {
        Self {
            id: assignment.id,
            title: assignment.title.clone(),
            description: nullable(&assignment.description),
            section: assignment.section.clone(),
            content: nullable(&assignment.content),
            youtube_url: nullable(&assignment.youtube_url),
        }
    }
}

/// Update body carrying only the patched columns
///
/// For the nullable columns the outer `Option` says whether the column is
/// written, the inner one whether it is written as NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<Option<String>>,
}

impl From<&AssignmentPatch> for RemoteUpdate {
    fn from(patch: &AssignmentPatch) -> Self {
        Self {
            title: patch.title.clone(),
            description: patch.description.as_deref().map(nullable),
            section: patch.section.clone(),
            content: patch.content.as_deref().map(nullable),
            youtube_url: patch.youtube_url.as_deref().map(nullable),
        }
    }
}
