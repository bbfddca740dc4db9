//! Assignment record model
//!
//! The assignment is the only entity Folio stores. Locally it is serialized as
//! part of a JSON array using camelCase field names (`youtubeUrl`); the remote
//! table uses snake_case columns and is mapped in the server's remote adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Description given to records created without one
pub const DEFAULT_DESCRIPTION: &str = "Content coming soon...";

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

/// A portfolio assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Client-allocated identifier, immutable after creation
    pub id: i64,
    pub title: String,
    /// Free text grouping label
    pub section: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// Rich text markup, rendered verbatim by the presentation layer
    #[serde(default)]
    pub content: String,
    /// Raw user input; validated only where it is rendered
    #[serde(default)]
    pub youtube_url: String,
    /// Only present for records hydrated from the remote table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Build a record from creation input, filling defaults for absent optional fields
    pub fn from_new(id: i64, new: NewAssignment) -> Self {
        let description = new
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(default_description);

        Self {
            id,
            title: new.title,
            section: new.section,
            description,
            content: new.content.unwrap_or_default(),
            youtube_url: new.youtube_url.unwrap_or_default(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Input for creating an assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    pub title: String,
    pub section: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
}

impl NewAssignment {
    pub fn new(title: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            section: section.into(),
            ..Default::default()
        }
    }

    /// Check the fields the editing surface requires before offering "create"
    ///
    /// Title and section must both be non-blank.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }
        if self.section.trim().is_empty() {
            return Err(Error::InvalidInput("section must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Partial update of an assignment
///
/// Only fields that are `Some` are written; everything else is left as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

impl AssignmentPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.section.is_none()
            && self.description.is_none()
            && self.content.is_none()
            && self.youtube_url.is_none()
    }

    /// Merge this patch into `assignment` in place
    pub fn apply(&self, assignment: &mut Assignment) {
        if let Some(title) = &self.title {
            assignment.title.clone_from(title);
        }
        if let Some(section) = &self.section {
            assignment.section.clone_from(section);
        }
        if let Some(description) = &self.description {
            assignment.description.clone_from(description);
        }
        if let Some(content) = &self.content {
            assignment.content.clone_from(content);
        }
        if let Some(youtube_url) = &self.youtube_url {
            assignment.youtube_url.clone_from(youtube_url);
        }
    }
}

/// Next identifier for a new record: one past the largest existing id, or 1
///
/// Returns `None` once the largest id is `i64::MAX`. Only unique for a single
/// writer; concurrent clients may allocate the same id.
pub fn allocate_id(assignments: &[Assignment]) -> Option<i64> {
    assignments
        .iter()
        .map(|a| a.id)
        .fold(0, i64::max)
        .checked_add(1)
}

/// Collection used when nothing usable has been persisted yet
pub fn seed_assignments() -> Vec<Assignment> {
    (1..=2)
        .map(|n| Assignment {
            id: n,
            title: format!("Assignment {n}"),
            section: format!("Section {n}"),
            description: default_description(),
            content: String::new(),
            youtube_url: String::new(),
            created_at: None,
            updated_at: None,
        })
        .collect()
}
