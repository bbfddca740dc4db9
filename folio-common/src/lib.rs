//! # Folio Common Library
//!
//! Shared code for the Folio portfolio services including:
//! - Assignment record model and identifier allocation
//! - Video link normalization
//! - Event types (FolioEvent enum) and EventBus
//! - Configuration loading
//! - SQLite initialization for the local cache

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod model;
pub mod time;
pub mod video;

pub use error::{Error, Result};
pub use model::{allocate_id, Assignment, AssignmentPatch, NewAssignment};
pub use video::{embed_url, extract_video_id, VideoLink};
