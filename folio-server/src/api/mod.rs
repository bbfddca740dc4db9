//! HTTP API handlers for folio-server

pub mod assignments;
pub mod health;
pub mod sse;
pub mod video;

pub use assignments::{
    create_assignment, delete_assignment, get_assignment, list_assignments, update_assignment,
};
pub use health::health_routes;
pub use sse::event_stream;
pub use video::check_video_link;
