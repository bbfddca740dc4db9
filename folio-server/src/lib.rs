//! folio-server library - assignment persistence and sync service
//!
//! Hosts the assignment repository (local cache + best-effort remote sync) and
//! exposes it over HTTP for the portfolio front end.

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cache;
pub mod remote;
pub mod repository;

pub use cache::LocalCacheStore;
pub use repository::{AssignmentRepository, HydrationOutcome};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: AssignmentRepository,
}

impl AppState {
    pub fn new(repository: AssignmentRepository) -> Self {
        Self { repository }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let api = Router::new()
        .route(
            "/api/assignments",
            get(api::list_assignments).post(api::create_assignment),
        )
        .route(
            "/api/assignments/:id",
            get(api::get_assignment)
                .patch(api::update_assignment)
                .delete(api::delete_assignment),
        )
        .route("/api/video", get(api::check_video_link))
        .route("/api/events", get(api::event_stream));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
