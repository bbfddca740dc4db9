//! Video link validity hint
//!
//! Lets the editor show whether the link typed next to an assignment will
//! render as an embed. Links are stored unvalidated; this is advisory only.

use axum::{extract::Query, Json};
use folio_common::video::VideoLink;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct VideoCheckResponse {
    pub valid: bool,
    pub video_id: Option<String>,
    pub embed_url: Option<String>,
}

/// GET /api/video?url=...
pub async fn check_video_link(Query(query): Query<VideoQuery>) -> Json<VideoCheckResponse> {
    let response = match VideoLink::parse(&query.url) {
        Some(link) => VideoCheckResponse {
            valid: true,
            video_id: Some(link.video_id),
            embed_url: Some(link.embed_url),
        },
        None => VideoCheckResponse {
            valid: false,
            video_id: None,
            embed_url: None,
        },
    };

    Json(response)
}
