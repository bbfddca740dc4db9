//! Video link normalization
//!
//! Turns the free-form link a user typed next to an assignment into a YouTube
//! video id. Matching never fails loudly: an unrecognized link is simply `None`,
//! and callers decide not to render an embed.
//!
//! Recognized forms, in priority order:
//! - `youtube.com/shorts/<id>`
//! - `youtube.com/watch?v=<id>`, `youtu.be/<id>`, `youtube.com/embed/<id>`, `youtube.com/v/<id>`
//! - a bare 11 character id made of letters, digits, `-` and `_`
//!
//! For the URL forms the id runs until the first `&`, `?`, `#` or newline.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const EMBED_BASE_URL: &str = "https://www.youtube.com/embed/";

static SHORTS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtube\.com/shorts/([^&\n?#]+)").expect("valid shorts pattern"));

static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)([^&\n?#]+)",
    )
    .expect("valid link pattern")
});

static BARE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid bare id pattern"));

/// Extract a YouTube video id from a link or bare id
///
/// Returns `None` for blank input and for anything that matches none of the
/// recognized forms.
pub fn extract_video_id(raw: &str) -> Option<String> {
    let url = raw.trim();
    if url.is_empty() {
        return None;
    }

    for pattern in [&*SHORTS_PATTERN, &*LINK_PATTERN] {
        if let Some(id) = pattern.captures(url).and_then(|c| c.get(1)) {
            return Some(id.as_str().to_string());
        }
    }

    if BARE_ID_PATTERN.is_match(url) {
        return Some(url.to_string());
    }

    None
}

/// Embeddable player URL for a video id
///
/// The id is not validated here; that is `extract_video_id`'s job.
pub fn embed_url(video_id: &str) -> String {
    format!("{EMBED_BASE_URL}{video_id}")
}

/// A recognized video link, ready for embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoLink {
    pub video_id: String,
    pub embed_url: String,
}

impl VideoLink {
    pub fn parse(raw: &str) -> Option<Self> {
        extract_video_id(raw).map(|video_id| Self {
            embed_url: embed_url(&video_id),
            video_id,
        })
    }
}
