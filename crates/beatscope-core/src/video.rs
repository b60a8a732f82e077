use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One video as reported by the video API (or synthesized in demo mode).
///
/// Read-only once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVideoResult {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub published_at: DateTime<Utc>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}
