//! YouTube Data API v3 request options and response types.
//!
//! Only the fields the pipeline reads are modelled. Statistics arrive as
//! decimal strings and any of them may be missing (hidden like counts, for
//! example); missing or unparsable counts become zero.

use beatscope_core::RawVideoResult;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Largest number of ids the `videos` endpoint accepts in one call.
pub const MAX_IDS_PER_DETAILS_CALL: usize = 50;

pub const DEFAULT_MAX_RESULTS: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOrder {
    #[default]
    Relevance,
    Date,
    ViewCount,
    Rating,
    Title,
}

impl SearchOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Date => "date",
            Self::ViewCount => "viewCount",
            Self::Rating => "rating",
            Self::Title => "title",
        }
    }
}

/// Options for a `search` call. `Default` gives 25 results by relevance
/// with no date or channel filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub max_results: u32,
    pub order: SearchOrder,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    pub channel_id: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            order: SearchOrder::Relevance,
            published_after: None,
            published_before: None,
            channel_id: None,
        }
    }
}

/// One page of search results.
///
/// Search responses carry no statistics, so live items have zero counts
/// until enriched through a details call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoSearchPage {
    pub items: Vec<RawVideoResult>,
    pub next_page_token: Option<String>,
}

impl VideoSearchPage {
    #[must_use]
    pub fn video_ids(&self) -> Vec<String> {
        self.items.iter().map(|v| v.video_id.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    pub id: SearchItemId,
    pub snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchItemId {
    /// Absent for channel or playlist hits.
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Snippet {
    pub title: String,
    #[serde(default)]
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
}

impl SearchItem {
    pub(crate) fn into_raw(self) -> Option<RawVideoResult> {
        let video_id = self.id.video_id?;
        Some(RawVideoResult {
            video_id,
            title: self.snippet.title,
            channel_name: self.snippet.channel_title,
            published_at: self.snippet.published_at,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// videos
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoItem {
    pub id: String,
    pub snippet: Snippet,
    #[serde(default)]
    pub statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Statistics {
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub like_count: Option<String>,
    #[serde(default)]
    pub comment_count: Option<String>,
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
}

impl VideoItem {
    pub(crate) fn into_raw(self) -> RawVideoResult {
        RawVideoResult {
            view_count: parse_count(self.statistics.view_count.as_deref()),
            like_count: parse_count(self.statistics.like_count.as_deref()),
            comment_count: parse_count(self.statistics.comment_count.as_deref()),
            video_id: self.id,
            title: self.snippet.title,
            channel_name: self.snippet.channel_title,
            published_at: self.snippet.published_at,
        }
    }
}
