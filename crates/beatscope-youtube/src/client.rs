//! HTTP client for the YouTube Data API v3.
//!
//! Wraps `reqwest` with API-key handling, status classification, and typed
//! response deserialization. A 403 surfaces as [`YoutubeError::QuotaExceeded`]
//! and any other non-2xx status as [`YoutubeError::UnexpectedStatus`]. Error
//! contexts name the endpoint and query, never the full URL, so the key stays
//! out of logs.

use std::time::Duration;

use beatscope_core::RawVideoResult;
use reqwest::{Client, StatusCode, Url};

use crate::error::YoutubeError;
use crate::types::{
    SearchListResponse, SearchOptions, VideoListResponse, VideoSearchPage,
    MAX_IDS_PER_DETAILS_CALL,
};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Client for the live YouTube Data API.
///
/// Use [`YoutubeClient::new`] for production or
/// [`YoutubeClient::with_base_url`] to point at a mock server in tests.
pub struct YoutubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl YoutubeClient {
    /// Creates a new client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, YoutubeError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`YoutubeError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, YoutubeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("beatscope/0.1 (trend-research)")
            .build()?;

        // Exactly one trailing slash, so `join("search")` appends a segment
        // instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| YoutubeError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Searches for videos matching `query`.
    ///
    /// # Errors
    ///
    /// - [`YoutubeError::QuotaExceeded`] on HTTP 403.
    /// - [`YoutubeError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`YoutubeError::Http`] on network failure.
    /// - [`YoutubeError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn search(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<VideoSearchPage, YoutubeError> {
        let max_results = opts.max_results.to_string();
        let published_after = opts.published_after.map(|t| t.to_rfc3339());
        let published_before = opts.published_before.map(|t| t.to_rfc3339());

        let mut params = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("q", query),
            ("maxResults", max_results.as_str()),
            ("order", opts.order.as_str()),
        ];
        if let Some(after) = published_after.as_deref() {
            params.push(("publishedAfter", after));
        }
        if let Some(before) = published_before.as_deref() {
            params.push(("publishedBefore", before));
        }
        if let Some(channel) = opts.channel_id.as_deref() {
            params.push(("channelId", channel));
        }

        let context = format!("search(q={query})");
        let url = self.build_url("search", &params)?;
        let body = self.request_json(&url, &context).await?;

        let response: SearchListResponse =
            serde_json::from_value(body).map_err(|e| YoutubeError::Deserialize {
                context: context.clone(),
                source: e,
            })?;

        Ok(VideoSearchPage {
            items: response
                .items
                .into_iter()
                .filter_map(crate::types::SearchItem::into_raw)
                .collect(),
            next_page_token: response.next_page_token,
        })
    }

    /// Fetches snippet and statistics for up to
    /// [`MAX_IDS_PER_DETAILS_CALL`] videos.
    ///
    /// An empty id list returns an empty result without a request.
    ///
    /// # Errors
    ///
    /// - [`YoutubeError::TooManyIds`] if more than 50 ids are passed.
    /// - Same status, transport, and decode errors as [`YoutubeClient::search`].
    pub async fn get_details(&self, ids: &[String]) -> Result<Vec<RawVideoResult>, YoutubeError> {
        if ids.len() > MAX_IDS_PER_DETAILS_CALL {
            return Err(YoutubeError::TooManyIds {
                count: ids.len(),
                max: MAX_IDS_PER_DETAILS_CALL,
            });
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let context = format!("videos(ids={})", ids.len());
        let url = self.build_url("videos", &[("part", "snippet,statistics"), ("id", &joined)])?;
        let body = self.request_json(&url, &context).await?;

        let response: VideoListResponse =
            serde_json::from_value(body).map_err(|e| YoutubeError::Deserialize {
                context: context.clone(),
                source: e,
            })?;

        Ok(response
            .items
            .into_iter()
            .map(crate::types::VideoItem::into_raw)
            .collect())
    }

    /// Builds the full request URL with properly percent-encoded query
    /// parameters, `key` first.
    fn build_url(&self, endpoint: &str, extra: &[(&str, &str)]) -> Result<Url, YoutubeError> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| YoutubeError::InvalidBaseUrl(format!("endpoint '{endpoint}': {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET request, classifies the HTTP status, and parses the body
    /// as JSON.
    async fn request_json(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<serde_json::Value, YoutubeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(YoutubeError::QuotaExceeded {
                context: context.to_string(),
            });
        }
        if !status.is_success() {
            return Err(YoutubeError::UnexpectedStatus {
                status: status.as_u16(),
                context: context.to_string(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| YoutubeError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}
