use thiserror::Error;

/// Errors returned by the YouTube Data API client.
#[derive(Debug, Error)]
pub enum YoutubeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 403, which it uses for exhausted or invalid quota.
    #[error("YouTube API quota exceeded or key rejected ({context})")]
    QuotaExceeded { context: String },

    /// Any other non-2xx status.
    #[error("YouTube API returned HTTP {status} for {context}")]
    UnexpectedStatus { status: u16, context: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Caller passed more ids than one `videos` call accepts.
    #[error("too many video ids in one details call: {count} (max {max})")]
    TooManyIds { count: usize, max: usize },

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}
