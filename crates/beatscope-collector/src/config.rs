use std::time::Duration;

use beatscope_core::AppConfig;

const DEFAULT_INTERVAL_SECS: u64 = 7_200;
const DEFAULT_ARTIST_DELAY_MS: u64 = 1_000;
const DEFAULT_KEYWORD_DELAY_MS: u64 = 800;
const DEFAULT_REFRESH_DELAY_MS: u64 = 1_200;

/// Cycle period and the pauses between consecutive queries of each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    pub interval: Duration,
    pub artist_query_delay: Duration,
    pub keyword_query_delay: Duration,
    pub refresh_query_delay: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            artist_query_delay: Duration::from_millis(DEFAULT_ARTIST_DELAY_MS),
            keyword_query_delay: Duration::from_millis(DEFAULT_KEYWORD_DELAY_MS),
            refresh_query_delay: Duration::from_millis(DEFAULT_REFRESH_DELAY_MS),
        }
    }
}

impl CollectorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.collect_interval_secs),
            artist_query_delay: Duration::from_millis(config.artist_query_delay_ms),
            keyword_query_delay: Duration::from_millis(config.keyword_query_delay_ms),
            refresh_query_delay: Duration::from_millis(config.refresh_query_delay_ms),
        }
    }

    /// Default period with no inter-query pauses.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            artist_query_delay: Duration::ZERO,
            keyword_query_delay: Duration::ZERO,
            refresh_query_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
