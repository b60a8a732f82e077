use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use beatscope_core::{AppConfig, Clock, RawVideoResult};

use crate::client::YoutubeClient;
use crate::error::YoutubeError;
use crate::mock::MockVideoGenerator;
use crate::types::{SearchOptions, VideoSearchPage, MAX_IDS_PER_DETAILS_CALL};

/// Where the pipeline gets its videos from.
///
/// The production implementation never surfaces transport errors; the only
/// error a caller can see is [`YoutubeError::TooManyIds`], which is a caller
/// bug.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn search(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<VideoSearchPage, YoutubeError>;

    async fn get_details(&self, ids: &[String]) -> Result<Vec<RawVideoResult>, YoutubeError>;

    /// True once results are synthesized rather than live.
    fn is_demo_mode(&self) -> bool;

    /// Operator action: leave demo mode and try the live API again.
    fn reset_to_live(&self);
}

/// Live client with a one-way fallback to [`MockVideoGenerator`].
///
/// Starts degraded when no API key is configured. The first live failure of
/// any kind flips the latch, and that same call is answered from the mock.
/// Only [`VideoSource::reset_to_live`] clears it.
pub struct ResilientVideoSource {
    live: Option<YoutubeClient>,
    mock: MockVideoGenerator,
    degraded: AtomicBool,
}

impl ResilientVideoSource {
    #[must_use]
    pub fn new(live: Option<YoutubeClient>, mock: MockVideoGenerator) -> Self {
        let degraded = AtomicBool::new(live.is_none());
        Self {
            live,
            mock,
            degraded,
        }
    }

    /// Builds the source from configuration. A missing API key yields a
    /// source that is permanently in demo mode.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError`] if the live client cannot be constructed.
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, YoutubeError> {
        let live = match config.youtube_api_key.as_deref() {
            Some(key) => Some(YoutubeClient::with_base_url(
                key,
                config.youtube_timeout_secs,
                &config.youtube_base_url,
            )?),
            None => {
                tracing::warn!("YOUTUBE_API_KEY not set; serving synthesized demo data");
                None
            }
        };
        Ok(Self::new(live, MockVideoGenerator::new(clock)))
    }

    /// The live client, unless the latch is set.
    fn live(&self) -> Option<&YoutubeClient> {
        if self.degraded.load(Ordering::Acquire) {
            None
        } else {
            self.live.as_ref()
        }
    }

    fn degrade(&self, operation: &str, error: &YoutubeError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                operation,
                error = %error,
                "live YouTube call failed; switching to demo mode"
            );
        }
    }
}

#[async_trait]
impl VideoSource for ResilientVideoSource {
    async fn search(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<VideoSearchPage, YoutubeError> {
        if let Some(client) = self.live() {
            match client.search(query, opts).await {
                Ok(page) => return Ok(page),
                Err(e) => self.degrade("search", &e),
            }
        }
        Ok(self.mock.search(query, opts))
    }

    async fn get_details(&self, ids: &[String]) -> Result<Vec<RawVideoResult>, YoutubeError> {
        if ids.len() > MAX_IDS_PER_DETAILS_CALL {
            return Err(YoutubeError::TooManyIds {
                count: ids.len(),
                max: MAX_IDS_PER_DETAILS_CALL,
            });
        }
        if let Some(client) = self.live() {
            match client.get_details(ids).await {
                Ok(videos) => return Ok(videos),
                Err(e) => self.degrade("get_details", &e),
            }
        }
        Ok(self.mock.get_details(ids))
    }

    fn is_demo_mode(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn reset_to_live(&self) {
        if self.live.is_none() {
            tracing::info!("demo mode reset requested but no API key is configured");
            return;
        }
        if self.degraded.swap(false, Ordering::AcqRel) {
            tracing::info!("demo mode cleared; resuming live YouTube calls");
        }
    }
}
