//! Shared domain records and configuration for beatscope.
//!
//! Every other crate in the workspace depends on this one for the video and
//! scored-entity records, the injected [`Clock`], and [`AppConfig`] loading.

pub mod app_config;
pub mod clock;
pub mod config;
pub mod entity;
pub mod video;

pub use app_config::{AppConfig, Environment};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use entity::{CompetitionLevel, EntityKind, ScoredEntity, TrendDirection};
pub use video::RawVideoResult;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
