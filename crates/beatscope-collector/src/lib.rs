//! Collection service for beatscope: drives the fetch, extract, aggregate,
//! score, and persist pipeline on a schedule, and serves cached predictions
//! over what it has persisted.

pub mod cache;
pub mod collector;
pub mod config;
pub mod error;
pub mod insights;
pub mod phases;
pub mod types;

pub use cache::{ttl_from_secs, AnalyticsCache};
pub use collector::Collector;
pub use config::CollectorConfig;
pub use error::CollectorError;
pub use insights::{PredictiveAnalytics, TrendPredictions, NEXT_TRENDING_KEY};
pub use types::{CollectorStatus, CycleOutcome, CycleReport, DataUpdated, PhaseReport};
