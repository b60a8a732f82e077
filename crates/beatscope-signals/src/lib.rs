//! Trend-signal extraction and scoring for beatscope.
//!
//! Titles go through the [`EntityExtractor`], hits are folded per entity by
//! [`aggregate`], accumulators below the [`EligibilityFloor`] are dropped, and
//! a [`ScoringStrategy`] turns the rest into [`beatscope_core::ScoredEntity`]
//! records. Everything here is synchronous and free of I/O.

pub mod aggregator;
pub mod extractor;
pub mod genre;
pub mod jitter;
pub mod predict;
pub mod scorer;
pub mod types;

pub use aggregator::{aggregate, normalize, EligibilityFloor, EntityAccumulator};
pub use extractor::{EntityExtractor, ExtractionRule};
pub use jitter::{jitter_from_amplitude, Jitter, NoJitter, RandomJitter};
pub use scorer::{
    recompute_breakout, BreakoutUpdate, DiscoveryScoring, KeywordScoring, ScoringContext,
    ScoringStrategy,
};
pub use types::{Candidate, ExtractedEntity};
