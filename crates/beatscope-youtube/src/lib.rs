//! YouTube Data API access for beatscope.
//!
//! [`YoutubeClient`] talks to the live API. [`ResilientVideoSource`] wraps it
//! with a one-way fallback to [`MockVideoGenerator`], which is what the rest
//! of the workspace consumes through the [`VideoSource`] trait.

pub mod client;
pub mod error;
pub mod mock;
pub mod source;
pub mod types;

pub use client::YoutubeClient;
pub use error::YoutubeError;
pub use mock::MockVideoGenerator;
pub use source::{ResilientVideoSource, VideoSource};
pub use types::{SearchOptions, SearchOrder, VideoSearchPage, MAX_IDS_PER_DETAILS_CALL};
