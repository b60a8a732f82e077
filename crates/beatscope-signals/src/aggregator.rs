//! Per-entity aggregation across one collection cycle.
//!
//! [`aggregate`] is a pure fold: it never filters. The anti-noise floor is
//! applied by the caller through [`EligibilityFloor`].

use std::collections::{BTreeSet, HashMap};

use beatscope_core::{EntityKind, RawVideoResult};
use chrono::{DateTime, Utc};

use crate::types::ExtractedEntity;

/// Videos kept per accumulator for trend classification.
pub const MAX_SAMPLE_VIDEOS: usize = 5;

/// Co-mentioned names kept per accumulator.
const MAX_CO_MENTIONS: usize = 10;

/// Lower-case, strip everything but alphanumerics and whitespace, collapse
/// whitespace runs to a single space.
#[must_use]
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityAccumulator {
    /// Normalized key.
    pub name: String,
    /// First raw spelling seen, used for display and persistence.
    pub display_name: String,
    pub kind: EntityKind,
    pub occurrence_count: u32,
    pub total_views: u64,
    pub total_likes: u64,
    pub distinct_sources: BTreeSet<String>,
    pub sample_videos: Vec<RawVideoResult>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    /// Other display names extracted from the same titles, first-seen order.
    pub co_mentions: Vec<String>,
}

impl EntityAccumulator {
    #[must_use]
    pub fn new(display_name: &str, kind: EntityKind) -> Self {
        Self {
            name: normalize(display_name),
            display_name: display_name.trim().to_lowercase(),
            kind,
            occurrence_count: 0,
            total_views: 0,
            total_likes: 0,
            distinct_sources: BTreeSet::new(),
            sample_videos: Vec::new(),
            first_seen: None,
            last_seen: None,
            co_mentions: Vec::new(),
        }
    }

    /// Folds one video into the running totals.
    pub fn fold(&mut self, video: &RawVideoResult) {
        self.occurrence_count += 1;
        self.total_views = self.total_views.saturating_add(video.view_count);
        self.total_likes = self.total_likes.saturating_add(video.like_count);
        self.distinct_sources.insert(video.channel_name.clone());
        if self.sample_videos.len() < MAX_SAMPLE_VIDEOS {
            self.sample_videos.push(video.clone());
        }
        self.first_seen = Some(
            self.first_seen
                .map_or(video.published_at, |t| t.min(video.published_at)),
        );
        self.last_seen = Some(
            self.last_seen
                .map_or(video.published_at, |t| t.max(video.published_at)),
        );
    }

    fn note_co_mention(&mut self, other: &str) {
        if other != self.display_name
            && self.co_mentions.len() < MAX_CO_MENTIONS
            && !self.co_mentions.iter().any(|n| n == other)
        {
            self.co_mentions.push(other.to_string());
        }
    }
}

/// Folds extraction hits into accumulators keyed by normalized name.
///
/// A name seen as both artist and keyword is kept as an artist.
pub fn aggregate<'a, I>(entities: I) -> HashMap<String, EntityAccumulator>
where
    I: IntoIterator<Item = ExtractedEntity<'a>>,
{
    let mut map: HashMap<String, EntityAccumulator> = HashMap::new();
    let mut by_video: HashMap<&'a str, Vec<String>> = HashMap::new();

    for entity in entities {
        let source: &'a RawVideoResult = entity.source;
        let key = normalize(&entity.raw_name);
        if key.is_empty() {
            continue;
        }
        let acc = map
            .entry(key.clone())
            .or_insert_with(|| EntityAccumulator::new(&entity.raw_name, entity.kind));
        if entity.kind == EntityKind::Artist {
            acc.kind = EntityKind::Artist;
        }
        acc.fold(source);

        let keys = by_video.entry(source.video_id.as_str()).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    for keys in by_video.values() {
        for key in keys {
            let others: Vec<String> = keys
                .iter()
                .filter(|k| *k != key)
                .filter_map(|k| map.get(k).map(|a| a.display_name.clone()))
                .collect();
            if let Some(acc) = map.get_mut(key) {
                for other in &others {
                    acc.note_co_mention(other);
                }
            }
        }
    }

    map
}

/// Minimum evidence before an accumulator is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityFloor {
    pub min_occurrences: u32,
    pub min_sources: usize,
}

impl Default for EligibilityFloor {
    fn default() -> Self {
        Self {
            min_occurrences: 2,
            min_sources: 2,
        }
    }
}

impl EligibilityFloor {
    #[must_use]
    pub fn passes(&self, acc: &EntityAccumulator) -> bool {
        acc.occurrence_count >= self.min_occurrences
            && acc.distinct_sources.len() >= self.min_sources
    }

    /// Accumulators that pass, sorted by key for stable output.
    #[must_use]
    #[allow(clippy::implicit_hasher)] // takes the map `aggregate` returns
    pub fn eligible(&self, map: HashMap<String, EntityAccumulator>) -> Vec<EntityAccumulator> {
        let mut out: Vec<EntityAccumulator> = map
            .into_values()
            .filter(|acc| {
                let keep = self.passes(acc);
                if !keep {
                    tracing::debug!(
                        entity = %acc.name,
                        occurrences = acc.occurrence_count,
                        sources = acc.distinct_sources.len(),
                        "below eligibility floor"
                    );
                }
                keep
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
