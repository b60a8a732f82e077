//! Forward-looking predictions over the persisted artists and keywords.
//!
//! Everything is derived from stored rows plus one small upload-time sample
//! from the video source, and cached for the configured TTL.

use std::collections::BTreeMap;
use std::sync::Arc;

use beatscope_core::{Clock, CompetitionLevel, TrendDirection};
use beatscope_db::{DbError, EntityStore, EntityTable, StoredEntity};
use beatscope_signals::predict::{
    competition_weight, decline_score, decline_timeframe, emerging_opportunity, genre_outlook,
    genre_trend_score, growth_score, recency_score, rising_artist_score, rising_reasons,
    rising_timeframe, social_score, upload_windows, GenreFactors, RisingFactors, UploadWindows,
};
use beatscope_youtube::{SearchOptions, SearchOrder, VideoSource, MAX_IDS_PER_DETAILS_CALL};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::cache::AnalyticsCache;

pub const NEXT_TRENDING_KEY: &str = "next_trending";

const STORE_SAMPLE: u32 = 200;

const RISING_MIN_SCORE: f64 = 60.0;
const RISING_TOP: usize = 10;
const DECLINE_MIN_SCORE: f64 = 70.0;
const DECLINE_TOP: usize = 8;
const EMERGING_MIN_SCORE: f64 = 55.0;
const EMERGING_TOP: usize = 12;
const ALTERNATIVES: usize = 3;

const UPLOAD_QUERIES: &[&str] = &["viral type beat", "trending type beat 2024"];
const UPLOAD_MAX_RESULTS: u32 = 50;

/// Weight of track record in prediction confidence.
const HISTORICAL_ACCURACY: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RisingArtist {
    pub artist: String,
    pub genre: String,
    pub current_momentum: f64,
    pub predicted_growth: f64,
    pub prediction_score: f64,
    pub confidence: u8,
    pub timeframe: &'static str,
    pub reasons: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecliningKeyword {
    pub keyword: String,
    pub genre: String,
    pub current_opportunity: f64,
    pub decline_score: f64,
    pub timeframe: &'static str,
    pub alternatives: Vec<String>,
    pub reasons: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergingOrigin {
    /// A rising, low-competition keyword already tracked.
    Keyword,
    /// A breakout artist with no keyword row yet.
    BreakoutArtist,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmergingKeyword {
    pub keyword: String,
    pub genre: String,
    pub estimated_search_volume: i64,
    /// On a 0..=1 scale.
    pub competition: f64,
    pub opportunity_score: f64,
    pub origin: EmergingOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreTrend {
    pub genre: String,
    pub trend_score: f64,
    pub avg_momentum: f64,
    pub avg_growth: f64,
    pub breakout_rate: f64,
    pub artist_count: usize,
    pub total_views: i64,
    pub prediction: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPredictions {
    pub generated_at: DateTime<Utc>,
    pub demo_mode: bool,
    pub rising_artists: Vec<RisingArtist>,
    pub declining_keywords: Vec<DecliningKeyword>,
    pub emerging_keywords: Vec<EmergingKeyword>,
    pub genre_trends: Vec<GenreTrend>,
    pub upload_windows: UploadWindows,
}

impl TrendPredictions {
    /// Empty prediction set with default upload windows.
    #[must_use]
    pub fn fallback(generated_at: DateTime<Utc>, demo_mode: bool) -> Self {
        Self {
            generated_at,
            demo_mode,
            rising_artists: Vec::new(),
            declining_keywords: Vec::new(),
            emerging_keywords: Vec::new(),
            genre_trends: Vec::new(),
            upload_windows: UploadWindows::default(),
        }
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[allow(clippy::cast_precision_loss)]
fn days_since(now: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    ((now - at).num_seconds() as f64 / 86_400.0).max(0.0)
}

#[allow(clippy::cast_precision_loss)]
fn total_views(row: &StoredEntity) -> f64 {
    row.entity.avg_views as f64 * f64::from(row.entity.video_count)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn prediction_confidence(row: &StoredEntity, score: f64) -> u8 {
    let e = &row.entity;
    let present = [
        e.trend_momentum.abs() > f64::EPSILON,
        total_views(row) > 0.0,
        e.growth_rate.abs() > f64::EPSILON,
        e.video_count != 0,
        !e.genre.is_empty(),
    ];
    let quality = present.iter().filter(|p| **p).count() as f64 * 0.2;
    let model = (score / 100.0).min(1.0);
    ((quality * 0.3 + HISTORICAL_ACCURACY * 0.4 + model * 0.3) * 100.0)
        .round()
        .clamp(0.0, 100.0) as u8
}

#[must_use]
pub fn rising_artist(row: &StoredEntity, now: DateTime<Utc>) -> RisingArtist {
    let e = &row.entity;
    let recency = recency_score(days_since(now, row.created_at));
    let growth = growth_score(e.trend_momentum, e.growth_rate, recency);
    #[allow(clippy::cast_precision_loss)]
    let social = social_score(
        total_views(row),
        e.avg_views as f64,
        f64::from(e.video_count),
    );
    let score = rising_artist_score(&RisingFactors {
        growth,
        momentum: e.trend_momentum,
        social,
        competition: competition_weight(e.competition_level),
        recency,
    });

    RisingArtist {
        artist: e.name.clone(),
        genre: e.genre.clone(),
        current_momentum: e.trend_momentum,
        predicted_growth: round1(growth),
        prediction_score: round1(score),
        confidence: prediction_confidence(row, score),
        timeframe: rising_timeframe(score),
        reasons: rising_reasons(
            e.trend_momentum,
            e.growth_rate,
            e.breakout_potential,
            e.competition_level,
        ),
    }
}

/// Artists scoring above 60, best first, at most ten.
#[must_use]
pub fn rising_artists(artists: &[StoredEntity], now: DateTime<Utc>) -> Vec<RisingArtist> {
    let mut out: Vec<RisingArtist> = artists
        .iter()
        .map(|row| rising_artist(row, now))
        .filter(|r| r.prediction_score > RISING_MIN_SCORE)
        .collect();
    out.sort_by(|a, b| b.prediction_score.total_cmp(&a.prediction_score));
    out.truncate(RISING_TOP);
    out
}

fn decline_reasons(row: &StoredEntity) -> Vec<&'static str> {
    let e = &row.entity;
    let mut reasons = Vec::new();
    if e.trend_direction == TrendDirection::Declining {
        reasons.push("Fewer recent uploads are drawing views");
    }
    if e.competition_score > 70.0 {
        reasons.push("Competition is saturating the niche");
    }
    if e.opportunity_score < 40.0 {
        reasons.push("Opportunity score has dropped below 40");
    }
    reasons
}

/// Same-genre keywords that are not declining, best opportunity first.
fn alternatives(row: &StoredEntity, keywords: &[StoredEntity]) -> Vec<String> {
    let mut candidates: Vec<&StoredEntity> = keywords
        .iter()
        .filter(|k| k.id != row.id)
        .filter(|k| k.entity.genre == row.entity.genre)
        .filter(|k| k.entity.trend_direction != TrendDirection::Declining)
        .collect();
    candidates.sort_by(|a, b| b.entity.opportunity_score.total_cmp(&a.entity.opportunity_score));
    candidates
        .into_iter()
        .take(ALTERNATIVES)
        .map(|k| k.entity.name.clone())
        .collect()
}

/// Keywords with a decline score above 70, worst first, at most eight.
#[must_use]
pub fn declining_keywords(keywords: &[StoredEntity]) -> Vec<DecliningKeyword> {
    let mut out: Vec<DecliningKeyword> = keywords
        .iter()
        .filter_map(|row| {
            let e = &row.entity;
            let score = decline_score(e.trend_direction, e.competition_score, e.opportunity_score);
            (score > DECLINE_MIN_SCORE).then(|| DecliningKeyword {
                keyword: e.name.clone(),
                genre: e.genre.clone(),
                current_opportunity: e.opportunity_score,
                decline_score: round1(score),
                timeframe: decline_timeframe(score),
                alternatives: alternatives(row, keywords),
                reasons: decline_reasons(row),
            })
        })
        .collect();
    out.sort_by(|a, b| b.decline_score.total_cmp(&a.decline_score));
    out.truncate(DECLINE_TOP);
    out
}

#[allow(clippy::cast_precision_loss)]
fn emerging(
    keyword: String,
    row: &StoredEntity,
    origin: EmergingOrigin,
) -> Option<EmergingKeyword> {
    let e = &row.entity;
    let competition = (e.competition_score / 100.0).clamp(0.0, 1.0);
    let score = emerging_opportunity(e.estimated_search_volume as f64, competition).round();
    (score > EMERGING_MIN_SCORE).then(|| EmergingKeyword {
        keyword,
        genre: e.genre.clone(),
        estimated_search_volume: e.estimated_search_volume,
        competition,
        opportunity_score: score,
        origin,
    })
}

/// Rising low-competition keywords plus breakout artists that have no
/// keyword row yet, opportunity above 55, best first, at most twelve.
#[must_use]
pub fn emerging_keywords(
    artists: &[StoredEntity],
    keywords: &[StoredEntity],
) -> Vec<EmergingKeyword> {
    let tracked = keywords
        .iter()
        .filter(|k| {
            k.entity.trend_direction == TrendDirection::Rising
                && k.entity.competition_level == CompetitionLevel::Low
        })
        .filter_map(|k| emerging(k.entity.name.clone(), k, EmergingOrigin::Keyword));

    let untracked = artists
        .iter()
        .filter(|a| a.entity.breakout_potential)
        .filter_map(|a| {
            let keyword = format!("{} type beat", a.entity.name);
            if keywords.iter().any(|k| k.entity.name == keyword) {
                return None;
            }
            emerging(keyword, a, EmergingOrigin::BreakoutArtist)
        });

    let mut out: Vec<EmergingKeyword> = tracked.chain(untracked).collect();
    out.sort_by(|a, b| b.opportunity_score.total_cmp(&a.opportunity_score));
    out.truncate(EMERGING_TOP);
    out
}

#[derive(Default)]
struct GenreStats {
    artists: usize,
    momentum: f64,
    growth: f64,
    breakouts: usize,
    views: i64,
}

/// One entry per artist genre, strongest trend first.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn genre_trends(artists: &[StoredEntity]) -> Vec<GenreTrend> {
    let mut stats: BTreeMap<&str, GenreStats> = BTreeMap::new();
    for row in artists {
        let e = &row.entity;
        let s = stats.entry(e.genre.as_str()).or_default();
        s.artists += 1;
        s.momentum += e.trend_momentum;
        s.growth += e.growth_rate;
        s.views += e.avg_views.saturating_mul(i64::from(e.video_count));
        if e.breakout_potential {
            s.breakouts += 1;
        }
    }

    let mut out: Vec<GenreTrend> = stats
        .into_iter()
        .map(|(genre, s)| {
            let n = s.artists as f64;
            let avg_momentum = s.momentum / n;
            let avg_growth = s.growth / n;
            let breakout_rate = s.breakouts as f64 / n * 100.0;
            let trend_score = genre_trend_score(&GenreFactors {
                avg_momentum,
                avg_growth,
                breakout_rate,
                artist_count: s.artists,
            });
            GenreTrend {
                genre: genre.to_string(),
                trend_score: round1(trend_score),
                avg_momentum: avg_momentum.round(),
                avg_growth: round1(avg_growth),
                breakout_rate: breakout_rate.round(),
                artist_count: s.artists,
                total_views: s.views,
                prediction: genre_outlook(trend_score),
            }
        })
        .collect();
    out.sort_by(|a, b| b.trend_score.total_cmp(&a.trend_score));
    out
}

/// Cached prediction facade over the store and the video source.
pub struct PredictiveAnalytics {
    source: Arc<dyn VideoSource>,
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
    cache: AnalyticsCache<TrendPredictions>,
}

impl PredictiveAnalytics {
    #[must_use]
    pub fn new(
        source: Arc<dyn VideoSource>,
        store: Arc<dyn EntityStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            store,
            cache: AnalyticsCache::new(ttl, Arc::clone(&clock)),
            clock,
        }
    }

    /// Predictions for the next trend window, served from cache when fresh.
    /// A store failure yields [`TrendPredictions::fallback`], which is not cached.
    pub async fn predict_next_trending(&self) -> TrendPredictions {
        match self
            .cache
            .try_get_or_compute(NEXT_TRENDING_KEY, || self.compute())
            .await
        {
            Ok(predictions) => predictions,
            Err(e) => {
                tracing::error!(error = %e, "insights: store read failed; serving defaults");
                TrendPredictions::fallback(self.clock.now(), self.source.is_demo_mode())
            }
        }
    }

    /// Drops the cached predictions so the next read recomputes.
    pub fn invalidate(&self) {
        self.cache.invalidate(NEXT_TRENDING_KEY);
    }

    async fn compute(&self) -> Result<TrendPredictions, DbError> {
        let artists = self
            .store
            .list(EntityTable::Artists, "-created_at", STORE_SAMPLE)
            .await?;
        let keywords = self
            .store
            .list(EntityTable::Keywords, "-created_at", STORE_SAMPLE)
            .await?;
        let now = self.clock.now();
        tracing::debug!(
            artists = artists.len(),
            keywords = keywords.len(),
            "insights: computing predictions"
        );

        Ok(TrendPredictions {
            generated_at: now,
            demo_mode: self.source.is_demo_mode(),
            rising_artists: rising_artists(&artists, now),
            declining_keywords: declining_keywords(&keywords),
            emerging_keywords: emerging_keywords(&artists, &keywords),
            genre_trends: genre_trends(&artists),
            upload_windows: self.sample_upload_windows().await,
        })
    }

    async fn sample_upload_windows(&self) -> UploadWindows {
        let opts = SearchOptions {
            max_results: UPLOAD_MAX_RESULTS,
            order: SearchOrder::ViewCount,
            ..SearchOptions::default()
        };
        let mut videos = Vec::new();
        for query in UPLOAD_QUERIES {
            let ids = match self.source.search(query, &opts).await {
                Ok(page) => page.video_ids(),
                Err(e) => {
                    tracing::warn!(query, error = %e, "insights: upload-time sample failed");
                    continue;
                }
            };
            for chunk in ids.chunks(MAX_IDS_PER_DETAILS_CALL) {
                match self.source.get_details(chunk).await {
                    Ok(batch) => videos.extend(batch),
                    Err(e) => tracing::warn!(query, error = %e, "insights: details fetch failed"),
                }
            }
        }
        upload_windows(&videos)
    }
}

#[cfg(test)]
#[path = "insights_test.rs"]
mod tests;
