//! Scoring strategies that turn an accumulator into a [`ScoredEntity`].
//!
//! Two strategies exist because the artist-discovery and keyword-research
//! call sites use different formulas and thresholds. They share the base
//! metrics (average views, engagement, competition, momentum, direction)
//! and differ in opportunity, competition tier, breakout, and search volume.

use beatscope_core::{CompetitionLevel, ScoredEntity, TrendDirection};
use chrono::{DateTime, Duration, Utc};

use crate::aggregator::EntityAccumulator;
use crate::genre::{genre_for, is_known_genre};
use crate::jitter::Jitter;

pub const MOMENTUM_MIN: f64 = 20.0;
pub const MOMENTUM_MAX: f64 = 95.0;

/// Samples newer than this count as recent for trend direction.
const RECENT_WINDOW_DAYS: i64 = 7;
const RISING_SHARE: f64 = 0.6;
const DECLINING_SHARE: f64 = 0.2;

const MAX_RELATED_KEYWORDS: usize = 5;

/// Weight of track record in [`confidence`].
const HISTORICAL_ACCURACY: f64 = 0.75;

/// Inputs every strategy needs besides the accumulator.
pub struct ScoringContext<'a> {
    pub now: DateTime<Utc>,
    pub jitter: &'a dyn Jitter,
}

/// Metrics shared by both strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseMetrics {
    pub avg_views: f64,
    pub engagement_rate: f64,
    pub competition_score: f64,
    pub trend_momentum: f64,
    pub trend_direction: TrendDirection,
}

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn avg_views(acc: &EntityAccumulator) -> f64 {
    if acc.occurrence_count == 0 {
        return 0.0;
    }
    acc.total_views as f64 / f64::from(acc.occurrence_count)
}

/// Likes per hundred views; zero when there are no views.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn engagement_rate(total_likes: u64, total_views: u64) -> f64 {
    if total_views == 0 {
        return 0.0;
    }
    total_likes as f64 / total_views as f64 * 100.0
}

/// `min(100, occurrences / saturation * 100)`.
#[must_use]
pub fn competition_score(occurrences: u32, saturation: f64) -> f64 {
    if saturation <= 0.0 {
        return 100.0;
    }
    (f64::from(occurrences) / saturation * 100.0).min(100.0)
}

/// Momentum in `[20, 95]`. Jitter is added before the clamp.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn trend_momentum(acc: &EntityAccumulator, jitter: &dyn Jitter) -> f64 {
    let avg = avg_views(acc);
    let view_factor = if avg < 1.0 {
        0.0
    } else {
        (avg.log10() * 5.0).min(40.0)
    };
    let count_factor = (f64::from(acc.occurrence_count) * 2.0).min(30.0);
    let channel_factor = (acc.distinct_sources.len() as f64 * 4.0).min(20.0);
    let engagement_factor = (engagement_rate(acc.total_likes, acc.total_views) * 10.0).min(10.0);

    let raw = view_factor + count_factor + channel_factor + engagement_factor + jitter.sample();
    raw.clamp(MOMENTUM_MIN, MOMENTUM_MAX)
}

/// Classifies by the share of sampled videos published in the last week.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn trend_direction(acc: &EntityAccumulator, now: DateTime<Utc>) -> TrendDirection {
    let total = acc.sample_videos.len();
    if total == 0 {
        return TrendDirection::Stable;
    }
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent = acc
        .sample_videos
        .iter()
        .filter(|v| v.published_at > cutoff)
        .count();
    let share = recent as f64 / total as f64;
    if share > RISING_SHARE {
        TrendDirection::Rising
    } else if share < DECLINING_SHARE {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Blend of data completeness, fixed track record, and momentum, 0..=100.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn confidence(acc: &EntityAccumulator, momentum: f64) -> u8 {
    let signals = [
        momentum > 0.0,
        acc.total_views > 0,
        acc.occurrence_count > 0,
        !acc.distinct_sources.is_empty(),
        is_known_genre(&acc.display_name),
    ];
    let quality = signals.iter().filter(|s| **s).count() as f64 / signals.len() as f64;
    let model = (momentum / 100.0).min(1.0);
    let value = (quality * 0.3 + HISTORICAL_ACCURACY * 0.4 + model * 0.3) * 100.0;
    value.round().clamp(0.0, 100.0) as u8
}

/// Up to five co-mentioned names as `"<name> type beat"`.
#[must_use]
pub fn related_keywords(acc: &EntityAccumulator) -> Vec<String> {
    acc.co_mentions
        .iter()
        .take(MAX_RELATED_KEYWORDS)
        .map(|n| format!("{n} type beat"))
        .collect()
}

#[must_use]
pub fn growth_rate(momentum: f64) -> f64 {
    (momentum / 2.0).min(50.0)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// A named scoring variant. Implementors supply the formulas that differ;
/// [`ScoringStrategy::score`] assembles the full record.
pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Occurrence count at which competition saturates at 100.
    fn saturation(&self) -> f64;

    fn opportunity(&self, acc: &EntityAccumulator, base: &BaseMetrics) -> f64;

    fn competition_level(&self, acc: &EntityAccumulator, base: &BaseMetrics) -> CompetitionLevel;

    fn breakout(&self, acc: &EntityAccumulator, base: &BaseMetrics) -> bool;

    fn estimated_search_volume(&self, acc: &EntityAccumulator, base: &BaseMetrics) -> i64;

    fn base_metrics(&self, acc: &EntityAccumulator, ctx: &ScoringContext<'_>) -> BaseMetrics {
        BaseMetrics {
            avg_views: avg_views(acc),
            engagement_rate: engagement_rate(acc.total_likes, acc.total_views),
            competition_score: competition_score(acc.occurrence_count, self.saturation()),
            trend_momentum: trend_momentum(acc, ctx.jitter),
            trend_direction: trend_direction(acc, ctx.now),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn score(&self, acc: &EntityAccumulator, ctx: &ScoringContext<'_>) -> ScoredEntity {
        let base = self.base_metrics(acc, ctx);
        let momentum = base.trend_momentum.round();
        ScoredEntity {
            name: acc.display_name.clone(),
            kind: acc.kind,
            genre: genre_for(&acc.display_name),
            competition_level: self.competition_level(acc, &base),
            competition_score: round2(base.competition_score),
            trend_momentum: momentum,
            opportunity_score: self.opportunity(acc, &base).clamp(0.0, 100.0).round(),
            breakout_potential: self.breakout(acc, &base),
            trend_direction: base.trend_direction,
            estimated_search_volume: self.estimated_search_volume(acc, &base),
            avg_views: base.avg_views.floor() as i64,
            confidence: confidence(acc, momentum),
            video_count: i32::try_from(acc.occurrence_count).unwrap_or(i32::MAX),
            channel_count: i32::try_from(acc.distinct_sources.len()).unwrap_or(i32::MAX),
            avg_engagement: round2(base.engagement_rate),
            growth_rate: round2(growth_rate(momentum)),
            related_keywords: related_keywords(acc),
        }
    }
}

/// Artist discovery across many broad queries. K = 10.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscoveryScoring;

impl ScoringStrategy for DiscoveryScoring {
    fn name(&self) -> &'static str {
        "discovery"
    }

    fn saturation(&self) -> f64 {
        10.0
    }

    fn opportunity(&self, acc: &EntityAccumulator, base: &BaseMetrics) -> f64 {
        let view_score = (base.avg_views / 5_000.0).min(50.0);
        let competition_penalty = (60.0 - f64::from(acc.occurrence_count) * 5.0).max(10.0);
        let engagement_bonus = base.engagement_rate.min(10.0);
        (view_score + competition_penalty + engagement_bonus).clamp(0.0, 100.0)
    }

    fn competition_level(&self, acc: &EntityAccumulator, _base: &BaseMetrics) -> CompetitionLevel {
        match acc.occurrence_count {
            n if n > 20 => CompetitionLevel::Oversaturated,
            n if n > 10 => CompetitionLevel::High,
            n if n > 5 => CompetitionLevel::Medium,
            _ => CompetitionLevel::Low,
        }
    }

    fn breakout(&self, acc: &EntityAccumulator, base: &BaseMetrics) -> bool {
        acc.occurrence_count > 8 && base.avg_views > 50_000.0
    }

    fn estimated_search_volume(&self, acc: &EntityAccumulator, _base: &BaseMetrics) -> i64 {
        i64::try_from(acc.total_views / 1_000).unwrap_or(i64::MAX)
    }
}

/// Single-seed keyword research. K = 5.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordScoring;

impl ScoringStrategy for KeywordScoring {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn saturation(&self) -> f64 {
        5.0
    }

    fn opportunity(&self, _acc: &EntityAccumulator, base: &BaseMetrics) -> f64 {
        let view_score = (base.avg_views / 10_000.0 * 5.0).min(50.0);
        let comp_score = (40.0 - base.competition_score * 0.4).max(0.0);
        let engagement_score = (base.engagement_rate * 4.0).min(10.0);
        (view_score + comp_score + engagement_score).clamp(0.0, 100.0)
    }

    fn competition_level(&self, _acc: &EntityAccumulator, base: &BaseMetrics) -> CompetitionLevel {
        if base.competition_score > 70.0 {
            CompetitionLevel::High
        } else if base.competition_score > 40.0 {
            CompetitionLevel::Medium
        } else {
            CompetitionLevel::Low
        }
    }

    fn breakout(&self, _acc: &EntityAccumulator, _base: &BaseMetrics) -> bool {
        false
    }

    #[allow(clippy::cast_possible_truncation)]
    fn estimated_search_volume(&self, _acc: &EntityAccumulator, base: &BaseMetrics) -> i64 {
        (base.avg_views / 100.0).floor() as i64
    }
}

/// Result of re-evaluating a persisted artist's breakout flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutUpdate {
    pub score: i64,
    pub breakout: bool,
    pub momentum: f64,
}

/// `score = round(m*0.5 + g*0.3 + e*0.2)`, breakout when `score > 70`, and
/// momentum nudged by `(score - 50) / 10` within `[20, 95]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#[must_use]
pub fn recompute_breakout(momentum: f64, growth: f64, engagement: f64) -> BreakoutUpdate {
    let score = (momentum * 0.5 + growth * 0.3 + engagement * 0.2).round() as i64;
    BreakoutUpdate {
        score,
        breakout: score > 70,
        momentum: (momentum + (score - 50) as f64 / 10.0).clamp(MOMENTUM_MIN, MOMENTUM_MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jitter::{NoJitter, RandomJitter};
    use beatscope_core::{EntityKind, RawVideoResult};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn sample(published_days_ago: i64) -> RawVideoResult {
        RawVideoResult {
            video_id: format!("v{published_days_ago}"),
            title: String::new(),
            channel_name: "c".to_string(),
            published_at: now() - Duration::days(published_days_ago),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
        }
    }

    fn acc(
        name: &str,
        occurrences: u32,
        views: u64,
        likes: u64,
        sources: &[&str],
    ) -> EntityAccumulator {
        let mut a = EntityAccumulator::new(name, EntityKind::Artist);
        a.occurrence_count = occurrences;
        a.total_views = views;
        a.total_likes = likes;
        a.distinct_sources = sources.iter().map(|s| (*s).to_string()).collect();
        a
    }

    fn ctx(jitter: &dyn Jitter) -> ScoringContext<'_> {
        ScoringContext { now: now(), jitter }
    }

    #[test]
    fn discovery_scenario_twelve_hits_one_point_two_million_views() {
        let a = acc("drake", 12, 1_200_000, 60_000, &["A", "B", "C"]);
        let base = DiscoveryScoring.base_metrics(&a, &ctx(&NoJitter));
        assert!((base.avg_views - 100_000.0).abs() < 1e-9);
        assert!((base.engagement_rate - 5.0).abs() < 1e-9);

        let scored = DiscoveryScoring.score(&a, &ctx(&NoJitter));
        assert_eq!(scored.avg_views, 100_000);
        assert_eq!(scored.competition_level, CompetitionLevel::High);
        assert!(scored.breakout_potential);
        assert_eq!(scored.estimated_search_volume, 1_200);
        // 25 + 24 + 12 + 10
        assert!((scored.trend_momentum - 71.0).abs() < 1e-9);
        // 20 + 10 + 5
        assert!((scored.opportunity_score - 35.0).abs() < 1e-9);
        assert!((scored.competition_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_views_are_safe() {
        let a = acc("nobody", 3, 0, 0, &["A", "B"]);
        assert!(engagement_rate(0, 0).abs() < f64::EPSILON);
        for strategy in [&DiscoveryScoring as &dyn ScoringStrategy, &KeywordScoring] {
            let s = strategy.score(&a, &ctx(&NoJitter));
            assert!(s.avg_engagement.abs() < f64::EPSILON);
            assert_eq!(s.avg_views, 0);
            assert!((MOMENTUM_MIN..=MOMENTUM_MAX).contains(&s.trend_momentum));
            assert!((0.0..=100.0).contains(&s.opportunity_score));
        }
    }

    #[test]
    fn scores_stay_bounded_across_extremes() {
        let jitter = RandomJitter::seeded(10.0, 11);
        let cases = [
            (1, 0, 0),
            (1, 1, 1),
            (2, 10, 1_000),
            (5, 50_000_000, 49_000_000),
            (40, 9_000_000_000, 900_000_000),
            (u32::from(u16::MAX), u64::MAX / 4, u64::MAX / 8),
        ];
        for (occ, views, likes) in cases {
            let a = acc("x", occ, views, likes, &["A", "B", "C", "D", "E", "F"]);
            for strategy in [&DiscoveryScoring as &dyn ScoringStrategy, &KeywordScoring] {
                let base = strategy.base_metrics(&a, &ctx(&jitter));
                assert!((0.0..=100.0).contains(&base.competition_score));
                let s = strategy.score(&a, &ctx(&jitter));
                assert!(
                    (0.0..=100.0).contains(&s.opportunity_score),
                    "{} opportunity {} for {occ}/{views}",
                    strategy.name(),
                    s.opportunity_score
                );
                assert!(
                    (MOMENTUM_MIN..=MOMENTUM_MAX).contains(&s.trend_momentum),
                    "momentum {}",
                    s.trend_momentum
                );
                assert!(s.confidence <= 100);
            }
        }
    }

    #[test]
    fn keyword_strategy_uses_its_own_thresholds() {
        // 4 / 5 saturation => competition 80 => High.
        let a = acc("future", 4, 400_000, 8_000, &["A", "B"]);
        let s = KeywordScoring.score(&a, &ctx(&NoJitter));
        assert!((s.competition_score - 80.0).abs() < 1e-9);
        assert_eq!(s.competition_level, CompetitionLevel::High);
        assert!(!s.breakout_potential);
        assert_eq!(s.estimated_search_volume, 1_000);
        // view 50*... = min(50, 100000/10000*5 = 50) + max(0, 40-32) + min(10, 2*4)
        assert!((s.opportunity_score - 66.0).abs() < 1e-9);

        let b = acc("gunna", 3, 3_000, 0, &["A", "B"]);
        assert_eq!(
            KeywordScoring.score(&b, &ctx(&NoJitter)).competition_level,
            CompetitionLevel::Medium
        );
    }

    #[test]
    fn view_factor_is_zero_below_one_average_view() {
        let a = acc("x", 2, 1, 0, &["A", "B"]);
        // view 0 + count 4 + channel 8 + engagement 0 => clamped to 20.
        assert!((trend_momentum(&a, &NoJitter) - MOMENTUM_MIN).abs() < f64::EPSILON);
    }

    #[test]
    fn trend_direction_by_recent_share() {
        let mut a = acc("x", 5, 10, 1, &["A", "B"]);
        assert_eq!(trend_direction(&a, now()), TrendDirection::Stable);

        a.sample_videos = vec![sample(1), sample(2), sample(3), sample(4), sample(20)];
        assert_eq!(trend_direction(&a, now()), TrendDirection::Rising);

        a.sample_videos = vec![sample(1), sample(2), sample(10), sample(20), sample(30)];
        assert_eq!(trend_direction(&a, now()), TrendDirection::Stable);

        a.sample_videos = vec![sample(10), sample(11), sample(20), sample(25), sample(30)];
        assert_eq!(trend_direction(&a, now()), TrendDirection::Declining);
    }

    #[test]
    fn confidence_matches_formula() {
        // All five quality signals present: (0.3 + 0.3 + 0.71*0.3) * 100 = 81.3
        let a = acc("pop smoke", 3, 100, 1, &["A"]);
        assert_eq!(confidence(&a, 71.0), 81);
        // Unknown genre drops quality to 0.8: (0.24 + 0.3 + 0.213) * 100 = 75.3
        let b = acc("some producer", 3, 100, 1, &["A"]);
        assert_eq!(confidence(&b, 71.0), 75);
    }

    #[test]
    fn related_keywords_come_from_co_mentions() {
        let mut a = acc("central cee", 2, 10, 1, &["A", "B"]);
        a.co_mentions = ["dave", "drill", "headie one", "digga d", "aitch", "fredo"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        let related = related_keywords(&a);
        assert_eq!(related.len(), 5);
        assert_eq!(related[0], "dave type beat");
    }

    #[test]
    fn breakout_recompute() {
        let up = recompute_breakout(90.0, 45.0, 8.0);
        // 45 + 13.5 + 1.6 = 60.1
        assert_eq!(up.score, 60);
        assert!(!up.breakout);
        assert!((up.momentum - 91.0).abs() < 1e-9);

        let hot = recompute_breakout(95.0, 50.0, 100.0);
        // 47.5 + 15 + 20 = 82.5 => 83 (round half away from zero)
        assert_eq!(hot.score, 83);
        assert!(hot.breakout);
        assert!((hot.momentum - 95.0).abs() < 1e-9);

        let cold = recompute_breakout(20.0, 0.0, 0.0);
        assert_eq!(cold.score, 10);
        assert!((cold.momentum - 20.0).abs() < 1e-9);
    }

    #[test]
    fn jitter_is_applied_before_clamp() {
        struct Big;
        impl Jitter for Big {
            fn sample(&self) -> f64 {
                1_000.0
            }
        }
        let a = acc("x", 2, 100, 1, &["A", "B"]);
        assert!((trend_momentum(&a, &Big) - MOMENTUM_MAX).abs() < f64::EPSILON);
    }
}
