//! Pure prediction formulas over persisted scores.
//!
//! The insights facade in `beatscope-collector` feeds stored rows through
//! these; nothing here touches I/O.

use beatscope_core::{CompetitionLevel, RawVideoResult, TrendDirection};
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};

/// `log10(x)`, or 0 for `x < 1` so empty counts add nothing.
fn log10_or_zero(x: f64) -> f64 {
    if x < 1.0 {
        0.0
    } else {
        x.log10()
    }
}

#[must_use]
pub fn competition_weight(level: CompetitionLevel) -> f64 {
    match level {
        CompetitionLevel::Low => 20.0,
        CompetitionLevel::Medium => 50.0,
        CompetitionLevel::High => 80.0,
        CompetitionLevel::Oversaturated => 95.0,
    }
}

/// Loses two points per day since the row was created.
#[must_use]
pub fn recency_score(days_since_created: f64) -> f64 {
    (100.0 - days_since_created * 2.0).max(0.0)
}

#[must_use]
pub fn growth_score(momentum: f64, growth_rate: f64, recency: f64) -> f64 {
    (momentum * 0.4 + growth_rate * 0.4 + recency * 0.2).min(100.0)
}

#[must_use]
pub fn social_score(total_views: f64, avg_views: f64, video_count: f64) -> f64 {
    (log10_or_zero(total_views) * 5.0 + log10_or_zero(avg_views * 20.0) * 3.0 + video_count)
        .min(100.0)
}

/// Inputs for [`rising_artist_score`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RisingFactors {
    pub growth: f64,
    pub momentum: f64,
    pub social: f64,
    pub competition: f64,
    pub recency: f64,
}

#[must_use]
pub fn rising_artist_score(f: &RisingFactors) -> f64 {
    f.growth * 0.25 + f.momentum * 0.20 + f.social * 0.20 + f.competition * 0.15 + f.recency * 0.20
}

/// Rough horizon for a rising-artist prediction.
#[must_use]
pub fn rising_timeframe(score: f64) -> &'static str {
    if score > 80.0 {
        "1-2 weeks"
    } else if score > 70.0 {
        "2-4 weeks"
    } else {
        "1-2 months"
    }
}

/// Human-readable reasons behind a rising-artist prediction, at most three.
#[must_use]
pub fn rising_reasons(
    momentum: f64,
    growth_rate: f64,
    breakout: bool,
    level: CompetitionLevel,
) -> Vec<&'static str> {
    let mut reasons = Vec::new();
    if momentum > 80.0 {
        reasons.push("High momentum score indicates strong current traction");
    }
    if growth_rate > 20.0 {
        reasons.push("Rapid growth rate suggests viral potential");
    }
    if breakout {
        reasons.push("Breakout potential flagged by the latest collection");
    }
    if level == CompetitionLevel::Low {
        reasons.push("Low competition creates opportunity window");
    }
    reasons.truncate(3);
    reasons
}

#[must_use]
pub fn direction_weight(direction: TrendDirection) -> f64 {
    match direction {
        TrendDirection::Declining => 45.0,
        TrendDirection::Stable => 20.0,
        TrendDirection::Rising => 0.0,
    }
}

/// Likelihood a keyword is fading, on a 0..=115 scale.
#[must_use]
pub fn decline_score(direction: TrendDirection, competition_score: f64, opportunity: f64) -> f64 {
    direction_weight(direction) + competition_score * 0.35 + (100.0 - opportunity) * 0.35
}

#[must_use]
pub fn decline_timeframe(score: f64) -> &'static str {
    if score > 90.0 {
        "1-2 weeks"
    } else {
        "2-4 weeks"
    }
}

/// `competition01` is competition on a 0..=1 scale.
#[must_use]
pub fn emerging_opportunity(search_volume: f64, competition01: f64) -> f64 {
    (log10_or_zero(search_volume) * 10.0).min(50.0) + (50.0 - competition01 * 50.0).max(0.0)
}

/// Inputs for [`genre_trend_score`]; `breakout_rate` is a percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenreFactors {
    pub avg_momentum: f64,
    pub avg_growth: f64,
    pub breakout_rate: f64,
    pub artist_count: usize,
}

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn genre_trend_score(f: &GenreFactors) -> f64 {
    f.avg_momentum * 0.4
        + f.avg_growth * 0.3
        + f.breakout_rate * 0.2
        + (f.artist_count as f64).min(10.0)
}

#[must_use]
pub fn genre_outlook(trend_score: f64) -> &'static str {
    if trend_score > 60.0 {
        "growing"
    } else if trend_score > 35.0 {
        "steady"
    } else {
        "cooling"
    }
}

/// Best publishing days and hours (UTC) weighted by views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadWindows {
    pub best_days: Vec<String>,
    pub best_hours: Vec<String>,
}

impl Default for UploadWindows {
    fn default() -> Self {
        Self {
            best_days: vec!["Friday".into(), "Saturday".into(), "Sunday".into()],
            best_hours: vec!["18:00".into(), "19:00".into(), "20:00".into()],
        }
    }
}

/// Indexed by days from Monday.
const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Buckets videos by weekday and hour, summing views, and keeps the top
/// three of each (ties broken by calendar order). No videos, or only
/// zero-view videos, gives the defaults.
#[must_use]
pub fn upload_windows(videos: &[RawVideoResult]) -> UploadWindows {
    let mut days = [0_u64; 7];
    let mut hours = [0_u64; 24];
    for v in videos {
        days[v.published_at.weekday().num_days_from_monday() as usize] += v.view_count;
        hours[v.published_at.hour() as usize] += v.view_count;
    }
    if days.iter().all(|d| *d == 0) {
        return UploadWindows::default();
    }

    let top = |buckets: &[u64]| -> Vec<usize> {
        let mut idx: Vec<usize> = (0..buckets.len()).filter(|i| buckets[*i] > 0).collect();
        idx.sort_by(|a, b| buckets[*b].cmp(&buckets[*a]).then(a.cmp(b)));
        idx.truncate(3);
        idx
    };

    let best_days = top(&days)
        .into_iter()
        .map(|i| WEEKDAYS[i].to_string())
        .collect();
    let best_hours = top(&hours)
        .into_iter()
        .map(|h| format!("{h:02}:00"))
        .collect();

    UploadWindows {
        best_days,
        best_hours,
    }
}
