use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Keyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
    Oversaturated,
}

impl CompetitionLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Oversaturated => "oversaturated",
        }
    }

    /// Parses the stored lower-case label. Unknown labels yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "oversaturated" => Some(Self::Oversaturated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Stable,
    #[serde(alias = "falling")]
    Declining,
}

impl TrendDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Stable => "stable",
            Self::Declining => "declining",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rising" => Some(Self::Rising),
            "stable" => Some(Self::Stable),
            "declining" | "falling" => Some(Self::Declining),
            _ => None,
        }
    }
}

/// Final scored record handed to persistence.
///
/// Built once by a scoring strategy from one accumulator and never mutated
/// afterwards; later passes write changes through a store patch instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntity {
    pub name: String,
    pub kind: EntityKind,
    pub genre: String,
    pub competition_level: CompetitionLevel,
    pub competition_score: f64,
    pub trend_momentum: f64,
    pub opportunity_score: f64,
    pub breakout_potential: bool,
    pub trend_direction: TrendDirection,
    pub estimated_search_volume: i64,
    pub avg_views: i64,
    pub confidence: u8,
    pub video_count: i32,
    pub channel_count: i32,
    pub avg_engagement: f64,
    pub growth_rate: f64,
    pub related_keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_direction_accepts_falling_alias() {
        let parsed: TrendDirection = serde_json::from_str("\"falling\"").unwrap();
        assert_eq!(parsed, TrendDirection::Declining);
        assert_eq!(
            serde_json::to_string(&TrendDirection::Declining).unwrap(),
            "\"declining\""
        );
    }

    #[test]
    fn competition_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CompetitionLevel::Oversaturated).unwrap(),
            "\"oversaturated\""
        );
        assert_eq!(CompetitionLevel::parse("medium"), Some(CompetitionLevel::Medium));
        assert_eq!(CompetitionLevel::parse("huge"), None);
    }

    #[test]
    fn trend_direction_parse_matches_labels() {
        for dir in [
            TrendDirection::Rising,
            TrendDirection::Stable,
            TrendDirection::Declining,
        ] {
            assert_eq!(TrendDirection::parse(dir.as_str()), Some(dir));
        }
    }
}
