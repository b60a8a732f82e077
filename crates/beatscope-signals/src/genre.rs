//! Genre assignment from an entity name.

pub const DEFAULT_GENRE: &str = "hip-hop";

/// Ordered `(genre, name fragments)` table. First match wins, so an artist
/// listed under two genres gets the earlier one.
const GENRE_PATTERNS: &[(&str, &[&str])] = &[
    ("drill", &["drill", "central cee", "pop smoke", "fivio", "sheff g"]),
    ("trap", &["lil baby", "gunna", "future", "young thug", "travis scott"]),
    ("uk-drill", &["central cee", "headie one", "digga d"]),
    ("bronx-drill", &["ice spice", "kay flock"]),
    ("rage-rap", &["yeat", "ken carson", "destroy lonely"]),
    ("melodic-rap", &["juice wrld", "lil uzi", "trippie redd"]),
];

/// Canonical genre tokens the extractor emits as keyword entities.
const GENRE_TOKENS: &[&str] = &[
    "trap", "drill", "lofi", "boom bap", "afrobeat", "reggaeton", "hip hop", "r&b", "pop",
];

/// Genre from the pattern table, `None` when nothing matches.
#[must_use]
pub fn detect_genre(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    GENRE_PATTERNS
        .iter()
        .find(|(_, fragments)| fragments.iter().any(|f| lower.contains(f)))
        .map(|(genre, _)| *genre)
}

/// Genre for a scored entity. Genre tokens carry their own genre (spaces
/// become hyphens); everything else goes through [`detect_genre`] and falls
/// back to [`DEFAULT_GENRE`].
#[must_use]
pub fn genre_for(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    if GENRE_TOKENS.contains(&lower.as_str()) {
        return lower.replace(' ', "-");
    }
    detect_genre(&lower).unwrap_or(DEFAULT_GENRE).to_string()
}

/// Whether [`genre_for`] found a real match rather than the fallback.
#[must_use]
pub fn is_known_genre(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    GENRE_TOKENS.contains(&lower.as_str()) || detect_genre(&lower).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_genre_wins() {
        // Listed under both drill and uk-drill.
        assert_eq!(detect_genre("Central Cee"), Some("drill"));
        assert_eq!(detect_genre("headie one"), Some("uk-drill"));
        assert_eq!(detect_genre("yeat"), Some("rage-rap"));
    }

    #[test]
    fn unknown_names_fall_back_to_hip_hop() {
        assert_eq!(detect_genre("some producer"), None);
        assert_eq!(genre_for("some producer"), DEFAULT_GENRE);
        assert!(!is_known_genre("some producer"));
    }

    #[test]
    fn genre_tokens_carry_their_own_genre() {
        assert_eq!(genre_for("boom bap"), "boom-bap");
        assert_eq!(genre_for("reggaeton"), "reggaeton");
        assert!(is_known_genre("lofi"));
    }
}
