//! Title parsing into artist and keyword candidates.
//!
//! Extraction is an ordered list of [`ExtractionRule`]s run against the
//! lower-cased title. Every rule runs; the rule order only decides which
//! rule name is recorded when two rules produce the same `(name, kind)`.

use std::collections::HashSet;

use beatscope_core::{EntityKind, RawVideoResult};
use regex::Regex;

use crate::types::{Candidate, ExtractedEntity};

/// A name token: word characters plus the punctuation artist names use
/// (`a$ap`, `d.r.a.m`, `lil' kim`, `r&b`).
const NAME_TOKEN: &str = r"[\w$.'&]+";

/// Generic words that are never an artist or keyword on their own.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "for", "with", "free", "hard", "dark", "new", "beat", "beats",
    "type", "style", "prod", "instrumental",
];

/// Tokens that join names and are trimmed from candidate edges.
const CONNECTORS: &[&str] = &["x", "ft", "ft.", "feat", "feat.", "vs", "vs.", "&"];

const MIN_NAME_CHARS: usize = 3;
const MAX_NAME_CHARS: usize = 29;

/// Genre vocabulary as `(pattern, canonical)` pairs.
const GENRES: &[(&str, &str)] = &[
    (r"\btrap\b", "trap"),
    (r"\bdrill\b", "drill"),
    (r"\blo-?fi\b", "lofi"),
    (r"\bboom[\s-]?bap\b", "boom bap"),
    (r"\bafro-?beats?\b", "afrobeat"),
    (r"\breggaeton\b", "reggaeton"),
    (r"\bhip[\s-]?hop\b", "hip hop"),
    (r"\br&b\b|\brnb\b", "r&b"),
    (r"\bpop\b", "pop"),
];

enum Matcher {
    /// Every capture group of every match is a candidate.
    Captures(Regex),
    /// Fixed vocabulary; each hit yields its canonical spelling.
    Vocabulary(Vec<(Regex, &'static str)>),
}

/// What a trailing `x` on a candidate means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrailingX {
    /// The rule splits names on ` x `, so an edge `x` is a connector.
    Trim,
    /// The match stopped inside a name ending in `x` (`lil nas x`).
    Reject,
    /// Taken verbatim, as the seed is.
    Keep,
}

pub struct ExtractionRule {
    pub name: &'static str,
    pub kind: EntityKind,
    matcher: Matcher,
    trailing_x: TrailingX,
}

impl ExtractionRule {
    /// A rule whose capture groups are the candidate names.
    #[must_use]
    pub fn pattern(name: &'static str, kind: EntityKind, regex: Regex) -> Self {
        Self {
            name,
            kind,
            matcher: Matcher::Captures(regex),
            trailing_x: TrailingX::Reject,
        }
    }

    /// A pattern rule whose captures sit on either side of an ` x ` joiner.
    #[must_use]
    pub fn collaboration(name: &'static str, regex: Regex) -> Self {
        Self {
            trailing_x: TrailingX::Trim,
            ..Self::pattern(name, EntityKind::Artist, regex)
        }
    }

    fn raw_matches(&self, title: &str) -> Vec<String> {
        match &self.matcher {
            Matcher::Captures(re) => re
                .captures_iter(title)
                .flat_map(|caps| {
                    caps.iter()
                        .skip(1)
                        .flatten()
                        .map(|m| m.as_str().to_string())
                        .collect::<Vec<_>>()
                })
                .collect(),
            Matcher::Vocabulary(entries) => entries
                .iter()
                .filter(|(re, _)| re.is_match(title))
                .map(|(_, canonical)| (*canonical).to_string())
                .collect(),
        }
    }
}

fn rule_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid extraction regex")
}

/// The built-in rule list, in application order.
#[must_use]
pub fn default_rules() -> Vec<ExtractionRule> {
    let one_to_three = format!(r"((?:{NAME_TOKEN}\s+){{0,2}}{NAME_TOKEN})");
    let one_or_two = format!(r"({NAME_TOKEN}(?:\s+{NAME_TOKEN})?)");

    vec![
        ExtractionRule::collaboration(
            "collaboration",
            rule_regex(&format!(r"\b{one_to_three}\s+x\s+{one_to_three}\s+type\s+beat")),
        ),
        ExtractionRule::pattern(
            "bracketed",
            EntityKind::Artist,
            rule_regex(r"\[\s*([^\]]+?)\s*\]\s*type\s+beat"),
        ),
        ExtractionRule::pattern(
            "type_beat",
            EntityKind::Artist,
            rule_regex(&format!(r"\b{one_or_two}\s+type\s+beat")),
        ),
        ExtractionRule::pattern(
            "style_beat",
            EntityKind::Artist,
            rule_regex(&format!(r"\b{one_or_two}\s+style\s+beat")),
        ),
        ExtractionRule {
            name: "genre",
            kind: EntityKind::Keyword,
            matcher: Matcher::Vocabulary(
                GENRES
                    .iter()
                    .map(|(pattern, canonical)| (rule_regex(pattern), *canonical))
                    .collect(),
            ),
            trailing_x: TrailingX::Reject,
        },
    ]
}

/// Ordered rule list applied to video titles.
pub struct EntityExtractor {
    rules: Vec<ExtractionRule>,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::with_rules(default_rules())
    }
}

impl EntityExtractor {
    #[must_use]
    pub fn with_rules(rules: Vec<ExtractionRule>) -> Self {
        Self { rules }
    }

    /// Extracts every surviving hit from one video's title.
    #[must_use]
    pub fn extract<'a>(
        &self,
        video: &'a RawVideoResult,
        seed: Option<&str>,
    ) -> Vec<ExtractedEntity<'a>> {
        self.extract_names(&video.title, seed)
            .into_iter()
            .map(|c| ExtractedEntity {
                raw_name: c.name,
                kind: c.kind,
                rule: c.rule,
                source: video,
            })
            .collect()
    }

    /// Title-only extraction.
    ///
    /// With a `seed`, titles that do not contain it yield nothing, the seed
    /// itself is emitted as an artist hit, and two extra collaboration probes
    /// (`seed x other`, `other x seed`) run. Duplicate `(name, kind)` pairs
    /// are collapsed so one title counts once per entity.
    #[must_use]
    pub fn extract_names(&self, title: &str, seed: Option<&str>) -> Vec<Candidate> {
        let lower = title.to_lowercase();
        let seed = seed.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

        if let Some(seed) = seed.as_deref() {
            if !lower.contains(seed) {
                return Vec::new();
            }
        }

        let mut seen: HashSet<(String, EntityKind)> = HashSet::new();
        let mut out = Vec::new();
        let mut push = |name: String, kind: EntityKind, rule: &'static str| {
            if seen.insert((name.clone(), kind)) {
                out.push(Candidate { name, kind, rule });
            }
        };

        if let Some(seed) = seed.as_deref() {
            if let Some(name) = clean_candidate(seed, TrailingX::Keep) {
                push(name, EntityKind::Artist, "seed");
            }
        }

        for rule in &self.rules {
            for raw in rule.raw_matches(&lower) {
                if let Some(name) = clean_candidate(&raw, rule.trailing_x) {
                    push(name, rule.kind, rule.name);
                }
            }
        }

        if let Some(seed) = seed.as_deref() {
            for probe in seed_probes(seed) {
                for raw in probe.raw_matches(&lower) {
                    if let Some(name) = clean_candidate(&raw, probe.trailing_x) {
                        push(name, probe.kind, probe.name);
                    }
                }
            }
        }

        out
    }
}

/// Collaboration probes anchored on the seed. A probe whose regex cannot
/// be built is skipped.
fn seed_probes(seed: &str) -> Vec<ExtractionRule> {
    let escaped = regex::escape(seed);
    let other = format!(r"((?:{NAME_TOKEN}\s+){{0,2}}{NAME_TOKEN})");
    [
        ("seed_collab_left", format!(r"{escaped}\s+x\s+{other}\s+type\s+beat")),
        ("seed_collab_right", format!(r"\b{other}\s+x\s+{escaped}\s+type\s+beat")),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| match Regex::new(&pattern) {
        Ok(re) => Some(ExtractionRule::collaboration(name, re)),
        Err(e) => {
            tracing::debug!(probe = name, error = %e, "skipping seed probe");
            None
        }
    })
    .collect()
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

fn is_connector(token: &str) -> bool {
    CONNECTORS.contains(&token)
}

/// Trims edge stop-words and connectors, then applies the length,
/// stop-list, and numeric filters. `None` means discard.
fn clean_candidate(raw: &str, trailing_x: TrailingX) -> Option<String> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let start = tokens
        .iter()
        .position(|t| !is_stop_word(t) && !is_connector(t))?;
    let end = match (trailing_x, tokens.last()) {
        (TrailingX::Reject, Some(&"x")) => return None,
        (TrailingX::Keep, Some(&"x")) => tokens.len() - 1,
        _ => tokens
            .iter()
            .rposition(|t| !is_stop_word(t) && !is_connector(t))?,
    };
    let name = tokens[start..=end].join(" ");

    let chars = name.chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&chars) {
        return None;
    }
    if is_stop_word(&name) {
        return None;
    }
    if name
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace())
    {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name.as_str()).collect()
    }

    fn has(candidates: &[Candidate], name: &str, kind: EntityKind) -> bool {
        candidates.iter().any(|c| c.name == name && c.kind == kind)
    }

    #[test]
    fn simple_type_beat_title() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("Lil Baby Type Beat - \"Pressure\"", None);
        assert!(has(&out, "lil baby", EntityKind::Artist), "{:?}", names(&out));
    }

    #[test]
    fn seeded_collaboration_title_yields_seed_and_genre() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names(
            "Central Cee x Dave Type Beat - UK Drill 2024",
            Some("central cee"),
        );
        assert!(has(&out, "central cee", EntityKind::Artist), "{:?}", names(&out));
        assert!(has(&out, "dave", EntityKind::Artist), "{:?}", names(&out));
        assert!(has(&out, "drill", EntityKind::Keyword), "{:?}", names(&out));
    }

    #[test]
    fn collaboration_without_seed_emits_both_names() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("[FREE] Yeat x Ken Carson Type Beat", None);
        assert!(has(&out, "yeat", EntityKind::Artist), "{:?}", names(&out));
        assert!(has(&out, "ken carson", EntityKind::Artist), "{:?}", names(&out));
    }

    #[test]
    fn bracketed_name_is_extracted() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("[Playboi Carti] Type Beat - rage synth", None);
        assert!(has(&out, "playboi carti", EntityKind::Artist), "{:?}", names(&out));
    }

    #[test]
    fn style_beat_is_extracted() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("Metro Boomin Style Beat | dark piano", None);
        assert!(has(&out, "metro boomin", EntityKind::Artist), "{:?}", names(&out));
    }

    #[test]
    fn leading_stop_words_are_trimmed() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("FREE Gunna Type Beat", None);
        assert!(has(&out, "gunna", EntityKind::Artist), "{:?}", names(&out));
        assert!(!has(&out, "free gunna", EntityKind::Artist));
    }

    #[test]
    fn stop_words_and_short_or_numeric_names_are_discarded() {
        let ex = EntityExtractor::default();
        assert!(ex.extract_names("Hard Type Beat", None).is_empty());
        assert!(ex.extract_names("2024 Type Beat", None).is_empty());
        assert!(ex.extract_names("YB Type Beat", None).is_empty());
    }

    #[test]
    fn overlong_candidates_are_discarded() {
        assert!(clean_candidate("abcdefghijklmnopqrstuvwxyzabcd", TrailingX::Reject).is_none());
        assert_eq!(
            clean_candidate("abcdefghijklmnopqrstuvwxyzabc", TrailingX::Reject).as_deref(),
            Some("abcdefghijklmnopqrstuvwxyzabc")
        );
    }

    #[test]
    fn name_ending_in_x_is_not_truncated() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("Lil Nas X Type Beat - \"Montero\"", None);
        assert!(!has(&out, "nas", EntityKind::Artist), "{:?}", names(&out));
        assert!(!has(&out, "lil nas", EntityKind::Artist), "{:?}", names(&out));

        let seeded = ex.extract_names("Lil Nas X Type Beat", Some("lil nas x"));
        assert!(has(&seeded, "lil nas x", EntityKind::Artist), "{:?}", names(&seeded));
    }

    #[test]
    fn leading_joiner_is_trimmed_from_partner_name() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("Drake x Future Type Beat", None);
        assert!(has(&out, "future", EntityKind::Artist), "{:?}", names(&out));
        assert!(has(&out, "drake", EntityKind::Artist), "{:?}", names(&out));
        assert!(!has(&out, "x future", EntityKind::Artist), "{:?}", names(&out));
    }

    #[test]
    fn title_without_seed_is_ignored_in_seeded_flow() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("Drake Type Beat - Trap", Some("future"));
        assert!(out.is_empty());
    }

    #[test]
    fn seed_probes_capture_partner_on_either_side() {
        let ex = EntityExtractor::default();
        let left = ex.extract_names("future x young thug type beat", Some("future"));
        assert!(has(&left, "young thug", EntityKind::Artist), "{:?}", names(&left));

        let right = ex.extract_names("gunna x future type beat", Some("future"));
        assert!(has(&right, "gunna", EntityKind::Artist), "{:?}", names(&right));
    }

    #[test]
    fn duplicate_hits_in_one_title_collapse() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("Drake Type Beat x Drake Type Beat", None);
        let drake = out
            .iter()
            .filter(|c| c.name == "drake" && c.kind == EntityKind::Artist)
            .count();
        assert_eq!(drake, 1);
    }

    #[test]
    fn genre_spellings_are_canonicalized() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("chill lo-fi hip-hop beat for study", None);
        assert!(has(&out, "lofi", EntityKind::Keyword), "{:?}", names(&out));
        assert!(has(&out, "hip hop", EntityKind::Keyword), "{:?}", names(&out));
    }

    #[test]
    fn regex_metacharacters_in_seed_are_escaped() {
        let ex = EntityExtractor::default();
        let out = ex.extract_names("a$ap rocky x tyler type beat", Some("a$ap rocky"));
        assert!(has(&out, "tyler", EntityKind::Artist), "{:?}", names(&out));
    }

    #[test]
    fn no_pattern_means_no_hits() {
        let ex = EntityExtractor::default();
        assert!(ex.extract_names("my vlog from tokyo", None).is_empty());
    }
}
