//! Synthesized video results for demo mode.
//!
//! Titles are assembled from fixed vocabularies in the shapes real "type beat"
//! uploads use, so the extractor and aggregator see realistic input even when
//! the live API is unavailable. Every id handed out by `search` is remembered,
//! and a later `get_details` for that id returns the same title and channel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use beatscope_core::{Clock, RawVideoResult, SystemClock};
use chrono::Duration;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::types::{SearchOptions, VideoSearchPage};

pub const MOCK_ARTISTS: &[&str] = &[
    "drake",
    "travis scott",
    "lil baby",
    "future",
    "playboi carti",
    "juice wrld",
    "young thug",
    "gunna",
    "lil uzi",
    "pop smoke",
    "central cee",
    "ice spice",
    "yeat",
    "ken carson",
    "21 savage",
    "metro boomin",
];

pub const MOCK_STYLES: &[&str] = &[
    "trap", "drill", "dark", "melodic", "hard", "lofi", "rage", "boom bap", "afrobeat", "r&b",
];

pub const MOCK_INSTRUMENTS: &[&str] = &[
    "piano", "guitar", "flute", "808", "violin", "synth", "bells", "choir", "strings", "sax",
];

pub const MOCK_CHANNELS: &[&str] = &[
    "prod. nightfall",
    "Kyle Beats",
    "Loud Lord",
    "BeatsByJ",
    "Cold Sample",
    "Vinny Ortiz",
    "Moonboy Prod",
    "Trapmatic",
    "Southside Sounds",
    "GloBeats",
    "808 Mafia Style",
    "Lofi Hour",
];

const TITLE_WORDS: &[&str] = &[
    "Midnight", "Ghost", "Pressure", "Vibes", "No Love", "Away", "Heaven", "Cartier", "Wave",
    "Gravity", "Sapphire", "Outside",
];

/// Default window when the caller gives no `published_after`.
const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Remembered ids are dropped wholesale past this size.
const MEMO_CAP: usize = 5_000;

/// Share of titles that feature the queried artist when the query names one.
const FEATURED_SHARE: f64 = 0.8;

pub struct MockVideoGenerator {
    rng: Mutex<StdRng>,
    clock: Arc<dyn Clock>,
    memo: Mutex<HashMap<String, RawVideoResult>>,
}

impl Default for MockVideoGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MockVideoGenerator {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::from_rng(StdRng::from_os_rng(), clock)
    }

    /// Deterministic generator for tests.
    #[must_use]
    pub fn seeded(seed: u64, clock: Arc<dyn Clock>) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), clock)
    }

    fn from_rng(rng: StdRng, clock: Arc<dyn Clock>) -> Self {
        Self {
            rng: Mutex::new(rng),
            clock,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn search(&self, query: &str, opts: &SearchOptions) -> VideoSearchPage {
        let featured = featured_artist(query);
        let count = opts.max_results as usize;

        let items: Vec<RawVideoResult> = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            (0..count)
                .map(|_| self.synthesize(&mut rng, featured, opts, None))
                .collect()
        };

        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if memo.len() + items.len() > MEMO_CAP {
            memo.clear();
        }
        for item in &items {
            memo.insert(item.video_id.clone(), item.clone());
        }

        VideoSearchPage {
            items,
            next_page_token: None,
        }
    }

    /// Returns the remembered record for each known id and a fresh one for
    /// any id never handed out.
    pub fn get_details(&self, ids: &[String]) -> Vec<RawVideoResult> {
        let memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        ids.iter()
            .map(|id| {
                memo.get(id).cloned().unwrap_or_else(|| {
                    self.synthesize(&mut rng, None, &SearchOptions::default(), Some(id))
                })
            })
            .collect()
    }

    fn synthesize(
        &self,
        rng: &mut StdRng,
        featured: Option<&'static str>,
        opts: &SearchOptions,
        id: Option<&str>,
    ) -> RawVideoResult {
        let artist = match featured {
            Some(a) if rng.random_bool(FEATURED_SHARE) => a,
            _ => pick(rng, MOCK_ARTISTS),
        };
        let title = build_title(rng, artist);
        let channel = pick(rng, MOCK_CHANNELS);

        let view_count: u64 = rng.random_range(1_000..500_000);
        let like_count = scale(view_count, rng.random_range(0.01..0.06));
        let comment_count = scale(view_count, rng.random_range(0.001..0.005));

        let now = self.clock.now();
        let before = opts.published_before.unwrap_or(now);
        let after = opts
            .published_after
            .unwrap_or(before - Duration::days(DEFAULT_WINDOW_DAYS));
        let span = (before - after).num_seconds().max(1);
        let published_at = after + Duration::seconds(rng.random_range(0..span));

        let video_id = id.map_or_else(|| random_id(rng), str::to_string);

        RawVideoResult {
            video_id,
            title,
            channel_name: channel.to_string(),
            published_at,
            view_count,
            like_count,
            comment_count,
        }
    }
}

/// Longest vocabulary artist named in the query, if any.
fn featured_artist(query: &str) -> Option<&'static str> {
    let lower = query.to_lowercase();
    MOCK_ARTISTS
        .iter()
        .copied()
        .filter(|a| lower.contains(a))
        .max_by_key(|a| a.len())
}

fn build_title(rng: &mut StdRng, artist: &str) -> String {
    let display = title_case(artist);
    let style = pick(rng, MOCK_STYLES);
    let instrument = pick(rng, MOCK_INSTRUMENTS);
    let word = pick(rng, TITLE_WORDS);

    match rng.random_range(0..5) {
        0 => {
            let other = title_case(pick(rng, MOCK_ARTISTS));
            format!("[FREE] {display} x {other} Type Beat - \"{word}\"")
        }
        1 => format!("[{display}] Type Beat - {style} {instrument} instrumental"),
        2 => format!("{display} Type Beat \"{word}\" | {} {instrument} beat", title_case(style)),
        3 => format!("{display} Style Beat - {word} ({style})"),
        _ => format!("(FREE) {display} Type Beat 2024 - \"{word}\""),
    }
}

fn pick<'a>(rng: &mut StdRng, items: &'a [&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn scale(views: u64, ratio: f64) -> u64 {
    (views as f64 * ratio).round() as u64
}

fn random_id(rng: &mut StdRng) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    (0..11)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
