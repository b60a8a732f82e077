//! The four phases of a collection cycle.
//!
//! Each phase writes its counters into a [`PhaseReport`] as it goes. Only a
//! failed leading `list` stops a phase early. Query failures and per-row
//! write failures are counted and skipped.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use beatscope_core::{Clock, EntityKind, RawVideoResult, ScoredEntity};
use beatscope_db::{CreateOutcome, EntityPatch, EntityStore, EntityTable, StoredEntity};
use beatscope_signals::{
    aggregate, normalize, recompute_breakout, DiscoveryScoring, EligibilityFloor,
    EntityAccumulator, EntityExtractor, Jitter, KeywordScoring, ScoringContext, ScoringStrategy,
};
use beatscope_youtube::{
    SearchOptions, SearchOrder, VideoSource, YoutubeError, MAX_IDS_PER_DETAILS_CALL,
};

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::types::PhaseReport;

pub const ARTIST_QUERIES: &[&str] = &[
    "type beat 2024 trending",
    "viral type beat",
    "most viewed type beat this week",
    "new type beat 2024",
    "hot type beat",
    "popular producer beats",
    "trending hip hop beats",
    "drill type beat trending",
];

pub const SEED_ARTISTS: &[&str] = &[
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
];

const ARTIST_MAX_RESULTS: u32 = 30;
const ARTIST_WINDOW_DAYS: i64 = 14;
const ARTISTS_PERSISTED: usize = 15;

const KEYWORD_MAX_RESULTS: u32 = 25;
const KEYWORD_WINDOW_DAYS: i64 = 30;

const REFRESH_BATCH: u32 = 20;
const REFRESH_MAX_RESULTS: u32 = 20;
const REFRESH_WINDOW_DAYS: i64 = 7;

const BREAKOUT_BATCH: u32 = 30;

/// Collaborators shared by every phase.
pub(crate) struct Pipeline {
    pub source: Arc<dyn VideoSource>,
    pub store: Arc<dyn EntityStore>,
    pub clock: Arc<dyn Clock>,
    pub jitter: Arc<dyn Jitter>,
    pub extractor: EntityExtractor,
    pub floor: EligibilityFloor,
    pub config: CollectorConfig,
}

impl Pipeline {
    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Search, then enrich the hits with statistics in id chunks the API accepts.
    async fn fetch_videos(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<RawVideoResult>, YoutubeError> {
        let page = self.source.search(query, opts).await?;
        let ids = page.video_ids();
        let mut videos = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_DETAILS_CALL) {
            videos.extend(self.source.get_details(chunk).await?);
        }
        Ok(videos)
    }

    async fn persist(
        &self,
        table: EntityTable,
        entity: &ScoredEntity,
        report: &mut PhaseReport,
    ) {
        match self.store.create(table, entity).await {
            Ok(CreateOutcome::Inserted(_)) => report.persisted += 1,
            Ok(CreateOutcome::Duplicate) => report.duplicates += 1,
            Err(e) => {
                tracing::warn!(phase = report.name, name = %entity.name, error = %e, "create failed; skipping");
                report.write_failures += 1;
            }
        }
    }

    async fn patch(
        &self,
        table: EntityTable,
        row: &StoredEntity,
        patch: &EntityPatch,
        report: &mut PhaseReport,
    ) -> bool {
        match self.store.update(table, row.id, patch).await {
            Ok(()) => {
                report.persisted += 1;
                true
            }
            Err(e) => {
                tracing::warn!(phase = report.name, name = %row.entity.name, error = %e, "update failed; skipping");
                report.write_failures += 1;
                false
            }
        }
    }

    fn context(&self) -> ScoringContext<'_> {
        ScoringContext {
            now: self.clock.now(),
            jitter: self.jitter.as_ref(),
        }
    }
}

/// Fixed discovery queries, scored with [`DiscoveryScoring`]; the top
/// artists by momentum are persisted.
pub(crate) async fn collect_artists(
    p: &Pipeline,
    report: &mut PhaseReport,
) -> Result<(), CollectorError> {
    let now = p.clock.now();
    let opts = SearchOptions {
        max_results: ARTIST_MAX_RESULTS,
        order: SearchOrder::ViewCount,
        published_after: Some(now - chrono::Duration::days(ARTIST_WINDOW_DAYS)),
        ..SearchOptions::default()
    };

    let mut seen = HashSet::new();
    let mut videos: Vec<RawVideoResult> = Vec::new();
    for (i, query) in ARTIST_QUERIES.iter().enumerate() {
        if i > 0 {
            Pipeline::pause(p.config.artist_query_delay).await;
        }
        report.queries += 1;
        match p.fetch_videos(query, &opts).await {
            Ok(batch) => videos.extend(
                batch
                    .into_iter()
                    .filter(|v| seen.insert(v.video_id.clone())),
            ),
            Err(e) => {
                tracing::warn!(phase = report.name, query, error = %e, "query failed; skipping");
                report.failures += 1;
            }
        }
    }

    let hits = videos.iter().flat_map(|v| p.extractor.extract(v, None));
    let eligible = p.floor.eligible(aggregate(hits));
    let ctx = p.context();
    let mut scored: Vec<ScoredEntity> = eligible
        .iter()
        .filter(|acc| acc.kind == EntityKind::Artist)
        .map(|acc| DiscoveryScoring.score(acc, &ctx))
        .collect();
    scored.sort_by(|a, b| {
        b.trend_momentum
            .total_cmp(&a.trend_momentum)
            .then_with(|| a.name.cmp(&b.name))
    });
    scored.truncate(ARTISTS_PERSISTED);

    tracing::info!(
        videos = videos.len(),
        eligible = eligible.len(),
        scored = scored.len(),
        "artist discovery scored"
    );

    for entity in &scored {
        p.persist(EntityTable::Artists, entity, report).await;
    }
    Ok(())
}

/// One `"<seed> type beat"` query per seed artist. The seed's own
/// accumulator becomes a keyword record scored with [`KeywordScoring`].
pub(crate) async fn collect_keywords(
    p: &Pipeline,
    report: &mut PhaseReport,
) -> Result<(), CollectorError> {
    let now = p.clock.now();
    let opts = SearchOptions {
        max_results: KEYWORD_MAX_RESULTS,
        order: SearchOrder::Relevance,
        published_after: Some(now - chrono::Duration::days(KEYWORD_WINDOW_DAYS)),
        ..SearchOptions::default()
    };

    for (i, seed) in SEED_ARTISTS.iter().enumerate() {
        if i > 0 {
            Pipeline::pause(p.config.keyword_query_delay).await;
        }
        report.queries += 1;
        let query = format!("{seed} type beat");
        let videos = match p.fetch_videos(&query, &opts).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(phase = report.name, query = %query, error = %e, "query failed; skipping");
                report.failures += 1;
                continue;
            }
        };

        let hits = videos.iter().flat_map(|v| p.extractor.extract(v, Some(seed)));
        let mut accumulators = aggregate(hits);
        let Some(acc) = accumulators.remove(&normalize(seed)) else {
            tracing::debug!(seed, "no titles mention seed");
            continue;
        };
        if !p.floor.passes(&acc) {
            tracing::debug!(
                seed,
                occurrences = acc.occurrence_count,
                sources = acc.distinct_sources.len(),
                "seed below eligibility floor"
            );
            continue;
        }

        let mut entity = KeywordScoring.score(&acc, &p.context());
        entity.name = query;
        entity.kind = EntityKind::Keyword;
        p.persist(EntityTable::Keywords, &entity, report).await;
    }
    Ok(())
}

/// Re-searches the newest keywords and rewrites their scores from the
/// fresh results.
pub(crate) async fn refresh_keywords(
    p: &Pipeline,
    report: &mut PhaseReport,
) -> Result<(), CollectorError> {
    let rows = p
        .store
        .list(EntityTable::Keywords, "-created_at", REFRESH_BATCH)
        .await?;
    let now = p.clock.now();
    let opts = SearchOptions {
        max_results: REFRESH_MAX_RESULTS,
        order: SearchOrder::Relevance,
        published_after: Some(now - chrono::Duration::days(REFRESH_WINDOW_DAYS)),
        ..SearchOptions::default()
    };

    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            Pipeline::pause(p.config.refresh_query_delay).await;
        }
        report.queries += 1;
        let keyword = &row.entity.name;
        let videos = match p.fetch_videos(keyword, &opts).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(phase = report.name, keyword = %keyword, error = %e, "query failed; skipping");
                report.failures += 1;
                continue;
            }
        };
        if videos.is_empty() {
            tracing::debug!(keyword = %keyword, "no fresh videos; keeping stored scores");
            continue;
        }

        let mut acc = EntityAccumulator::new(keyword, EntityKind::Keyword);
        for video in &videos {
            acc.fold(video);
        }
        let fresh = KeywordScoring.score(&acc, &p.context());
        let patch = EntityPatch {
            competition_level: Some(fresh.competition_level),
            competition_score: Some(fresh.competition_score),
            opportunity_score: Some(fresh.opportunity_score),
            estimated_search_volume: Some(fresh.estimated_search_volume),
            trend_direction: Some(fresh.trend_direction),
            last_updated: Some(now),
            ..EntityPatch::default()
        };
        p.patch(EntityTable::Keywords, row, &patch, report).await;
    }
    Ok(())
}

/// Re-evaluates the breakout flag of the newest artists; rows are written
/// only when the flag flips.
pub(crate) async fn recompute_artist_breakouts(
    p: &Pipeline,
    report: &mut PhaseReport,
) -> Result<(), CollectorError> {
    let rows = p
        .store
        .list(EntityTable::Artists, "-created_at", BREAKOUT_BATCH)
        .await?;
    let now = p.clock.now();

    for row in &rows {
        let e = &row.entity;
        let update = recompute_breakout(e.trend_momentum, e.growth_rate, e.avg_engagement);
        if update.breakout == e.breakout_potential {
            continue;
        }
        let patch = EntityPatch {
            breakout_potential: Some(update.breakout),
            trend_momentum: Some(update.momentum),
            last_updated: Some(now),
            ..EntityPatch::default()
        };
        if p.patch(EntityTable::Artists, row, &patch, report).await {
            tracing::info!(artist = %e.name, breakout = update.breakout, score = update.score, "breakout flag changed");
        }
    }
    Ok(())
}
