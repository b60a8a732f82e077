//! Wires the collector and insights facade for one CLI invocation.

use std::sync::Arc;

use beatscope_collector::{ttl_from_secs, Collector, CollectorConfig, PredictiveAnalytics};
use beatscope_core::{Clock, SystemClock};
use beatscope_db::{EntityStore, MemoryEntityStore, PgEntityStore};
use beatscope_signals::{jitter_from_amplitude, Jitter};
use beatscope_youtube::{ResilientVideoSource, VideoSource};

pub(crate) struct Context {
    pub store: Arc<dyn EntityStore>,
    pub collector: Collector,
    pub insights: PredictiveAnalytics,
}

/// Builds every collaborator from the environment. With `memory` no
/// database is touched; otherwise migrations run before anything else.
///
/// In demo mode inter-query delays are dropped, since nothing is rate
/// limited.
pub(crate) async fn build(memory: bool) -> anyhow::Result<Context> {
    let config = beatscope_core::load_app_config()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn EntityStore> = if memory {
        Arc::new(MemoryEntityStore::new(Arc::clone(&clock)))
    } else {
        let pool = beatscope_db::connect(&config).await?;
        beatscope_db::migrate(&pool).await?;
        Arc::new(PgEntityStore::new(pool))
    };

    let source: Arc<dyn VideoSource> =
        Arc::new(ResilientVideoSource::from_config(&config, Arc::clone(&clock))?);
    let collector_config = if source.is_demo_mode() {
        tracing::info!("no YouTube API key; collecting synthetic demo data");
        CollectorConfig {
            interval: CollectorConfig::from_app_config(&config).interval,
            ..CollectorConfig::immediate()
        }
    } else {
        CollectorConfig::from_app_config(&config)
    };
    let jitter: Arc<dyn Jitter> = Arc::from(jitter_from_amplitude(config.momentum_jitter));

    let collector = Collector::new(
        Arc::clone(&source),
        Arc::clone(&store),
        Arc::clone(&clock),
        jitter,
        collector_config,
    );
    let insights = PredictiveAnalytics::new(
        source,
        Arc::clone(&store),
        clock,
        ttl_from_secs(config.cache_ttl_secs),
    );

    Ok(Context {
        store,
        collector,
        insights,
    })
}
