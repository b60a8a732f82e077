mod api;
mod middleware;

use std::sync::Arc;

use beatscope_collector::{ttl_from_secs, Collector, CollectorConfig, PredictiveAnalytics};
use beatscope_core::{Clock, SystemClock};
use beatscope_db::{EntityStore, PgEntityStore};
use beatscope_signals::{jitter_from_amplitude, Jitter};
use beatscope_youtube::{ResilientVideoSource, VideoSource};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{OperatorKeys, TriggerThrottle},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = beatscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = beatscope_db::connect(&config).await?;
    let schema = beatscope_db::migrate(&pool).await?;
    tracing::info!(?schema, "database schema up to date");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn EntityStore> = Arc::new(PgEntityStore::new(pool.clone()));
    let source: Arc<dyn VideoSource> =
        Arc::new(ResilientVideoSource::from_config(&config, Arc::clone(&clock))?);
    let jitter: Arc<dyn Jitter> = Arc::from(jitter_from_amplitude(config.momentum_jitter));

    let collector = Collector::new(
        Arc::clone(&source),
        Arc::clone(&store),
        Arc::clone(&clock),
        jitter,
        CollectorConfig::from_app_config(&config),
    );
    let insights = Arc::new(PredictiveAnalytics::new(
        source,
        Arc::clone(&store),
        clock,
        ttl_from_secs(config.cache_ttl_secs),
    ));
    spawn_cache_invalidation(&collector, Arc::clone(&insights));

    if config.collector_autostart {
        collector.start().await?;
    } else {
        tracing::info!("collector autostart disabled; waiting for operator trigger");
    }

    let keys = OperatorKeys::from_env(matches!(
        config.env,
        beatscope_core::Environment::Development
    ))?;
    let state = AppState {
        store,
        collector: collector.clone(),
        insights,
        pool: Some(pool),
    };
    let app = build_app(state, keys, TriggerThrottle::default());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    collector.stop().await?;
    Ok(())
}

/// Drops cached predictions whenever a collection cycle completes.
fn spawn_cache_invalidation(collector: &Collector, insights: Arc<PredictiveAnalytics>) {
    let mut updates = collector.subscribe();
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(event) => {
                    tracing::debug!(last_run = %event.last_run, "data updated; invalidating insights");
                    insights.invalidate();
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "update listener lagged");
                    insights.invalidate();
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
