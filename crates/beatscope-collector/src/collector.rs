//! The collection service: processing latch, lifecycle, and notifications.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use beatscope_core::Clock;
use beatscope_db::EntityStore;
use beatscope_signals::{EligibilityFloor, EntityExtractor, Jitter};
use beatscope_youtube::VideoSource;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::phases::{self, Pipeline};
use crate::types::{CollectorStatus, CycleOutcome, CycleReport, DataUpdated, PhaseReport};

const UPDATE_CHANNEL_CAPACITY: usize = 16;

struct Inner {
    pipeline: Pipeline,
    processing: AtomicBool,
    running: AtomicBool,
    last_run: Mutex<Option<DateTime<Utc>>>,
    scheduler: tokio::sync::Mutex<Option<JobScheduler>>,
    updates: broadcast::Sender<DataUpdated>,
}

/// Holds the processing latch; dropping it (including during unwinding)
/// releases the latch.
struct ProcessingGuard(Arc<Inner>);

impl ProcessingGuard {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        inner
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(inner)))
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.0.processing.store(false, Ordering::Release);
    }
}

/// Runs collection cycles on demand and on a fixed period.
///
/// Cheap to clone; clones share one latch, one schedule, and one
/// notification channel. At most one cycle runs at a time per instance.
#[derive(Clone)]
pub struct Collector {
    inner: Arc<Inner>,
}

impl Collector {
    #[must_use]
    pub fn new(
        source: Arc<dyn VideoSource>,
        store: Arc<dyn EntityStore>,
        clock: Arc<dyn Clock>,
        jitter: Arc<dyn Jitter>,
        config: CollectorConfig,
    ) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                pipeline: Pipeline {
                    source,
                    store,
                    clock,
                    jitter,
                    extractor: EntityExtractor::default(),
                    floor: EligibilityFloor::default(),
                    config,
                },
                processing: AtomicBool::new(false),
                running: AtomicBool::new(false),
                last_run: Mutex::new(None),
                scheduler: tokio::sync::Mutex::new(None),
                updates,
            }),
        }
    }

    #[must_use]
    pub fn source(&self) -> &Arc<dyn VideoSource> {
        &self.inner.pipeline.source
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.inner.pipeline.store
    }

    /// Receiver for [`DataUpdated`] events. Events sent while nobody
    /// listens are dropped.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DataUpdated> {
        self.inner.updates.subscribe()
    }

    #[must_use]
    pub fn status(&self) -> CollectorStatus {
        CollectorStatus {
            is_running: self.inner.running.load(Ordering::Acquire),
            is_processing: self.inner.processing.load(Ordering::Acquire),
            last_run: self.last_run(),
            demo_mode: self.inner.pipeline.source.is_demo_mode(),
        }
    }

    #[must_use]
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        *self
            .inner
            .last_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one cycle now, or returns [`CycleOutcome::Skipped`] without
    /// touching any state when a cycle is already in progress.
    pub async fn run_cycle(&self) -> CycleOutcome {
        match ProcessingGuard::acquire(&self.inner) {
            Some(guard) => CycleOutcome::Completed(self.run_locked(guard).await),
            None => {
                tracing::info!("collection cycle already in progress; skipping");
                CycleOutcome::Skipped
            }
        }
    }

    /// Takes the latch synchronously and runs the cycle on a spawned task.
    /// Returns `false` when a cycle is already in progress.
    #[must_use]
    pub fn spawn_cycle(&self) -> bool {
        let Some(guard) = ProcessingGuard::acquire(&self.inner) else {
            tracing::info!("collection cycle already in progress; not spawning");
            return false;
        };
        let collector = self.clone();
        tokio::spawn(async move {
            collector.run_locked(guard).await;
        });
        true
    }

    async fn run_locked(&self, _guard: ProcessingGuard) -> CycleReport {
        let p = &self.inner.pipeline;
        let started_at = p.clock.now();
        tracing::info!(demo_mode = p.source.is_demo_mode(), "collection cycle started");

        let mut artists = PhaseReport::new("artists");
        let result = phases::collect_artists(p, &mut artists).await;
        settle(&mut artists, result);
        let mut keywords = PhaseReport::new("keywords");
        let result = phases::collect_keywords(p, &mut keywords).await;
        settle(&mut keywords, result);
        let mut refresh = PhaseReport::new("refresh");
        let result = phases::refresh_keywords(p, &mut refresh).await;
        settle(&mut refresh, result);
        let mut breakout = PhaseReport::new("breakout");
        let result = phases::recompute_artist_breakouts(p, &mut breakout).await;
        settle(&mut breakout, result);

        let finished_at = p.clock.now();
        *self
            .inner
            .last_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(finished_at);

        let report = CycleReport {
            started_at,
            finished_at,
            demo_mode: p.source.is_demo_mode(),
            phases: vec![artists, keywords, refresh, breakout],
        };
        tracing::info!(
            persisted = report.persisted(),
            failures = report.failures(),
            write_failures = report.write_failures(),
            demo_mode = report.demo_mode,
            "collection cycle complete"
        );

        // No receivers is not an error.
        let _ = self.inner.updates.send(DataUpdated {
            timestamp: finished_at,
            last_run: finished_at,
        });
        report
    }

    /// Fires one cycle immediately and schedules one every
    /// [`CollectorConfig::interval`]. A second call while running is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Scheduler`] if the job scheduler cannot be
    /// built or started; the collector is left stopped.
    pub async fn start(&self) -> Result<(), CollectorError> {
        if self.inner.running.swap(true, Ordering::AcqRel) {
            tracing::info!("collector already running");
            return Ok(());
        }

        let mut slot = self.inner.scheduler.lock().await;
        match self.build_scheduler().await {
            Ok(scheduler) => *slot = Some(scheduler),
            Err(e) => {
                self.inner.running.store(false, Ordering::Release);
                return Err(e.into());
            }
        }
        drop(slot);

        let collector = self.clone();
        tokio::spawn(async move {
            collector.run_scheduled().await;
        });
        tracing::info!(
            interval_secs = self.inner.pipeline.config.interval.as_secs(),
            "collector started"
        );
        Ok(())
    }

    async fn build_scheduler(&self) -> Result<JobScheduler, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;
        let collector = self.clone();
        let interval = self.inner.pipeline.config.interval;
        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let collector = collector.clone();
            Box::pin(async move {
                collector.run_scheduled().await;
            })
        })?;
        scheduler.add(job).await?;
        scheduler.start().await?;
        Ok(scheduler)
    }

    async fn run_scheduled(&self) {
        tracing::info!("scheduler: starting collection run");
        if let CycleOutcome::Completed(report) = self.run_cycle().await {
            tracing::info!(
                persisted = report.persisted(),
                "scheduler: collection run complete"
            );
        }
    }

    /// Cancels future cycles. A cycle already in flight runs to completion.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Scheduler`] if the scheduler fails to shut down.
    pub async fn stop(&self) -> Result<(), CollectorError> {
        if !self.inner.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let scheduler = self.inner.scheduler.lock().await.take();
        if let Some(mut scheduler) = scheduler {
            scheduler.shutdown().await?;
        }
        tracing::info!("collector stopped");
        Ok(())
    }
}

fn settle(report: &mut PhaseReport, result: Result<(), CollectorError>) {
    if let Err(e) = result {
        tracing::error!(phase = report.name, error = %e, "phase failed");
        report.error = Some(e.to_string());
    }
}
