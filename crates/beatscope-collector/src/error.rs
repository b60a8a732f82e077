use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    #[error("store error: {0}")]
    Store(#[from] beatscope_db::DbError),
}
