//! Persistence for scored artists and keywords: the [`EntityStore`] seam,
//! its Postgres and in-memory implementations, and pool setup.

use std::time::Duration;

use beatscope_core::AppConfig;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod entities;
pub mod memory;
pub mod store;

pub use entities::PgEntityStore;
pub use memory::MemoryEntityStore;
pub use store::{
    CreateOutcome, EntityPatch, EntityStore, EntityTable, OrderBy, StoredEntity, ORDER_FIELDS,
};

// Relative to this crate's manifest.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error("cannot order by `{0}`")]
    InvalidOrderField(String),
    #[error("column `{column}` holds unrecognised value `{value}`")]
    Decode { column: &'static str, value: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Opens a pool sized by the `db_*` settings of `config`.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] if no URL is configured, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect(config: &AppConfig) -> Result<PgPool, DbError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or(DbError::MissingDatabaseUrl)?;
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections.min(config.db_max_connections))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect(url)
        .await?;
    tracing::debug!(
        max_connections = config.db_max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Brings the schema up to date and returns its version.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if any migration fails.
pub async fn migrate(pool: &PgPool) -> Result<Option<i64>, DbError> {
    MIGRATOR.run(pool).await?;
    Ok(MIGRATOR.iter().map(|m| m.version).max())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if `SELECT 1` fails.
pub async fn ping(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
