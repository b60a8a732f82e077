//! Postgres-backed [`EntityStore`] over the `trending_artists` and `keywords` tables.

use async_trait::async_trait;
use beatscope_core::{CompetitionLevel, EntityKind, ScoredEntity, TrendDirection};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::store::{CreateOutcome, EntityPatch, EntityStore, EntityTable, OrderBy, StoredEntity};
use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from either entity table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct EntityRow {
    id: i64,
    name: String,
    genre: String,
    competition_level: String,
    competition_score: f64,
    trend_momentum: f64,
    opportunity_score: f64,
    breakout_potential: bool,
    trend_direction: String,
    estimated_search_volume: i64,
    avg_views: i64,
    confidence: i16,
    video_count: i32,
    channel_count: i32,
    avg_engagement: f64,
    growth_rate: f64,
    related_keywords: Vec<String>,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

const COLUMNS: &str = "id, name, genre, competition_level, competition_score, trend_momentum, \
     opportunity_score, breakout_potential, trend_direction, estimated_search_volume, avg_views, \
     confidence, video_count, channel_count, avg_engagement, growth_rate, related_keywords, \
     created_at, last_updated";

impl EntityRow {
    fn into_stored(self, kind: EntityKind) -> Result<StoredEntity, DbError> {
        let competition_level = CompetitionLevel::parse(&self.competition_level).ok_or_else(|| {
            DbError::Decode {
                column: "competition_level",
                value: self.competition_level.clone(),
            }
        })?;
        let trend_direction =
            TrendDirection::parse(&self.trend_direction).ok_or_else(|| DbError::Decode {
                column: "trend_direction",
                value: self.trend_direction.clone(),
            })?;
        let confidence = u8::try_from(self.confidence).map_err(|_| DbError::Decode {
            column: "confidence",
            value: self.confidence.to_string(),
        })?;

        Ok(StoredEntity {
            id: self.id,
            entity: ScoredEntity {
                name: self.name,
                kind,
                genre: self.genre,
                competition_level,
                competition_score: self.competition_score,
                trend_momentum: self.trend_momentum,
                opportunity_score: self.opportunity_score,
                breakout_potential: self.breakout_potential,
                trend_direction,
                estimated_search_volume: self.estimated_search_volume,
                avg_views: self.avg_views,
                confidence,
                video_count: self.video_count,
                channel_count: self.channel_count,
                avg_engagement: self.avg_engagement,
                growth_rate: self.growth_rate,
                related_keywords: self.related_keywords,
            },
            created_at: self.created_at,
            last_updated: self.last_updated,
        })
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    /// Insert a scored entity, skipping silently when the name already exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the insert fails for any other reason.
    async fn create(
        &self,
        table: EntityTable,
        entity: &ScoredEntity,
    ) -> Result<CreateOutcome, DbError> {
        let sql = format!(
            "INSERT INTO {table} \
                 (name, genre, competition_level, competition_score, trend_momentum, \
                  opportunity_score, breakout_potential, trend_direction, estimated_search_volume, \
                  avg_views, confidence, video_count, channel_count, avg_engagement, growth_rate, \
                  related_keywords) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             ON CONFLICT (name) DO NOTHING \
             RETURNING id",
            table = table.table_name(),
        );
        let id: Option<i64> = sqlx::query_scalar(&sql)
            .bind(&entity.name)
            .bind(&entity.genre)
            .bind(entity.competition_level.as_str())
            .bind(entity.competition_score)
            .bind(entity.trend_momentum)
            .bind(entity.opportunity_score)
            .bind(entity.breakout_potential)
            .bind(entity.trend_direction.as_str())
            .bind(entity.estimated_search_volume)
            .bind(entity.avg_views)
            .bind(i16::from(entity.confidence))
            .bind(entity.video_count)
            .bind(entity.channel_count)
            .bind(entity.avg_engagement)
            .bind(entity.growth_rate)
            .bind(&entity.related_keywords)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match id {
            Some(id) => CreateOutcome::Inserted(id),
            None => {
                tracing::info!(table = table.table_name(), name = %entity.name, "duplicate entity skipped");
                CreateOutcome::Duplicate
            }
        })
    }

    /// # Errors
    ///
    /// Returns [`DbError::InvalidOrderField`] for an unlisted field,
    /// [`DbError::Decode`] for a row with an unknown enum label, or
    /// [`DbError::Sqlx`] if the query fails.
    async fn list(
        &self,
        table: EntityTable,
        order_by: &str,
        limit: u32,
    ) -> Result<Vec<StoredEntity>, DbError> {
        let order = OrderBy::parse(order_by)?;
        let sql = format!(
            "SELECT {COLUMNS} FROM {table} ORDER BY {order} LIMIT $1",
            table = table.table_name(),
            order = order.to_sql(),
        );
        let rows = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| row.into_stored(table.kind()))
            .collect()
    }

    /// `COALESCE` keeps every column the patch leaves as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no row has `id`, or [`DbError::Sqlx`]
    /// if the update fails.
    async fn update(
        &self,
        table: EntityTable,
        id: i64,
        patch: &EntityPatch,
    ) -> Result<(), DbError> {
        let sql = format!(
            "UPDATE {table} SET \
                 competition_level = COALESCE($2, competition_level), \
                 competition_score = COALESCE($3, competition_score), \
                 trend_momentum = COALESCE($4, trend_momentum), \
                 opportunity_score = COALESCE($5, opportunity_score), \
                 breakout_potential = COALESCE($6, breakout_potential), \
                 trend_direction = COALESCE($7, trend_direction), \
                 estimated_search_volume = COALESCE($8, estimated_search_volume), \
                 avg_views = COALESCE($9, avg_views), \
                 growth_rate = COALESCE($10, growth_rate), \
                 last_updated = COALESCE($11, last_updated) \
             WHERE id = $1",
            table = table.table_name(),
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(patch.competition_level.map(CompetitionLevel::as_str))
            .bind(patch.competition_score)
            .bind(patch.trend_momentum)
            .bind(patch.opportunity_score)
            .bind(patch.breakout_potential)
            .bind(patch.trend_direction.map(TrendDirection::as_str))
            .bind(patch.estimated_search_volume)
            .bind(patch.avg_views)
            .bind(patch.growth_rate)
            .bind(patch.last_updated)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no row has `id`, or [`DbError::Sqlx`]
    /// if the delete fails.
    async fn delete(&self, table: EntityTable, id: i64) -> Result<(), DbError> {
        let sql = format!("DELETE FROM {table} WHERE id = $1", table = table.table_name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
