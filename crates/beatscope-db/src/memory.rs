//! In-process [`EntityStore`] for tests and `--memory` CLI runs.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use beatscope_core::{Clock, ScoredEntity, SystemClock};

use crate::store::{CreateOutcome, EntityPatch, EntityStore, EntityTable, OrderBy, StoredEntity};
use crate::DbError;

#[derive(Default)]
struct Tables {
    next_id: i64,
    rows: HashMap<EntityTable, Vec<StoredEntity>>,
}

/// Mirrors [`crate::PgEntityStore`]: unique names per table, `[-]field`
/// ordering with an `id` tie-break, and `NotFound` on unknown ids.
pub struct MemoryEntityStore {
    tables: Mutex<Tables>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryEntityStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryEntityStore {
    /// `clock` stamps `created_at` and `last_updated` on insert.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock,
        }
    }

    /// Number of rows currently held for `table`.
    #[must_use]
    pub fn count(&self, table: EntityTable) -> usize {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.rows.get(&table).map_or(0, Vec::len)
    }
}

fn compare(a: &StoredEntity, b: &StoredEntity, field: &str) -> Ordering {
    let (x, y) = (&a.entity, &b.entity);
    match field {
        "created_at" => a.created_at.cmp(&b.created_at),
        "last_updated" => a.last_updated.cmp(&b.last_updated),
        "trend_momentum" => x.trend_momentum.total_cmp(&y.trend_momentum),
        "opportunity_score" => x.opportunity_score.total_cmp(&y.opportunity_score),
        "competition_score" => x.competition_score.total_cmp(&y.competition_score),
        "estimated_search_volume" => x.estimated_search_volume.cmp(&y.estimated_search_volume),
        "avg_views" => x.avg_views.cmp(&y.avg_views),
        "name" => x.name.cmp(&y.name),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn create(
        &self,
        table: EntityTable,
        entity: &ScoredEntity,
    ) -> Result<CreateOutcome, DbError> {
        let now = self.clock.now();
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.next_id += 1;
        let id = tables.next_id;
        let rows = tables.rows.entry(table).or_default();
        if rows.iter().any(|r| r.entity.name == entity.name) {
            tracing::info!(table = table.table_name(), name = %entity.name, "duplicate entity skipped");
            return Ok(CreateOutcome::Duplicate);
        }
        let mut entity = entity.clone();
        entity.kind = table.kind();
        rows.push(StoredEntity {
            id,
            entity,
            created_at: now,
            last_updated: now,
        });
        Ok(CreateOutcome::Inserted(id))
    }

    async fn list(
        &self,
        table: EntityTable,
        order_by: &str,
        limit: u32,
    ) -> Result<Vec<StoredEntity>, DbError> {
        let order = OrderBy::parse(order_by)?;
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rows = tables.rows.get(&table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| {
            let ord = compare(a, b, order.field).then(a.id.cmp(&b.id));
            if order.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn update(
        &self,
        table: EntityTable,
        id: i64,
        patch: &EntityPatch,
    ) -> Result<(), DbError> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let row = tables
            .rows
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or(DbError::NotFound)?;
        patch.apply(row);
        Ok(())
    }

    async fn delete(&self, table: EntityTable, id: i64) -> Result<(), DbError> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.rows.get_mut(&table).ok_or(DbError::NotFound)?;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
