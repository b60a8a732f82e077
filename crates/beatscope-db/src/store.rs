//! The persistence contract shared by the Postgres and in-memory stores.

use async_trait::async_trait;
use beatscope_core::{CompetitionLevel, EntityKind, ScoredEntity, TrendDirection};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::DbError;

/// Fields `list` accepts in its `order_by` argument, with or without a
/// leading `-`.
pub const ORDER_FIELDS: &[&str] = &[
    "created_at",
    "last_updated",
    "trend_momentum",
    "opportunity_score",
    "competition_score",
    "estimated_search_volume",
    "avg_views",
    "name",
];

/// The two record kinds. Both tables share one schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTable {
    Artists,
    Keywords,
}

impl EntityTable {
    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Artists => "trending_artists",
            Self::Keywords => "keywords",
        }
    }

    #[must_use]
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Artists => EntityKind::Artist,
            Self::Keywords => EntityKind::Keyword,
        }
    }
}

/// A parsed `[-]field` ordering. Ties are broken by `id` in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static str,
    pub descending: bool,
}

impl OrderBy {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidOrderField`] when the field is not in
    /// [`ORDER_FIELDS`].
    pub fn parse(raw: &str) -> Result<Self, DbError> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let field = ORDER_FIELDS
            .iter()
            .find(|f| **f == name)
            .ok_or_else(|| DbError::InvalidOrderField(raw.to_string()))?;
        Ok(Self {
            field,
            descending,
        })
    }

    #[must_use]
    pub fn newest_first() -> Self {
        Self {
            field: "created_at",
            descending: true,
        }
    }

    /// `ORDER BY` body. `field` only ever holds an [`ORDER_FIELDS`] entry.
    pub(crate) fn to_sql(self) -> String {
        let dir = if self.descending { "DESC" } else { "ASC" };
        format!("{field} {dir}, id {dir}", field = self.field)
    }
}

impl Default for OrderBy {
    fn default() -> Self {
        Self::newest_first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Inserted(i64),
    /// A row with the same name already existed; nothing was written.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEntity {
    pub id: i64,
    #[serde(flatten)]
    pub entity: ScoredEntity,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch {
    pub competition_level: Option<CompetitionLevel>,
    pub competition_score: Option<f64>,
    pub trend_momentum: Option<f64>,
    pub opportunity_score: Option<f64>,
    pub breakout_potential: Option<bool>,
    pub trend_direction: Option<TrendDirection>,
    pub estimated_search_volume: Option<i64>,
    pub avg_views: Option<i64>,
    pub growth_rate: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl EntityPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply(&self, stored: &mut StoredEntity) {
        let e = &mut stored.entity;
        if let Some(v) = self.competition_level {
            e.competition_level = v;
        }
        if let Some(v) = self.competition_score {
            e.competition_score = v;
        }
        if let Some(v) = self.trend_momentum {
            e.trend_momentum = v;
        }
        if let Some(v) = self.opportunity_score {
            e.opportunity_score = v;
        }
        if let Some(v) = self.breakout_potential {
            e.breakout_potential = v;
        }
        if let Some(v) = self.trend_direction {
            e.trend_direction = v;
        }
        if let Some(v) = self.estimated_search_volume {
            e.estimated_search_volume = v;
        }
        if let Some(v) = self.avg_views {
            e.avg_views = v;
        }
        if let Some(v) = self.growth_rate {
            e.growth_rate = v;
        }
        if let Some(v) = self.last_updated {
            stored.last_updated = v;
        }
    }
}

/// Generic create/list/update/delete over scored entities.
///
/// `create` never fails on a duplicate name; it reports
/// [`CreateOutcome::Duplicate`] so callers can skip existence checks.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create(
        &self,
        table: EntityTable,
        entity: &ScoredEntity,
    ) -> Result<CreateOutcome, DbError>;

    /// `order_by` is `[-]field` over [`ORDER_FIELDS`].
    async fn list(
        &self,
        table: EntityTable,
        order_by: &str,
        limit: u32,
    ) -> Result<Vec<StoredEntity>, DbError>;

    /// [`DbError::NotFound`] when no row has `id`.
    async fn update(
        &self,
        table: EntityTable,
        id: i64,
        patch: &EntityPatch,
    ) -> Result<(), DbError>;

    /// [`DbError::NotFound`] when no row has `id`.
    async fn delete(&self, table: EntityTable, id: i64) -> Result<(), DbError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_by_parses_direction_prefix() {
        let asc = OrderBy::parse("trend_momentum").unwrap();
        assert_eq!(asc.field, "trend_momentum");
        assert!(!asc.descending);

        let desc = OrderBy::parse("-created_at").unwrap();
        assert_eq!(desc, OrderBy::newest_first());
        assert_eq!(desc.to_sql(), "created_at DESC, id DESC");
    }

    #[test]
    fn order_by_rejects_unlisted_fields() {
        for raw in ["", "-", "id; DROP TABLE keywords", "-genre", "Name"] {
            assert!(
                matches!(OrderBy::parse(raw), Err(DbError::InvalidOrderField(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(EntityPatch::default().is_empty());
        let patch = EntityPatch {
            breakout_potential: Some(true),
            ..EntityPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
