//! Live integration tests for beatscope-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/beatscope-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use beatscope_core::{CompetitionLevel, EntityKind, ScoredEntity, TrendDirection};
use beatscope_db::{
    CreateOutcome, DbError, EntityPatch, EntityStore, EntityTable, PgEntityStore,
};

fn scored(name: &str, momentum: f64) -> ScoredEntity {
    ScoredEntity {
        name: name.to_string(),
        kind: EntityKind::Keyword,
        genre: "drill".to_string(),
        competition_level: CompetitionLevel::Medium,
        competition_score: 60.0,
        trend_momentum: momentum,
        opportunity_score: 45.0,
        breakout_potential: false,
        trend_direction: TrendDirection::Stable,
        estimated_search_volume: 1_500,
        avg_views: 150_000,
        confidence: 72,
        video_count: 3,
        channel_count: 3,
        avg_engagement: 3.5,
        growth_rate: 25.0,
        related_keywords: vec!["dave type beat".to_string()],
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_skips_duplicate_names(pool: sqlx::PgPool) {
    let store = PgEntityStore::new(pool);
    let first = store
        .create(EntityTable::Keywords, &scored("central cee type beat", 60.0))
        .await
        .unwrap();
    let second = store
        .create(EntityTable::Keywords, &scored("central cee type beat", 80.0))
        .await
        .unwrap();

    assert!(matches!(first, CreateOutcome::Inserted(_)));
    assert_eq!(second, CreateOutcome::Duplicate);

    let rows = store
        .list(EntityTable::Keywords, "-created_at", 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!((rows[0].entity.trend_momentum - 60.0).abs() < f64::EPSILON);
    assert_eq!(rows[0].entity.related_keywords, vec!["dave type beat"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_orders_descending_with_limit(pool: sqlx::PgPool) {
    let store = PgEntityStore::new(pool);
    for (name, m) in [("yeat", 40.0), ("gunna", 85.0), ("future", 70.0)] {
        store
            .create(EntityTable::Artists, &scored(name, m))
            .await
            .unwrap();
    }

    let rows = store
        .list(EntityTable::Artists, "-trend_momentum", 2)
        .await
        .unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.entity.name.as_str()).collect();
    assert_eq!(names, vec!["gunna", "future"]);
    assert!(rows.iter().all(|r| r.entity.kind == EntityKind::Artist));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_rejects_unknown_order_field(pool: sqlx::PgPool) {
    let store = PgEntityStore::new(pool);
    let result = store.list(EntityTable::Artists, "-genre", 5).await;
    assert!(matches!(result, Err(DbError::InvalidOrderField(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_coalesces_missing_fields(pool: sqlx::PgPool) {
    let store = PgEntityStore::new(pool);
    let CreateOutcome::Inserted(id) = store
        .create(EntityTable::Artists, &scored("ice spice", 50.0))
        .await
        .unwrap()
    else {
        panic!("expected insert");
    };

    let patch = EntityPatch {
        breakout_potential: Some(true),
        trend_momentum: Some(53.0),
        ..EntityPatch::default()
    };
    store.update(EntityTable::Artists, id, &patch).await.unwrap();

    let row = &store
        .list(EntityTable::Artists, "name", 1)
        .await
        .unwrap()[0];
    assert!(row.entity.breakout_potential);
    assert!((row.entity.trend_momentum - 53.0).abs() < f64::EPSILON);
    assert_eq!(row.entity.competition_level, CompetitionLevel::Medium);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_and_delete_report_missing_rows(pool: sqlx::PgPool) {
    let store = PgEntityStore::new(pool);
    let patch = EntityPatch {
        growth_rate: Some(1.0),
        ..EntityPatch::default()
    };
    assert!(matches!(
        store.update(EntityTable::Keywords, 404, &patch).await,
        Err(DbError::NotFound)
    ));
    assert!(matches!(
        store.delete(EntityTable::Keywords, 404).await,
        Err(DbError::NotFound)
    ));
}
