use super::*;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use beatscope_collector::CollectorConfig;
use beatscope_core::{
    Clock, CompetitionLevel, EntityKind, ScoredEntity, SystemClock, TrendDirection,
};
use beatscope_db::{EntityTable, MemoryEntityStore, PgEntityStore};
use beatscope_signals::NoJitter;
use beatscope_youtube::{MockVideoGenerator, ResilientVideoSource, VideoSource};
use tower::ServiceExt;

use crate::middleware::{OperatorKeys, TriggerThrottle};

fn entity(name: &str, momentum: f64) -> ScoredEntity {
    ScoredEntity {
        name: name.to_string(),
        kind: EntityKind::Artist,
        genre: "trap".to_string(),
        competition_level: CompetitionLevel::Medium,
        competition_score: 55.0,
        trend_momentum: momentum,
        opportunity_score: 48.0,
        breakout_potential: false,
        trend_direction: TrendDirection::Stable,
        estimated_search_volume: 4_200,
        avg_views: 61_000,
        confidence: 60,
        video_count: 5,
        channel_count: 3,
        avg_engagement: 4.5,
        growth_rate: 12.0,
        related_keywords: vec!["gunna".to_string()],
    }
}

fn state_with(store: Arc<dyn EntityStore>, pool: Option<PgPool>) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let source: Arc<dyn VideoSource> = Arc::new(ResilientVideoSource::new(
        None,
        MockVideoGenerator::seeded(3, Arc::clone(&clock)),
    ));
    // Default delays keep a spawned cycle in flight for the conflict test.
    let collector = Collector::new(
        Arc::clone(&source),
        Arc::clone(&store),
        Arc::clone(&clock),
        Arc::new(NoJitter),
        CollectorConfig::default(),
    );
    let insights = Arc::new(PredictiveAnalytics::new(
        source,
        Arc::clone(&store),
        clock,
        chrono::Duration::minutes(30),
    ));
    AppState {
        store,
        collector,
        insights,
        pool,
    }
}

fn memory_app() -> (Arc<MemoryEntityStore>, Router) {
    let store = Arc::new(MemoryEntityStore::default());
    let keys = OperatorKeys::parse("", true).expect("keys");
    let app = build_app(
        state_with(store.clone(), None),
        keys,
        TriggerThrottle::default(),
    );
    (store, app)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(-5)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn already_running_maps_to_conflict() {
    let response = ApiError::new("req-1", "already_running", "busy").into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[test]
fn invalid_order_field_is_a_validation_error() {
    let err = map_db_error(
        "req-1".to_string(),
        &DbError::InvalidOrderField("views".to_string()),
    );
    assert_eq!(err.error.code, "validation_error");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_memory_store() {
    let (_store, app) = memory_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-health")
    );
    let json = json_body(response).await;
    assert_eq!(json["data"]["database"], "memory");
    assert_eq!(json["meta"]["request_id"], "req-health");
}

#[tokio::test]
async fn artists_list_honours_order_and_limit() {
    let (store, app) = memory_app();
    for (name, momentum) in [("gunna", 40.0), ("future", 80.0), ("yeat", 60.0)] {
        store
            .create(EntityTable::Artists, &entity(name, momentum))
            .await
            .expect("seed");
    }

    let response = app
        .oneshot(get("/api/v1/artists?order=-trend_momentum&limit=2"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let data = json["data"].as_array().expect("data array");
    let names: Vec<_> = data.iter().filter_map(|r| r["name"].as_str()).collect();
    assert_eq!(names, vec!["future", "yeat"]);
    assert_eq!(data[0]["competition_level"], "medium");
    assert!(data[0]["id"].is_i64());
}

#[tokio::test]
async fn keywords_reject_unknown_order_field() {
    let (_store, app) = memory_app();
    let response = app
        .oneshot(get("/api/v1/keywords?order=-views"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn status_and_insights_flag_demo_mode() {
    let (store, app) = memory_app();
    store
        .create(EntityTable::Artists, &entity("central cee", 70.0))
        .await
        .expect("seed");

    let status = app
        .clone()
        .oneshot(get("/api/v1/status"))
        .await
        .expect("response");
    assert_eq!(status.status(), StatusCode::OK);
    let json = json_body(status).await;
    assert_eq!(json["data"]["demo_mode"], true);
    assert_eq!(json["data"]["is_running"], false);

    let insights = app
        .oneshot(get("/api/v1/insights"))
        .await
        .expect("response");
    assert_eq!(insights.status(), StatusCode::OK);
    let json = json_body(insights).await;
    assert_eq!(json["data"]["demo_mode"], true);
    assert!(json["data"]["genre_trends"].is_array());
}

#[tokio::test]
async fn operator_routes_require_bearer_token() {
    let store = Arc::new(MemoryEntityStore::default());
    let keys = OperatorKeys::parse("secret", false).expect("keys");
    let app = build_app(state_with(store, None), keys, TriggerThrottle::default());

    let response = app
        .oneshot(post("/api/v1/source/reset", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn collect_triggers_beyond_the_burst_are_throttled() {
    let store = Arc::new(MemoryEntityStore::default());
    let keys = OperatorKeys::parse("secret", false).expect("keys");
    let throttle = TriggerThrottle::new(1, std::time::Duration::from_secs(3_600));
    let app = build_app(state_with(store, None), keys, throttle);

    // Rejected callers do not spend the single token.
    let anonymous = app
        .clone()
        .oneshot(post("/api/v1/collect", None))
        .await
        .expect("response");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let first = app
        .clone()
        .oneshot(post("/api/v1/collect", Some("secret")))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = app
        .clone()
        .oneshot(post("/api/v1/collect", Some("secret")))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = json_body(second).await;
    assert_eq!(json["error"]["code"], "rate_limited");

    // Only the trigger is throttled.
    let reset = app
        .oneshot(post("/api/v1/source/reset", Some("secret")))
        .await
        .expect("response");
    assert_eq!(reset.status(), StatusCode::OK);
}

#[tokio::test]
async fn second_collect_while_running_conflicts() {
    let store = Arc::new(MemoryEntityStore::default());
    let keys = OperatorKeys::parse("secret", false).expect("keys");
    let app = build_app(state_with(store, None), keys, TriggerThrottle::default());

    let first = app
        .clone()
        .oneshot(post("/api/v1/collect", Some("secret")))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = app
        .oneshot(post("/api/v1/collect", Some("secret")))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = json_body(second).await;
    assert_eq!(json["error"]["code"], "already_running");
}

#[tokio::test]
async fn reset_without_api_key_stays_in_demo_mode() {
    let (_store, app) = memory_app();
    let response = app
        .oneshot(post("/api/v1/source/reset", None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["demo_mode"], true);
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_and_listing_against_postgres(pool: sqlx::PgPool) {
    let store = Arc::new(PgEntityStore::new(pool.clone()));
    store
        .create(EntityTable::Keywords, &entity("drake type beat", 50.0))
        .await
        .expect("seed");
    let keys = OperatorKeys::parse("", true).expect("keys");
    let app = build_app(
        state_with(store, Some(pool)),
        keys,
        TriggerThrottle::default(),
    );

    let health = app
        .clone()
        .oneshot(get("/api/v1/health"))
        .await
        .expect("response");
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(json_body(health).await["data"]["database"], "ok");

    let response = app
        .oneshot(get("/api/v1/keywords"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"][0]["name"], "drake type beat");
}
