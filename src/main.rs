//! SecureCheck Dashboard Server
//!
//! Backend for the police check-post dashboard: stop log overview, key
//! metrics, chart series, canned aggregate queries and outcome prediction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SECURECHECK DASHBOARD                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────────────┐ │
//! │  │  API      │  │  Dashboard    │  │  Similarity         │ │
//! │  │  Gateway  │  │  Aggregations │  │  Predictor          │ │
//! │  │  (Axum)   │  │               │  │  (pure)             │ │
//! │  └─────┬─────┘  └───────┬───────┘  └──────────┬──────────┘ │
//! │        └────────────────┼─────────────────────┘            │
//! │                         ▼                                   │
//! │                  ┌─────────────┐                            │
//! │                  │  StopStore  │ ── PostgreSQL police_logs  │
//! │                  └─────────────┘                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod predictor;
mod store;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "securecheck_dashboard=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("SecureCheck Dashboard starting...");
    tracing::info!("Database: {}", config.redacted_database_url());
    tracing::info!("Prediction fallback: {}", config.fallback_mode);
    if config.is_production() {
        tracing::info!("Running in production mode");
    }

    // Initialize database pool
    let pool = db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    // Build application state
    let state = AppState {
        store: Arc::new(store::PgStopStore::new(pool)),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn store::StopStore>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let dashboard_routes = Router::new()
        .route("/api/v1/logs", get(handlers::dashboard::logs))
        .route("/api/v1/metrics", get(handlers::dashboard::metrics))
        .route("/api/v1/charts/violations", get(handlers::dashboard::violations_chart))
        .route("/api/v1/charts/genders", get(handlers::dashboard::genders_chart))
        .route("/api/v1/stop-durations", get(handlers::dashboard::stop_durations));

    let query_routes = Router::new()
        .route("/api/v1/queries", get(handlers::queries::list))
        .route("/api/v1/queries/:key/run", post(handlers::queries::run));

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/predictions", post(handlers::predictions::create))
        .merge(dashboard_routes)
        .merge(query_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::models::StopRecord;
    use crate::predictor::FallbackMode;
    use crate::store::memory::MemoryStore;

    fn stop(id: i64, gender: &str, age: i32, violation: &str, outcome: &str) -> StopRecord {
        StopRecord {
            id,
            driver_gender: Some(gender.to_string()),
            driver_age: Some(age),
            violation: Some(violation.to_string()),
            stop_outcome: Some(outcome.to_string()),
            stop_duration: Some("0-15 Min".to_string()),
            drugs_related_stop: Some(id % 2 == 0),
            ..Default::default()
        }
    }

    fn app_with(store: MemoryStore, fallback_mode: FallbackMode) -> Router {
        create_router(AppState {
            store: Arc::new(store),
            config: config::Config {
                fallback_mode,
                ..config::Config::default()
            },
        })
    }

    fn app() -> Router {
        let store = MemoryStore {
            records: vec![
                stop(1, "M", 25, "Speeding", "Citation"),
                stop(2, "M", 28, "Speeding", "Citation"),
                stop(3, "M", 60, "DUI", "Arrest Driver"),
            ],
            ..Default::default()
        };
        app_with(store, FallbackMode::Strict)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn prediction_form(gender: &str) -> Value {
        json!({
            "driver_gender": gender,
            "driver_age": 27,
            "stop_time": "21:40:00",
            "stop_duration": "16-30 Min",
            "search_conducted": "0",
            "drugs_related_stop": "1",
            "vehicle_number": "ABC123"
        })
    }

    #[tokio::test]
    async fn test_health_reports_fallback_mode() {
        let (status, body) = send(app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["prediction_fallback"], "strict");
    }

    #[tokio::test]
    async fn test_prediction_for_similar_driver() {
        let (status, body) = send(app(), "POST", "/api/v1/predictions", Some(prediction_form("M"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "predicted");
        assert_eq!(body["predicted_violation"], "Speeding");
        assert_eq!(body["predicted_outcome"], "Citation");
        assert_eq!(body["matched_records"], 2);
        let summary = body["summary"].as_str().unwrap();
        assert!(summary.contains("at **09:40 PM**"));
        assert!(summary.contains("The vehicle number was **ABC123**."));
        assert!(summary.contains("and was drug-related."));
    }

    #[tokio::test]
    async fn test_strict_prediction_declines() {
        let (status, body) = send(app(), "POST", "/api/v1/predictions", Some(prediction_form("female"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "declined");
        assert_eq!(body["reason"], "no_similar_records");
        assert_eq!(body["message"], "Not enough similar records found to confidently predict.");
    }

    #[tokio::test]
    async fn test_request_can_override_fallback() {
        let mut form = prediction_form("F");
        form["fallback"] = json!("permissive");
        let (_, body) = send(app(), "POST", "/api/v1/predictions", Some(form)).await;

        assert_eq!(body["status"], "predicted");
        assert_eq!(body["predicted_violation"], "Speeding");
        assert_eq!(body["used_fallback"], true);
        assert_eq!(body["matched_records"], 3);
    }

    #[tokio::test]
    async fn test_prediction_with_unreachable_database_declines() {
        let store = MemoryStore { fail: true, ..Default::default() };
        let app = app_with(store, FallbackMode::Permissive);
        let (status, body) = send(app, "POST", "/api/v1/predictions", Some(prediction_form("M"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "declined");
        assert_eq!(body["reason"], "empty_dataset");
        assert_eq!(body["data_error"], "database error: connection refused");
    }

    #[tokio::test]
    async fn test_invalid_prediction_form_is_rejected() {
        let mut form = prediction_form("M");
        form["driver_age"] = json!(101);
        let (status, body) = send(app(), "POST", "/api/v1/predictions", Some(form)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_metrics_and_charts() {
        let (_, metrics) = send(app(), "GET", "/api/v1/metrics", None).await;
        assert_eq!(metrics["total_stops"], 3);
        assert_eq!(metrics["total_arrests"], 1);
        assert_eq!(metrics["total_warnings"], 0);
        assert_eq!(metrics["drug_related_stops"], 1);

        let (_, chart) = send(app(), "GET", "/api/v1/charts/violations", None).await;
        assert_eq!(chart["kind"], "bar");
        assert_eq!(chart["points"][0], json!({ "label": "Speeding", "count": 2 }));

        let (_, genders) = send(app(), "GET", "/api/v1/charts/genders", None).await;
        assert_eq!(genders["kind"], "pie");
        assert_eq!(genders["points"], json!([{ "label": "M", "count": 3 }]));
    }

    #[tokio::test]
    async fn test_logs_are_paged() {
        let (_, body) = send(app(), "GET", "/api/v1/logs?limit=1&offset=1", None).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["records"].as_array().unwrap().len(), 1);
        assert_eq!(body["records"][0]["id"], 2);
        assert!(body.get("warning").is_none());
    }

    #[tokio::test]
    async fn test_empty_table_warns() {
        let app = app_with(MemoryStore::default(), FallbackMode::Permissive);
        let (status, body) = send(app, "GET", "/api/v1/logs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert!(body["warning"].as_str().unwrap().starts_with("No data found"));
    }

    #[tokio::test]
    async fn test_stop_durations() {
        let (_, body) = send(app(), "GET", "/api/v1/stop-durations", None).await;
        assert_eq!(body["durations"], json!(["0-15 Min"]));
    }

    #[tokio::test]
    async fn test_query_catalogue_and_run() {
        let (_, catalogue) = send(app(), "GET", "/api/v1/queries", None).await;
        assert_eq!(catalogue.as_array().unwrap().len(), 7);
        assert_eq!(catalogue[0], json!({ "key": "total_stops", "title": "Total Stops" }));

        let (status, body) = send(app(), "POST", "/api/v1/queries/stops_by_gender/run", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Stops by Gender");
        assert_eq!(body["message"], "No results returned for this query.");

        let (status, _) = send(app(), "POST", "/api/v1/queries/nope/run", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_failure_is_reported_not_raised() {
        let store = MemoryStore { fail: true, ..Default::default() };
        let app = app_with(store, FallbackMode::Strict);
        let (status, body) = send(app, "POST", "/api/v1/queries/total_stops/run", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"], json!([]));
        assert_eq!(body["error"], "database error: connection refused");
    }
}
