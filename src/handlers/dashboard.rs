//! Dashboard handlers: logs overview, key metrics and chart series
//!
//! Each request works on its own freshly loaded snapshot.

use axum::{extract::{Query, State}, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::models::{CategoryCount, KeyMetrics, StopRecord};
use crate::store::fetch_snapshot;

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Deserialize, Default)]
pub struct LogsFilter {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LogsOverview {
    pub total: usize,
    pub records: Vec<StopRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub metrics: KeyMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

#[derive(Debug, Serialize)]
pub struct ChartSeries {
    pub title: &'static str,
    pub kind: ChartKind,
    pub points: Vec<CategoryCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StopDurations {
    pub durations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Paged view of the raw stop table
pub async fn logs(
    State(state): State<AppState>,
    Query(filter): Query<LogsFilter>,
) -> Json<LogsOverview> {
    let fetched = fetch_snapshot(state.store.as_ref()).await;
    let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = filter.offset.unwrap_or(0);

    let warning = fetched
        .data
        .is_empty()
        .then(|| "No data found in the police_logs table. Please check your database.".to_string());

    Json(LogsOverview {
        total: fetched.data.len(),
        records: fetched.data.records().iter().skip(offset).take(limit).cloned().collect(),
        warning,
        error: fetched.error,
    })
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let fetched = fetch_snapshot(state.store.as_ref()).await;
    Json(MetricsResponse {
        metrics: fetched.data.metrics(),
        error: fetched.error,
    })
}

pub async fn violations_chart(State(state): State<AppState>) -> Json<ChartSeries> {
    let fetched = fetch_snapshot(state.store.as_ref()).await;
    Json(ChartSeries {
        title: "Violation Types",
        kind: ChartKind::Bar,
        points: fetched.data.value_counts(|r| r.violation.as_deref()),
        error: fetched.error,
    })
}

pub async fn genders_chart(State(state): State<AppState>) -> Json<ChartSeries> {
    let fetched = fetch_snapshot(state.store.as_ref()).await;
    Json(ChartSeries {
        title: "Gender Distribution",
        kind: ChartKind::Pie,
        points: fetched.data.value_counts(|r| r.driver_gender.as_deref()),
        error: fetched.error,
    })
}

/// Choices for the prediction form's duration field
pub async fn stop_durations(State(state): State<AppState>) -> Json<StopDurations> {
    let fetched = fetch_snapshot(state.store.as_ref()).await;
    Json(StopDurations {
        durations: fetched.data.stop_durations(),
        error: fetched.error,
    })
}
