//! Prediction handler
//!
//! Invoked once per form submission; the result is returned, never stored.

use axum::{extract::State, Json};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::{AppState, AppResult};
use crate::models::Gender;
use crate::predictor::{FallbackMode, PredictError, Prediction, PredictionQuery, Predictor};
use crate::store::fetch_snapshot;

#[derive(Debug, Deserialize, Validate)]
pub struct PredictionRequest {
    pub driver_gender: Gender,
    #[validate(range(min = 16, max = 100))]
    pub driver_age: i32,
    pub stop_time: NaiveTime,
    #[validate(length(min = 1, max = 64))]
    pub stop_duration: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub search_conducted: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub drugs_related_stop: bool,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub county_name: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub driver_race: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub vehicle_number: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub search_type: String,
    /// Overrides the configured fallback for this request
    pub fallback: Option<FallbackMode>,
}

impl PredictionRequest {
    fn into_query(self) -> PredictionQuery {
        PredictionQuery {
            gender: self.driver_gender,
            age: self.driver_age,
            stop_time: self.stop_time,
            stop_duration: self.stop_duration,
            search_conducted: self.search_conducted,
            drugs_related: self.drugs_related_stop,
            county_name: self.county_name,
            driver_race: self.driver_race,
            vehicle_number: self.vehicle_number,
            search_type: self.search_type,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeclineReason {
    EmptyDataset,
    NoSimilarRecords,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Predicted(Prediction),
    Declined { reason: DeclineReason, message: String },
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    #[serde(flatten)]
    pub outcome: PredictionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_error: Option<String>,
}

/// Predict violation and outcome for a submitted stop
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<PredictionRequest>,
) -> AppResult<Json<PredictionResponse>> {
    req.validate()?;

    let predictor = Predictor::new(req.fallback.unwrap_or(state.config.fallback_mode));
    let query = req.into_query();
    let fetched = fetch_snapshot(state.store.as_ref()).await;

    let outcome = match predictor.predict(&fetched.data, &query) {
        Ok(prediction) => {
            tracing::info!(
                gender = %query.gender,
                age = query.age,
                matched = prediction.matched_records,
                fallback = prediction.used_fallback,
                "Predicted {} / {}",
                prediction.predicted_violation,
                prediction.predicted_outcome
            );
            PredictionOutcome::Predicted(prediction)
        }
        Err(e) => {
            tracing::warn!(mode = %predictor.fallback(), "Prediction declined: {}", e);
            decline(e)
        }
    };

    Ok(Json(PredictionResponse {
        outcome,
        data_error: fetched.error,
    }))
}

fn decline(err: PredictError) -> PredictionOutcome {
    match err {
        PredictError::EmptyDataset => PredictionOutcome::Declined {
            reason: DeclineReason::EmptyDataset,
            message: "No stop records are available to predict from.".to_string(),
        },
        PredictError::NoSimilarRecords { .. } => PredictionOutcome::Declined {
            reason: DeclineReason::NoSimilarRecords,
            message: "Not enough similar records found to confidently predict.".to_string(),
        },
    }
}

/// Form flags arrive as booleans, 0/1 or "0"/"1"
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(u8),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Number(0) => Ok(false),
        Flag::Number(1) => Ok(true),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "false" | "no" => Ok(false),
            "1" | "true" | "yes" => Ok(true),
            other => Err(serde::de::Error::custom(format!("invalid flag '{}'", other))),
        },
        Flag::Number(n) => Err(serde::de::Error::custom(format!("invalid flag {}", n))),
    }
}
