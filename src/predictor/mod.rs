//! Similarity Predictor
//!
//! Guesses the violation and outcome of a new stop from historical stops
//! of drivers with the same gender and a similar age.
//!
//! ```text
//! snapshot ──► filter (gender ==, |age diff| <= 10) ──► mode(violation)
//!                  │ empty                            └─► mode(stop_outcome)
//!                  ▼
//!           strict: decline / permissive: whole snapshot
//! ```

mod summary;


use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::{non_blank, Gender, StopDataset, StopRecord};

/// Maximum age difference, inclusive, for a record to count as similar
pub const AGE_WINDOW: i64 = 10;

/// Label reported when a column holds no usable value
pub const UNKNOWN_LABEL: &str = "Unknown";

/// What to do when no record is similar enough
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Decline to predict
    Strict,
    /// Take the modes over the whole snapshot
    Permissive,
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(FallbackMode::Strict),
            "permissive" => Ok(FallbackMode::Permissive),
            other => Err(format!("unknown fallback mode '{}'", other)),
        }
    }
}

impl fmt::Display for FallbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackMode::Strict => f.write_str("strict"),
            FallbackMode::Permissive => f.write_str("permissive"),
        }
    }
}

/// Attributes of the stop being predicted
#[derive(Debug, Clone)]
pub struct PredictionQuery {
    pub gender: Gender,
    pub age: i32,
    pub stop_time: NaiveTime,
    pub stop_duration: String,
    pub search_conducted: bool,
    pub drugs_related: bool,
    pub county_name: String,
    pub driver_race: String,
    pub vehicle_number: String,
    pub search_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub predicted_violation: String,
    pub predicted_outcome: String,
    pub summary: String,
    /// Records the modes were taken over
    pub matched_records: usize,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    #[error("no stop records are available")]
    EmptyDataset,

    #[error("no stops found for {gender} drivers within ten years of age {age}")]
    NoSimilarRecords { gender: Gender, age: i32 },
}

#[derive(Debug, Clone, Copy)]
pub struct Predictor {
    fallback: FallbackMode,
}

impl Predictor {
    pub fn new(fallback: FallbackMode) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> FallbackMode {
        self.fallback
    }

    pub fn predict(&self, dataset: &StopDataset, query: &PredictionQuery) -> Result<Prediction, PredictError> {
        if dataset.is_empty() {
            return Err(PredictError::EmptyDataset);
        }

        let similar: Vec<&StopRecord> = dataset
            .records()
            .iter()
            .filter(|r| is_similar(r, query))
            .collect();

        let (subset, used_fallback) = if !similar.is_empty() {
            (similar, false)
        } else {
            match self.fallback {
                FallbackMode::Strict => {
                    return Err(PredictError::NoSimilarRecords {
                        gender: query.gender,
                        age: query.age,
                    });
                }
                FallbackMode::Permissive => {
                    tracing::debug!(
                        gender = %query.gender,
                        age = query.age,
                        "No similar stops, falling back to whole snapshot"
                    );
                    (dataset.records().iter().collect(), true)
                }
            }
        };

        let predicted_violation = mode_of(&subset, |r| r.violation.as_deref());
        let predicted_outcome = mode_of(&subset, |r| r.stop_outcome.as_deref());
        let summary = summary::render(query, &predicted_violation, &predicted_outcome);

        Ok(Prediction {
            predicted_violation,
            predicted_outcome,
            summary,
            matched_records: subset.len(),
            used_fallback,
        })
    }
}

fn is_similar(record: &StopRecord, query: &PredictionQuery) -> bool {
    let same_gender = record.driver_gender.as_deref() == Some(query.gender.code());
    let close_age = record
        .driver_age
        .is_some_and(|age| (i64::from(age) - i64::from(query.age)).abs() <= AGE_WINDOW);
    same_gender && close_age
}

/// Most frequent non-blank value; ties go to the smallest label
fn mode_of<F>(records: &[&StopRecord], column: F) -> String
where
    F: Fn(&StopRecord) -> Option<&str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in records.iter().filter_map(|r| non_blank(column(*r))) {
        *counts.entry(value).or_insert(0) += 1;
    }

    // BTreeMap iterates labels ascending, so keep the first maximum seen
    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((label, count));
        }
    }

    best.map(|(label, _)| label.to_string())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}
