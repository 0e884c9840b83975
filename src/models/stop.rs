//! Traffic stop model

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of `police_logs`
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct StopRecord {
    pub id: i64,
    pub stop_date: Option<NaiveDate>,
    pub stop_time: Option<NaiveTime>,
    pub county_name: Option<String>,
    pub driver_gender: Option<String>,
    pub driver_age: Option<i32>,
    pub driver_race: Option<String>,
    pub violation: Option<String>,
    pub search_conducted: Option<bool>,
    pub search_type: Option<String>,
    pub stop_outcome: Option<String>,
    pub is_arrested: Option<bool>,
    pub stop_duration: Option<String>,
    pub drugs_related_stop: Option<bool>,
    pub vehicle_number: Option<String>,
}

/// Driver gender, stored as its single-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M", alias = "male")]
    Male,
    #[serde(rename = "F", alias = "female")]
    Female,
}

impl Gender {
    /// Code as stored in the `driver_gender` column
    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    /// Word used in narrative text
    pub fn word(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Count of one categorical value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Headline numbers shown above the charts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMetrics {
    pub total_stops: usize,
    pub total_arrests: usize,
    pub total_warnings: usize,
    pub drug_related_stops: usize,
}

/// Immutable snapshot of every stop, loaded once per request
#[derive(Debug, Clone, Default)]
pub struct StopDataset {
    records: Vec<StopRecord>,
}

impl StopDataset {
    pub fn new(records: Vec<StopRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[StopRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn metrics(&self) -> KeyMetrics {
        let outcome_contains = |needle: &str| {
            self.records
                .iter()
                .filter(|r| {
                    r.stop_outcome
                        .as_deref()
                        .is_some_and(|o| o.to_lowercase().contains(needle))
                })
                .count()
        };

        KeyMetrics {
            total_stops: self.records.len(),
            total_arrests: outcome_contains("arrest"),
            total_warnings: outcome_contains("warning"),
            drug_related_stops: self
                .records
                .iter()
                .filter(|r| r.drugs_related_stop == Some(true))
                .count(),
        }
    }

    /// Frequency table of one column, most common first.
    /// Null and blank values are skipped; equal counts order by label.
    pub fn value_counts<F>(&self, column: F) -> Vec<CategoryCount>
    where
        F: Fn(&StopRecord) -> Option<&str>,
    {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in self.records.iter().filter_map(|r| non_blank(column(r))) {
            *counts.entry(value).or_insert(0) += 1;
        }

        let mut table: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(label, count)| CategoryCount { label: label.to_string(), count })
            .collect();
        table.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        table
    }

    /// Distinct stop durations in order of first appearance
    pub fn stop_durations(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(|r| non_blank(r.stop_duration.as_deref()))
            .filter(|d| seen.insert(*d))
            .map(str::to_string)
            .collect()
    }
}

/// Treats empty and whitespace-only strings like NULL
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
