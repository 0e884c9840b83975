//! Canned aggregate queries offered on the dashboard

use serde::Serialize;

/// The fixed catalogue of aggregate queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedQuery {
    TotalStops,
    StopsByViolation,
    ArrestsVsWarnings,
    AverageDriverAge,
    TopSearchTypes,
    StopsByGender,
    TopViolationArrests,
}

#[derive(Debug, Serialize)]
pub struct CannedQueryInfo {
    pub key: &'static str,
    pub title: &'static str,
}

impl CannedQuery {
    pub const ALL: [CannedQuery; 7] = [
        CannedQuery::TotalStops,
        CannedQuery::StopsByViolation,
        CannedQuery::ArrestsVsWarnings,
        CannedQuery::AverageDriverAge,
        CannedQuery::TopSearchTypes,
        CannedQuery::StopsByGender,
        CannedQuery::TopViolationArrests,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CannedQuery::TotalStops => "total_stops",
            CannedQuery::StopsByViolation => "stops_by_violation",
            CannedQuery::ArrestsVsWarnings => "arrests_vs_warnings",
            CannedQuery::AverageDriverAge => "average_driver_age",
            CannedQuery::TopSearchTypes => "top_search_types",
            CannedQuery::StopsByGender => "stops_by_gender",
            CannedQuery::TopViolationArrests => "top_violation_arrests",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            CannedQuery::TotalStops => "Total Stops",
            CannedQuery::StopsByViolation => "Stops by Violation",
            CannedQuery::ArrestsVsWarnings => "Arrests vs Warnings",
            CannedQuery::AverageDriverAge => "Average Driver Age",
            CannedQuery::TopSearchTypes => "Top 5 Search Types",
            CannedQuery::StopsByGender => "Stops by Gender",
            CannedQuery::TopViolationArrests => "Top Violation (Arrests)",
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            CannedQuery::TotalStops => {
                "SELECT COUNT(*) AS total_stops FROM police_logs"
            }
            CannedQuery::StopsByViolation => {
                "SELECT violation, COUNT(*) AS count FROM police_logs GROUP BY violation ORDER BY count DESC"
            }
            CannedQuery::ArrestsVsWarnings => {
                "SELECT stop_outcome, COUNT(*) AS count FROM police_logs GROUP BY stop_outcome"
            }
            CannedQuery::AverageDriverAge => {
                "SELECT AVG(driver_age)::FLOAT8 AS average_age FROM police_logs"
            }
            CannedQuery::TopSearchTypes => {
                "SELECT search_type, COUNT(*) AS count FROM police_logs \
                 WHERE search_type <> '' GROUP BY search_type ORDER BY count DESC LIMIT 5"
            }
            CannedQuery::StopsByGender => {
                "SELECT driver_gender, COUNT(*) AS count FROM police_logs GROUP BY driver_gender"
            }
            CannedQuery::TopViolationArrests => {
                "SELECT violation, COUNT(*) AS count FROM police_logs \
                 WHERE stop_outcome LIKE '%Arrest%' GROUP BY violation ORDER BY count DESC LIMIT 1"
            }
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.key() == key)
    }

    pub fn info(self) -> CannedQueryInfo {
        CannedQueryInfo {
            key: self.key(),
            title: self.title(),
        }
    }
}
