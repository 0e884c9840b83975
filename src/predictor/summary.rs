//! Narrative text for a prediction

use super::PredictionQuery;

pub(super) fn render(query: &PredictionQuery, violation: &str, outcome: &str) -> String {
    let search_text = if query.search_conducted {
        "A search was conducted"
    } else {
        "No search was conducted"
    };
    let drug_text = if query.drugs_related {
        "was drug-related"
    } else {
        "was not drug-related"
    };

    let mut summary = format!(
        "🚗 A {}-year-old {} driver was stopped for **{}** at **{}**. {}, and they received a **{}**. \
         The stop lasted **{}** and {}.",
        query.age,
        query.gender.word(),
        violation,
        query.stop_time.format("%I:%M %p"),
        search_text,
        outcome,
        query.stop_duration,
        drug_text,
    );

    let clauses = [
        optional_clause(&query.county_name, "The stop took place in", "Location was not specified."),
        optional_clause(&query.driver_race, "The driver's race was recorded as", "Driver race was not recorded."),
        optional_clause(&query.vehicle_number, "The vehicle number was", "Vehicle number was not provided."),
        optional_clause(&query.search_type, "The search type was", "Search type was not recorded."),
    ];
    for clause in clauses {
        summary.push(' ');
        summary.push_str(&clause);
    }

    summary
}

fn optional_clause(value: &str, lead: &str, missing: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        missing.to_string()
    } else {
        format!("{} **{}**.", lead, value)
    }
}
