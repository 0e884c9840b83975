//! Database module - PostgreSQL connection and schema

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Simple query protocol: the schema is several statements
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Traffic stop ledger
CREATE TABLE IF NOT EXISTS police_logs (
    id BIGSERIAL PRIMARY KEY,
    stop_date DATE,
    stop_time TIME,
    county_name VARCHAR(255),
    driver_gender VARCHAR(10),
    driver_age INT,
    driver_race VARCHAR(100),
    violation VARCHAR(255),
    search_conducted BOOLEAN,
    search_type VARCHAR(255),
    stop_outcome VARCHAR(255),
    is_arrested BOOLEAN,
    stop_duration VARCHAR(50),
    drugs_related_stop BOOLEAN,
    vehicle_number VARCHAR(50)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_police_logs_violation ON police_logs(violation);
CREATE INDEX IF NOT EXISTS idx_police_logs_outcome ON police_logs(stop_outcome);
CREATE INDEX IF NOT EXISTS idx_police_logs_gender_age ON police_logs(driver_gender, driver_age);
"#;
