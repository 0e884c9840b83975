//! Stop data access
//!
//! Handlers only see the [`StopStore`] trait. Fetch failures never escape
//! the `fetch_*` helpers: callers get an empty result and the error text.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row, TypeInfo, ValueRef};

use crate::AppResult;
use crate::models::{CannedQuery, StopDataset, StopRecord};

/// One result row, column name to value
pub type JsonRow = Map<String, Value>;

#[axum::async_trait]
pub trait StopStore: Send + Sync {
    /// Every stop, in insertion order
    async fn load_all(&self) -> AppResult<Vec<StopRecord>>;

    /// Run a read-only query
    async fn fetch_rows(&self, sql: &str) -> AppResult<Vec<JsonRow>>;
}

/// Data plus the error that emptied it, if any
#[derive(Debug, Serialize)]
pub struct Fetched<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Default> Fetched<T> {
    fn from_result(result: AppResult<T>, what: &str) -> Self {
        match result {
            Ok(data) => Self { data, error: None },
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", what, e);
                Self {
                    data: T::default(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Load the full snapshot for one request
pub async fn fetch_snapshot(store: &dyn StopStore) -> Fetched<StopDataset> {
    let fetched = Fetched::from_result(store.load_all().await, "stop records");
    Fetched {
        data: StopDataset::new(fetched.data),
        error: fetched.error,
    }
}

pub async fn fetch_rows(store: &dyn StopStore, query: CannedQuery) -> Fetched<Vec<JsonRow>> {
    Fetched::from_result(store.fetch_rows(query.sql()).await, query.key())
}

/// PostgreSQL-backed store
pub struct PgStopStore {
    pool: PgPool,
}

impl PgStopStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[axum::async_trait]
impl StopStore for PgStopStore {
    async fn load_all(&self) -> AppResult<Vec<StopRecord>> {
        let records = sqlx::query_as::<_, StopRecord>("SELECT * FROM police_logs ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn fetch_rows(&self, sql: &str) -> AppResult<Vec<JsonRow>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }
}

fn row_to_json(row: &PgRow) -> AppResult<JsonRow> {
    let mut out = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value = if row.try_get_raw(i)?.is_null() {
            Value::Null
        } else {
            match column.type_info().name() {
                "INT2" => Value::from(row.try_get::<i16, _>(i)?),
                "INT4" => Value::from(row.try_get::<i32, _>(i)?),
                "INT8" => Value::from(row.try_get::<i64, _>(i)?),
                "FLOAT4" => Value::from(row.try_get::<f32, _>(i)?),
                "FLOAT8" => Value::from(row.try_get::<f64, _>(i)?),
                "BOOL" => Value::from(row.try_get::<bool, _>(i)?),
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Value::from(row.try_get::<String, _>(i)?),
                "DATE" => Value::from(row.try_get::<chrono::NaiveDate, _>(i)?.to_string()),
                "TIME" => Value::from(row.try_get::<chrono::NaiveTime, _>(i)?.to_string()),
                other => {
                    tracing::debug!("Column {} has unsupported type {}", column.name(), other);
                    Value::Null
                }
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

#[cfg(test)]
pub mod memory {
    //! In-memory store for handler tests

    use super::*;
    use crate::AppError;

    #[derive(Default)]
    pub struct MemoryStore {
        pub records: Vec<StopRecord>,
        pub rows: Vec<JsonRow>,
        pub fail: bool,
    }

    #[axum::async_trait]
    impl StopStore for MemoryStore {
        async fn load_all(&self) -> AppResult<Vec<StopRecord>> {
            if self.fail {
                return Err(AppError::DatabaseError("connection refused".to_string()));
            }
            Ok(self.records.clone())
        }

        async fn fetch_rows(&self, _sql: &str) -> AppResult<Vec<JsonRow>> {
            if self.fail {
                return Err(AppError::DatabaseError("connection refused".to_string()));
            }
            Ok(self.rows.clone())
        }
    }
}
