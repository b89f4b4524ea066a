//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! for SQLite databases (files or `:memory:`) using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseBackend, DatabaseClient, Frame, Row, Value};
use crate::error::{Result, SqlToolsError};
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteColumn, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Sqlite, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

/// SQLite database client.
///
/// Like [`super::PostgresClient`], the pool holds exactly one connection for
/// the client's lifetime. For `:memory:` databases that connection *is* the
/// database.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Connects using the given configuration.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        let options = SqliteConnectOptions::from_str(&conn_str)
            .map_err(|e| SqlToolsError::config(format!("Invalid SQLite connection string: {e}")))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(SqlToolsError::Connection)?;

        debug!("Opened SQLite database {}", config.display_string());
        Ok(Self { pool })
    }

    async fn describe_columns(&self, sql: &str) -> Vec<ColumnInfo> {
        match self.pool.prepare(sql).await {
            Ok(statement) => statement.columns().iter().map(column_info).collect(),
            Err(e) => {
                debug!("Could not describe statement: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<Frame> {
        let start = Instant::now();

        let result = bind_params(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(SqlToolsError::Query)?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row.columns().iter().map(column_info).collect(),
            None => self.describe_columns(sql).await,
        };

        let rows = result.iter().map(convert_row).collect::<Result<Vec<Row>>>()?;

        debug!(
            "Query returned {} rows in {:?}",
            rows.len(),
            execution_time
        );

        Ok(Frame::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn execute_command(&self, sql: &str) -> Result<u64> {
        let result = sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(SqlToolsError::Query)?;
        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn column_info(col: &SqliteColumn) -> ColumnInfo {
    ColumnInfo::new(col.name(), col.type_info().name())
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::String(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
        };
    }
    query
}

fn convert_row(row: &SqliteRow) -> Result<Row> {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a cell using its runtime storage class.
///
/// SQLite columns are dynamically typed, so the declared column type (absent
/// for expressions) says little about the value actually stored. TEXT that
/// is not valid UTF-8 comes back as bytes.
fn convert_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(SqlToolsError::Query)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_uppercase();

    let decoded = match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(index).map(Value::Int),
        "REAL" | "NUMERIC" => row.try_get_unchecked::<f64, _>(index).map(Value::Float),
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(index).map(Value::Bytes),
        _ => row.try_get_unchecked::<String, _>(index).map(Value::String),
    };

    decoded
        .or_else(|_| row.try_get_unchecked::<Vec<u8>, _>(index).map(Value::Bytes))
        .map_err(SqlToolsError::Query)
}
