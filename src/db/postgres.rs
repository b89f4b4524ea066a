//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseBackend, DatabaseClient, Frame, Row, Value};
use crate::error::{Result, SqlToolsError};
use async_trait::async_trait;
use super::pg_value::{decode_value, oid};
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{
    PgArgumentBuffer, PgArguments, PgColumn, PgPool, PgPoolOptions, PgRow, PgTypeInfo,
};
use sqlx::query::Query;
use sqlx::{Column as SqlxColumn, Executor, Postgres, Row as SqlxRow, Statement, Type, TypeInfo};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long to wait for the connection to become available.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL database client.
///
/// The pool is pinned to one connection that never expires, so temporary
/// tables and `SET` commands persist until [`DatabaseClient::close`].
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects using the given configuration.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect(&conn_str)
            .await
            .map_err(SqlToolsError::Connection)?;

        debug!("Successfully connected to database");
        Ok(Self { pool })
    }

    /// Creates a PostgresClient from an existing connection pool.
    ///
    /// Temporary tables are only reliable if the pool holds a single connection.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Describes the statement's result columns without fetching rows.
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
impl DatabaseClient for PostgresClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
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

fn column_info(col: &PgColumn) -> ColumnInfo {
    ColumnInfo::new(col.name(), col.type_info().name())
}

/// A NULL parameter sent with the `unknown` type, so the server infers its
/// type from context the way it does for a literal `NULL`.
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(oid::UNKNOWN))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(
        &self,
        _buf: &mut PgArgumentBuffer,
    ) -> std::result::Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

/// Binds each value as the next positional parameter.
fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(UntypedNull),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::String(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
        };
    }
    query
}

/// Converts a sqlx PgRow to our Row type.
///
/// A cell that cannot be decoded fails the whole query rather than turning
/// into NULL.
fn convert_row(row: &PgRow) -> Result<Row> {
    (0..row.columns().len())
        .map(|index| {
            let raw = row.try_get_raw(index).map_err(SqlToolsError::Query)?;
            decode_value(raw).map_err(|source| {
                SqlToolsError::Query(sqlx::Error::ColumnDecode {
                    index: format!("{index:?}"),
                    source,
                })
            })
        })
        .collect()
}
