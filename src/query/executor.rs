//! Query execution.
//!
//! Thin layer over [`DatabaseClient`] that every helper and the temporary
//! table handle go through. Errors come back exactly as the client produced
//! them.

use std::time::Instant;

use tracing::debug;

use crate::db::{DatabaseBackend, DatabaseClient, Frame, Value};
use crate::error::Result;

/// Runs SQL against one database client.
#[derive(Clone, Copy)]
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self { db }
    }

    /// The backend of the underlying client, used to pick SQL dialects.
    pub fn backend(&self) -> DatabaseBackend {
        self.db.backend()
    }

    /// Runs a query and materializes the full result set.
    pub async fn run_query(&self, sql: &str) -> Result<Frame> {
        self.run_query_with(sql, &[]).await
    }

    /// Runs a query with positional bind parameters.
    pub async fn run_query_with(&self, sql: &str, params: &[Value]) -> Result<Frame> {
        debug!(sql, params = params.len(), "running query");
        let frame = self.db.execute_query(sql, params).await?;
        debug!(
            rows = frame.height(),
            columns = frame.width(),
            elapsed = ?frame.execution_time,
            "query finished"
        );
        Ok(frame)
    }

    /// Runs statements that return no rows and reports the rows affected.
    pub async fn run_command(&self, sql: &str) -> Result<u64> {
        debug!(sql, "running command");
        let start = Instant::now();
        let affected = self.db.execute_command(sql).await?;
        debug!(affected, elapsed = ?start.elapsed(), "command finished");
        Ok(affected)
    }
}
