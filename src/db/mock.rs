//! Mock database client for testing.
//!
//! Records every statement it receives so tests can assert on generated SQL
//! without a live database.

use super::{DatabaseBackend, DatabaseClient, Frame, Value};
use crate::error::{Result, SqlToolsError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A statement received by [`MockDatabaseClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// A mock database client that returns predefined results.
///
/// Queries pop frames from a queue (an empty frame once the queue is drained).
/// Any statement containing the configured failure pattern returns a query
/// error instead.
pub struct MockDatabaseClient {
    backend: DatabaseBackend,
    responses: Mutex<VecDeque<Frame>>,
    fail_pattern: Mutex<Option<String>>,
    statements: Mutex<Vec<RecordedStatement>>,
}

impl MockDatabaseClient {
    /// Creates a new mock client that speaks the given backend's dialect.
    pub fn new(backend: DatabaseBackend) -> Self {
        Self {
            backend,
            responses: Mutex::new(VecDeque::new()),
            fail_pattern: Mutex::new(None),
            statements: Mutex::new(Vec::new()),
        }
    }

    /// Queues a frame to be returned by the next query.
    pub fn push_response(&self, frame: Frame) {
        lock(&self.responses).push_back(frame);
    }

    /// Makes every statement containing `pattern` fail; `None` clears it.
    pub fn fail_matching(&self, pattern: Option<&str>) {
        *lock(&self.fail_pattern) = pattern.map(String::from);
    }

    /// Returns every statement received so far.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        lock(&self.statements).clone()
    }

    /// Returns the most recent statement, if any.
    pub fn last_statement(&self) -> Option<RecordedStatement> {
        lock(&self.statements).last().cloned()
    }

    fn record(&self, sql: &str, params: &[Value]) -> Result<()> {
        lock(&self.statements).push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        match lock(&self.fail_pattern).as_deref() {
            Some(pattern) if sql.contains(pattern) => Err(SqlToolsError::Query(
                sqlx::Error::Protocol(format!("mock failure for: {sql}")),
            )),
            _ => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<Frame> {
        self.record(sql, params)?;
        Ok(lock(&self.responses).pop_front().unwrap_or_default())
    }

    async fn execute_command(&self, sql: &str) -> Result<u64> {
        self.record(sql, &[])?;
        Ok(0)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
