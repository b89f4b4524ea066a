//! Database abstraction layer for sqltools.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably.

mod mock;
mod pg_value;
mod postgres;
mod sqlite;
mod types;

pub use mock::{MockDatabaseClient, RecordedStatement};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, Frame, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the default port for this backend. SQLite has none.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::Sqlite => 0,
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Returns the bind placeholder for the 1-based parameter `position`.
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Self::Postgres => format!("${position}"),
            Self::Sqlite => "?".to_string(),
        }
    }
}

/// Creates a database client for the given backend and configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    info!("Connecting to {}", config.display_string());
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database clients.
///
/// Each client owns a single long-lived connection, so session state such as
/// temporary tables stays visible across calls. Statements run in autocommit
/// mode.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// The backend this client talks to.
    fn backend(&self) -> DatabaseBackend;

    /// Executes a SQL query with positional bind parameters and returns the
    /// full result set.
    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<Frame>;

    /// Executes one or more statements that return no rows, returning the
    /// number of rows affected.
    async fn execute_command(&self, sql: &str) -> Result<u64>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
