//! Error types for sqltools.
//!
//! Driver failures are carried as their original `sqlx::Error` so callers see
//! exactly what the database reported.

use thiserror::Error;

/// Main error type for sqltools operations.
#[derive(Error, Debug)]
pub enum SqlToolsError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// Statement errors (syntax errors, missing objects, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(#[source] sqlx::Error),

    /// A temporary table handle was used after it was closed.
    #[error("Temporary table '{0}' is already closed")]
    TempTableClosed(String),

    /// Caller input that cannot be turned into SQL (empty identifiers, etc.)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Helper that the connected backend cannot express.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rendering a frame as CSV or JSON failed.
    #[error("Output error: {0}")]
    Output(String),
}

impl SqlToolsError {
    /// Creates an invalid input error with the given message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates an unsupported-operation error with the given message.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an output error with the given message.
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::TempTableClosed(_) => "Temporary Table Error",
            Self::InvalidInput(_) => "Invalid Input",
            Self::Unsupported(_) => "Unsupported",
            Self::Config(_) => "Configuration Error",
            Self::Output(_) => "Output Error",
        }
    }

    /// Returns the underlying driver error, if this error came from the database.
    pub fn driver_error(&self) -> Option<&sqlx::Error> {
        match self {
            Self::Connection(e) | Self::Query(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias using SqlToolsError.
pub type Result<T> = std::result::Result<T, SqlToolsError>;
