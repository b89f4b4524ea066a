//! sqltools - helpers for exploring a SQL database from Rust or the shell.
//!
//! Queries come back as a [`db::Frame`]; the [`helpers`] module wraps common
//! catalog lookups and [`temp::TempTable`] manages connection-scoped
//! temporary tables.

pub mod config;
pub mod db;
pub mod error;
pub mod helpers;
pub mod output;
pub mod query;
pub mod sql;
pub mod temp;

pub use db::{connect, DatabaseClient, Frame, Value};
pub use error::{Result, SqlToolsError};
pub use query::QueryExecutor;
pub use temp::TempTable;
