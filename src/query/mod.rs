//! Query execution for sqltools.
//!
//! Everything that talks to the database goes through [`QueryExecutor`].

pub mod executor;

pub use executor::QueryExecutor;
