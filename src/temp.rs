//! Temporary table handles.
//!
//! A [`TempTable`] creates a connection-scoped temporary table when it is
//! built and drops it on [`TempTable::close`]. Closing is explicit: dropping
//! an open handle only logs a warning, and the table lives until the
//! client's connection closes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::db::DatabaseBackend;
use crate::error::{Result, SqlToolsError};
use crate::query::QueryExecutor;
use crate::sql::quote_ident;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a temporary table handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TempTableState {
    /// The table exists and can be queried by name.
    Open { name: String },
    /// The table was dropped through this handle.
    Closed { name: String },
}

/// A temporary table tied to the executor that created it.
pub struct TempTable<'a> {
    executor: QueryExecutor<'a>,
    state: TempTableState,
}

impl<'a> TempTable<'a> {
    /// Creates temporary table `name` from a `SELECT` statement.
    ///
    /// Any temporary table with the same name is dropped first.
    pub async fn create(executor: &QueryExecutor<'a>, name: &str, select_sql: &str) -> Result<Self> {
        let create = format!("CREATE TEMP TABLE {} AS {}", quote_ident(name)?, select_sql);
        Self::open(executor, name, &create).await
    }

    /// Creates a temporary table with a generated name from a `SELECT` statement.
    pub async fn from_select(executor: &QueryExecutor<'a>, select_sql: &str) -> Result<Self> {
        let name = generate_name();
        Self::create(executor, &name, select_sql).await
    }

    /// Runs a statement that creates a temporary table, taking the table name
    /// from the statement itself.
    ///
    /// Recognizes `SELECT ... INTO TEMP [TABLE] name ...` and
    /// `CREATE TEMP[ORARY] TABLE [IF NOT EXISTS] name ...`.
    pub async fn from_command(executor: &QueryExecutor<'a>, command: &str) -> Result<Self> {
        let name = extract_temp_name(command, executor.backend()).ok_or_else(|| {
            SqlToolsError::invalid_input("statement does not create a named temporary table")
        })?;
        Self::open(executor, &name, command).await
    }

    async fn open(executor: &QueryExecutor<'a>, name: &str, create_sql: &str) -> Result<Self> {
        let qualified = temp_qualified(executor.backend(), name)?;
        executor
            .run_command(&format!("DROP TABLE IF EXISTS {qualified}"))
            .await?;
        executor.run_command(create_sql).await?;
        debug!(table = name, "temporary table created");

        Ok(Self {
            executor: *executor,
            state: TempTableState::Open {
                name: name.to_string(),
            },
        })
    }

    /// The table name, usable in SQL while the handle is open.
    pub fn name(&self) -> &str {
        match &self.state {
            TempTableState::Open { name } | TempTableState::Closed { name } => name,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &TempTableState {
        &self.state
    }

    /// Returns true until the table has been dropped through this handle.
    pub fn is_open(&self) -> bool {
        matches!(self.state, TempTableState::Open { .. })
    }

    /// Drops the table.
    ///
    /// Closing an already closed handle returns
    /// [`SqlToolsError::TempTableClosed`] without touching the database. If
    /// the drop itself fails the handle stays open.
    pub async fn close(&mut self) -> Result<()> {
        let name = match &self.state {
            TempTableState::Open { name } => name.clone(),
            TempTableState::Closed { name } => {
                return Err(SqlToolsError::TempTableClosed(name.clone()))
            }
        };

        let qualified = temp_qualified(self.executor.backend(), &name)?;
        self.executor
            .run_command(&format!("DROP TABLE {qualified}"))
            .await?;
        debug!(table = %name, "temporary table dropped");

        self.state = TempTableState::Closed { name };
        Ok(())
    }
}

impl Drop for TempTable<'_> {
    fn drop(&mut self) {
        if let TempTableState::Open { name } = &self.state {
            warn!(
                table = %name,
                "temporary table handle dropped without close(); table remains until the connection closes"
            );
        }
    }
}

/// Name qualified with the backend's temporary schema, so a permanent table
/// with the same name is never touched.
fn temp_qualified(backend: DatabaseBackend, name: &str) -> Result<String> {
    let schema = match backend {
        DatabaseBackend::Postgres => "pg_temp",
        DatabaseBackend::Sqlite => "temp",
    };
    Ok(format!("{schema}.{}", quote_ident(name)?))
}

fn generate_name() -> String {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("sqltools_tmp_{}_{id}", std::process::id())
}

fn temp_name_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(
                r#"(?i)(\w*)\s*\bINTO\s+TEMP(?:ORARY)?\s+(?:TABLE\s+)?("(?:[^"]|"")+"|\w+)"#,
            )
            .expect("valid regex"),
            Regex::new(
                r#"(?i)()\bCREATE\s+TEMP(?:ORARY)?\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?("(?:[^"]|"")+"|\w+)"#,
            )
            .expect("valid regex"),
        ]
    })
}

/// Words that can follow `INTO temp` when `temp` is itself a table name.
const NOT_A_TABLE_NAME: &[&str] = &[
    "select", "values", "default", "using", "with", "as", "on", "set", "where", "from",
];

/// Pulls the table name out of a temp-table-creating statement.
///
/// Unquoted names are case-folded the way the backend folds them, so the
/// name can be quoted safely afterwards.
fn extract_temp_name(command: &str, backend: DatabaseBackend) -> Option<String> {
    let raw = temp_name_patterns()
        .iter()
        .flat_map(|re| re.captures_iter(command))
        .find(|caps| {
            // `INSERT INTO temp ...` and `MERGE INTO temp ...` write to a
            // table called temp.
            let verb = caps.get(1).map_or("", |m| m.as_str());
            let name = caps.get(2).map_or("", |m| m.as_str());
            !verb.eq_ignore_ascii_case("insert")
                && !verb.eq_ignore_ascii_case("merge")
                && !NOT_A_TABLE_NAME
                    .iter()
                    .any(|word| word.eq_ignore_ascii_case(name))
        })?
        .get(2)?
        .as_str();

    let name = match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(quoted) => quoted.replace("\"\"", "\""),
        None if backend == DatabaseBackend::Postgres => raw.to_lowercase(),
        None => raw.to_string(),
    };
    Some(name)
}
