//! Introspection helpers.
//!
//! Each helper builds one statement for the connected backend, runs it
//! through the [`QueryExecutor`], and hands back whatever the database
//! returned. Search terms and names used as values are bound; names used as
//! identifiers are quoted with [`crate::sql`].

use crate::config::DEFAULT_HEAD_ROWS;
use crate::db::{DatabaseBackend, Frame, Value};
use crate::error::{Result, SqlToolsError};
use crate::query::QueryExecutor;
use crate::sql::{contains_pattern, quote_ident, quote_literal, quote_literal_for, quote_qualified};

const PG_FIND_COLS: &str = r#"
SELECT column_name::text AS column_name, table_name::text AS table_name
FROM information_schema.columns
WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
  AND column_name ILIKE $1 ESCAPE '\'
ORDER BY table_name, ordinal_position
"#;

const SQLITE_FIND_COLS: &str = r#"
SELECT p.name AS column_name, m.name AS table_name
FROM sqlite_master AS m
JOIN pragma_table_info(m.name) AS p
WHERE m.type IN ('table', 'view')
  AND m.name NOT LIKE 'sqlite\_%' ESCAPE '\'
  AND p.name LIKE ? ESCAPE '\'
ORDER BY m.name, p.cid
"#;

const PG_FIND_TABLES: &str = r#"
SELECT table_name::text AS table_name, table_type::text AS table_type
FROM information_schema.tables
WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
  AND table_name ILIKE $1 ESCAPE '\'
ORDER BY table_name
"#;

const SQLITE_FIND_TABLES: &str = r#"
SELECT name AS table_name, type AS table_type
FROM sqlite_master
WHERE type IN ('table', 'view')
  AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
  AND name LIKE ? ESCAPE '\'
ORDER BY name
"#;

const PG_GET_COLS: &str = r#"
SELECT a.attname::text AS column_name, format_type(a.atttypid, a.atttypmod) AS data_type
FROM pg_attribute AS a
WHERE a.attrelid = $1::regclass
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY a.attnum
"#;

const SQLITE_GET_COLS: &str = r#"
SELECT name AS column_name, type AS data_type
FROM pragma_table_info(?, ?)
ORDER BY cid
"#;

const PG_GET_DEF: &str = r#"
SELECT pg_get_viewdef(c.oid, true) AS definition
FROM pg_class AS c
WHERE c.oid = to_regclass($1) AND c.relkind IN ('v', 'm')
UNION ALL
SELECT pg_get_functiondef(p.oid) AS definition
FROM pg_proc AS p
WHERE p.proname = $1 AND p.prokind IN ('f', 'p')
"#;

const SQLITE_GET_DEF: &str = r#"
SELECT sql AS definition FROM sqlite_master WHERE name = ? AND sql IS NOT NULL
UNION ALL
SELECT sql AS definition FROM sqlite_temp_master WHERE name = ? AND sql IS NOT NULL
"#;

const PG_SHOW_TEMP: &str = r#"
SELECT c.relname::text AS name
FROM pg_class AS c
WHERE c.relnamespace = pg_my_temp_schema() AND c.relkind = 'r'
ORDER BY c.relname
"#;

const SQLITE_SHOW_TEMP: &str = r#"
SELECT name FROM sqlite_temp_master WHERE type = 'table' ORDER BY name
"#;

/// Returns the first `n` rows of a table (default [`DEFAULT_HEAD_ROWS`]).
///
/// The table is not checked for existence; a missing table surfaces as the
/// driver's query error.
pub async fn head(executor: &QueryExecutor<'_>, table: &str, n: Option<u64>) -> Result<Frame> {
    let limit = i64::try_from(n.unwrap_or(DEFAULT_HEAD_ROWS)).unwrap_or(i64::MAX);
    let sql = format!(
        "SELECT * FROM {} LIMIT {}",
        quote_qualified(table)?,
        executor.backend().placeholder(1)
    );
    executor.run_query_with(&sql, &[Value::Int(limit)]).await
}

/// Finds columns whose name contains `substring`, ignoring case.
///
/// Returns `(column_name, table_name)` rows ordered by table, then column
/// position.
pub async fn find_cols(executor: &QueryExecutor<'_>, substring: &str) -> Result<Frame> {
    let sql = match executor.backend() {
        DatabaseBackend::Postgres => PG_FIND_COLS,
        DatabaseBackend::Sqlite => SQLITE_FIND_COLS,
    };
    executor
        .run_query_with(sql, &[Value::String(contains_pattern(substring))])
        .await
}

/// Finds tables and views whose name contains `substring`, ignoring case.
///
/// Returns `(table_name, table_type)` rows.
pub async fn find_tables(executor: &QueryExecutor<'_>, substring: &str) -> Result<Frame> {
    let sql = match executor.backend() {
        DatabaseBackend::Postgres => PG_FIND_TABLES,
        DatabaseBackend::Sqlite => SQLITE_FIND_TABLES,
    };
    executor
        .run_query_with(sql, &[Value::String(contains_pattern(substring))])
        .await
}

/// Lists the columns of one table as `(column_name, data_type)` rows.
///
/// On PostgreSQL the name is resolved through the search path (so temporary
/// tables are found) and a missing table is an error. SQLite returns an
/// empty frame for a missing table.
pub async fn get_cols(executor: &QueryExecutor<'_>, table: &str) -> Result<Frame> {
    if table.is_empty() {
        return Err(SqlToolsError::invalid_input("table name must not be empty"));
    }
    match executor.backend() {
        DatabaseBackend::Postgres => {
            executor
                .run_query_with(PG_GET_COLS, &[Value::from(table)])
                .await
        }
        DatabaseBackend::Sqlite => {
            let (schema, name) = match table.split_once('.') {
                Some((schema, name)) => (Value::from(schema), Value::from(name)),
                None => (Value::Null, Value::from(table)),
            };
            executor
                .run_query_with(SQLITE_GET_COLS, &[name, schema])
                .await
        }
    }
}

/// Returns the SQL definition of a view or routine (PostgreSQL) or of any
/// schema object (SQLite), if one exists.
pub async fn get_def(executor: &QueryExecutor<'_>, name: &str) -> Result<Option<String>> {
    let frame = match executor.backend() {
        DatabaseBackend::Postgres => {
            executor
                .run_query_with(PG_GET_DEF, &[Value::from(name)])
                .await?
        }
        DatabaseBackend::Sqlite => {
            executor
                .run_query_with(SQLITE_GET_DEF, &[Value::from(name), Value::from(name)])
                .await?
        }
    };
    Ok(frame
        .rows
        .first()
        .and_then(|row| row.first())
        .and_then(Value::as_str)
        .map(String::from))
}

/// Distinct values of one column, in ascending order.
pub async fn unique(executor: &QueryExecutor<'_>, table: &str, column: &str) -> Result<Frame> {
    let column = quote_ident(column)?;
    let sql = format!(
        "SELECT DISTINCT {column} FROM {} ORDER BY {column}",
        quote_qualified(table)?
    );
    executor.run_query(&sql).await
}

/// Lists the temporary tables visible to the current connection.
pub async fn show_temp(executor: &QueryExecutor<'_>) -> Result<Frame> {
    let sql = match executor.backend() {
        DatabaseBackend::Postgres => PG_SHOW_TEMP,
        DatabaseBackend::Sqlite => SQLITE_SHOW_TEMP,
    };
    executor.run_query(sql).await
}

/// Makes `schema` the default schema for the rest of the session.
pub async fn change_schema(executor: &QueryExecutor<'_>, schema: &str) -> Result<()> {
    match executor.backend() {
        DatabaseBackend::Postgres => {
            let sql = format!("SET search_path TO {}", quote_ident(schema)?);
            executor.run_command(&sql).await?;
            Ok(())
        }
        DatabaseBackend::Sqlite => Err(SqlToolsError::unsupported(
            "SQLite has no default schema to change",
        )),
    }
}

/// Renders values as a parenthesized SQL literal list, e.g. `(1, 'a', NULL)`.
///
/// An empty slice renders as `(NULL)` so `x IN (...)` stays valid and
/// matches nothing. Bytes render as `X'..'` blobs; use [`to_sql_list_for`]
/// to compare against a PostgreSQL `bytea` column.
pub fn to_sql_list(values: &[Value]) -> String {
    sql_list(values.iter().map(quote_literal))
}

/// Like [`to_sql_list`], with literals in `backend`'s dialect.
pub fn to_sql_list_for(backend: DatabaseBackend, values: &[Value]) -> String {
    sql_list(values.iter().map(|v| quote_literal_for(backend, v)))
}

fn sql_list(items: impl Iterator<Item = String>) -> String {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        return "(NULL)".to_string();
    }
    format!("({})", items.join(", "))
}
