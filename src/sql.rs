//! SQL text building blocks.
//!
//! Values travel as bind parameters. Names cannot be bound, so they are
//! quoted here: each identifier is wrapped in double quotes with embedded
//! double quotes doubled, and dotted names are quoted part by part. Both
//! PostgreSQL and SQLite accept this form.

use crate::db::{DatabaseBackend, Value};
use crate::error::{Result, SqlToolsError};

/// Escape character used in generated `LIKE` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// Quotes a single identifier.
pub fn quote_ident(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(SqlToolsError::invalid_input("identifier must not be empty"));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quotes a possibly schema-qualified name such as `sales.customers`.
pub fn quote_qualified(name: &str) -> Result<String> {
    let parts = name
        .split('.')
        .map(quote_ident)
        .collect::<Result<Vec<_>>>()
        .map_err(|_| SqlToolsError::invalid_input(format!("invalid object name '{name}'")))?;
    Ok(parts.join("."))
}

/// Builds a `LIKE` pattern matching `term` anywhere, with wildcards in the
/// term escaped so they match literally.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Renders a value as a SQL literal for `backend`.
///
/// PostgreSQL reads `X'..'` as a bit string, so bytes become a `bytea` cast
/// there.
pub fn quote_literal_for(backend: DatabaseBackend, value: &Value) -> String {
    match (backend, value) {
        (DatabaseBackend::Postgres, Value::Bytes(b)) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02x}")).collect();
            format!("'\\x{hex}'::bytea")
        }
        _ => quote_literal(value),
    }
}

/// Renders a value as a SQL literal. Bytes use the `X'..'` blob form.
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => f.to_string(),
        Value::Float(f) => format!("'{f}'"),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Bytes(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}
