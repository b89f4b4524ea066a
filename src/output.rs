//! Frame rendering.
//!
//! Turns a [`Frame`] into an aligned text table, CSV, or JSON records for
//! the command-line front end or for callers that want a quick printout.

use std::fmt;

use crate::db::Frame;
use crate::error::{Result, SqlToolsError};

/// Output format for rendered frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain-text table with a row count footer.
    #[default]
    Table,
    /// Comma-separated values with a header row.
    Csv,
    /// JSON array of objects keyed by column name.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: table, csv, or json"
            )),
        }
    }
}

/// Renders a frame in the given format.
pub fn render(frame: &Frame, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(frame)),
        OutputFormat::Csv => to_csv(frame),
        OutputFormat::Json => to_json(frame),
    }
}

/// Renders the frame as an aligned text table.
pub fn render_table(frame: &Frame) -> String {
    let headers = frame.column_names();
    let cells: Vec<Vec<String>> = frame
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    if !headers.is_empty() {
        out.push_str(&format_line(headers.iter().copied(), &widths));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format_line(rule.iter().map(String::as_str), &widths));
        for row in &cells {
            out.push_str(&format_line(row.iter().map(String::as_str), &widths));
        }
    }

    let count = frame.height();
    out.push_str(&format!(
        "({count} {})\n",
        if count == 1 { "row" } else { "rows" }
    ));
    out
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    format!("{}\n", padded.join(" | ").trim_end())
}

/// Renders the frame as CSV. NULL becomes an empty field.
pub fn to_csv(frame: &Frame) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(frame.column_names())
        .map_err(|e| SqlToolsError::output(e.to_string()))?;

    for row in &frame.rows {
        let values: Vec<String> = row
            .iter()
            .map(|v| if v.is_null() { String::new() } else { v.to_display_string() })
            .collect();
        wtr.write_record(&values)
            .map_err(|e| SqlToolsError::output(e.to_string()))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| SqlToolsError::output(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SqlToolsError::output(e.to_string()))
}

/// Renders the frame as a JSON array of row objects.
pub fn to_json(frame: &Frame) -> Result<String> {
    let records: Vec<serde_json::Value> = frame
        .rows
        .iter()
        .map(|row| {
            let obj: serde_json::Map<String, serde_json::Value> = frame
                .columns
                .iter()
                .zip(row)
                .map(|(col, value)| (col.name.clone(), value.to_json()))
                .collect();
            serde_json::Value::Object(obj)
        })
        .collect();
    serde_json::to_string_pretty(&records).map_err(|e| SqlToolsError::output(e.to_string()))
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_table(self))
    }
}
