//! CSV parsing into [`Table`]
//!
//! Line-based parser with RFC-4180 quoting. The first row is a mandatory
//! header; cell values are typed as integer, float, or string, with empty
//! fields and `nan` (CellProfiler's missing-value marker) read as null.

use super::Table;
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Parse CSV text into a table
///
/// `path` labels the source in error messages only.
pub fn parse_csv(path: &str, text: &str) -> Result<Table> {
    let mut lines = text.lines();

    let header_line = lines
        .next()
        .ok_or_else(|| Error::csv(path, "empty file, expected a header row"))?;

    let columns = parse_line(header_line);
    if columns.iter().any(String::is_empty) {
        return Err(Error::csv(path, "header contains an empty column name"));
    }
    for (i, name) in columns.iter().enumerate() {
        if columns[..i].contains(name) {
            return Err(Error::csv(path, format!("duplicate column '{name}'")));
        }
    }

    let mut rows = Vec::new();
    for (line_num, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let fields = parse_line(line);
        if fields.len() != columns.len() {
            return Err(Error::csv(
                path,
                format!(
                    "row {} has {} fields, expected {}",
                    line_num + 2,
                    fields.len(),
                    columns.len()
                ),
            ));
        }

        let mut row = Map::new();
        for (column, field) in columns.iter().zip(fields) {
            let value = parse_value(&field);
            if !value.is_null() {
                row.insert(column.clone(), value);
            }
        }
        rows.push(row);
    }

    Ok(Table::new(columns, rows))
}

/// Split one CSV line into fields, honoring double-quote escaping
fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                in_quotes = true;
            }
        } else if c == ',' && !in_quotes {
            fields.push(current.trim().to_string());
            current = String::new();
        } else {
            current.push(c);
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// Type a CSV field: integer, float, or string; empty and `nan` are null
fn parse_value(field: &str) -> Value {
    if field.is_empty() || field.eq_ignore_ascii_case("nan") {
        return Value::Null;
    }

    if let Ok(n) = field.parse::<i64>() {
        return Value::Number(n.into());
    }

    if let Ok(f) = field.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(f) {
            return Value::Number(num);
        }
        // Non-finite floats (inf) have no JSON form
        return Value::Null;
    }

    Value::String(field.to_string())
}
