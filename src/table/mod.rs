//! In-memory tables
//!
//! [`Table`] is the frame type behind the in-memory backend: an ordered
//! column list plus one JSON object per row. A key absent from a row's
//! object reads as null, which is how outer joins represent unmatched
//! sides without materializing filler values.

mod csv;

pub use csv::parse_csv;

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Directory name used for null values in partition paths
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// An in-memory table with explicit column order
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl Table {
    /// Create a table from a column list and rows
    pub fn new(columns: Vec<String>, rows: Vec<Map<String, Value>>) -> Self {
        Self { columns, rows }
    }

    /// Column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Check whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Rows as JSON objects
    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    /// Get a cell value; missing keys read as null
    pub fn value(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Value::Null)
    }

    /// Rename every column to `<prefix>_<original>`
    pub fn with_prefix(self, prefix: &str) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{prefix}_{c}"))
            .collect();

        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(k, v)| (format!("{prefix}_{k}"), v))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Stable ascending sort by one column; nulls sort last
    pub fn sort_by(mut self, column: &str) -> Self {
        self.rows
            .sort_by(|a, b| compare_values(a.get(column), b.get(column)));
        self
    }

    /// Full outer join with another table
    ///
    /// Every left row appears once per matching right row, or once with the
    /// right columns null when nothing matches. Unmatched right rows are
    /// appended afterwards with the left columns null. Null join keys never
    /// match anything.
    pub fn outer_join(self, right: Table, left_key: &str, right_key: &str) -> Result<Table> {
        for column in &right.columns {
            if self.has_column(column) {
                return Err(Error::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }

        // Index the right side by its join key
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            if let Some(key) = row.get(right_key).and_then(join_key) {
                index.entry(key).or_default().push(i);
            }
        }

        let mut columns = self.columns;
        columns.extend(right.columns.iter().cloned());

        let mut matched = vec![false; right.rows.len()];
        let mut rows = Vec::with_capacity(self.rows.len().max(right.rows.len()));

        for left_row in self.rows {
            let hits = left_row
                .get(left_key)
                .and_then(join_key)
                .and_then(|key| index.get(&key));

            match hits {
                Some(indices) => {
                    for &i in indices {
                        matched[i] = true;
                        let mut merged = left_row.clone();
                        merged.extend(right.rows[i].clone());
                        rows.push(merged);
                    }
                }
                None => rows.push(left_row),
            }
        }

        // Orphan right rows keep outer-join semantics
        for (i, row) in right.rows.into_iter().enumerate() {
            if !matched[i] {
                rows.push(row);
            }
        }

        Ok(Table { columns, rows })
    }

    /// Group rows by the distinct value combinations of the given columns
    ///
    /// Groups come back in first-appearance order; their union is exactly
    /// this table. Each group is keyed by the formatted partition values,
    /// parallel to `columns`.
    pub fn split_by(&self, columns: &[String]) -> Result<Vec<(Vec<String>, Table)>> {
        for column in columns {
            if !self.has_column(column) {
                return Err(Error::PartitionColumn {
                    column: column.clone(),
                });
            }
        }

        let mut groups: Vec<(Vec<String>, Table)> = Vec::new();
        let mut lookup: HashMap<Vec<String>, usize> = HashMap::new();

        for row in &self.rows {
            let key: Vec<String> = columns
                .iter()
                .map(|c| partition_value(row.get(c).unwrap_or(&Value::Null)))
                .collect();

            let idx = match lookup.get(&key) {
                Some(&idx) => idx,
                None => {
                    lookup.insert(key.clone(), groups.len());
                    groups.push((key, Table::new(self.columns.clone(), Vec::new())));
                    groups.len() - 1
                }
            };

            groups[idx].1.rows.push(row.clone());
        }

        Ok(groups)
    }
}

/// Canonical join-key form of a cell value
///
/// Integral floats collapse onto their integer form so that `3` and `3.0`
/// read from different files still match. Null never joins.
fn join_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < 9e15 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            } else {
                None
            }
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Format a cell value for use as a partition directory component
fn partition_value(value: &Value) -> String {
    let raw = match value {
        Value::Null => return HIVE_DEFAULT_PARTITION.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    // Keep directory components path-safe
    raw.replace(['/', '\\'], "_")
}

/// Ordering for `sort_by`: numbers, then strings, then booleans, nulls last
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            Some(Value::Number(_)) => 0,
            Some(Value::String(_)) => 1,
            Some(Value::Bool(_)) => 2,
            _ => 3,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
