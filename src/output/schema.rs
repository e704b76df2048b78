//! Arrow schema inference for merged tables
//!
//! CSV cells only ever type as null, boolean, integer, float, or string, so
//! inference here is flat: no lists, no structs. Column order follows the
//! table, and every field is nullable because outer joins introduce nulls
//! on either side.

use crate::error::{Error, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, NullArray, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Infer an Arrow schema from rows, preserving the given column order
pub fn infer_schema(columns: &[String], rows: &[Map<String, Value>]) -> Schema {
    let fields: Vec<Field> = columns
        .iter()
        .map(|name| {
            let mut dtype = DataType::Null;
            for row in rows {
                if let Some(value) = row.get(name) {
                    dtype = merge_types(&dtype, &infer_type(value));
                }
            }
            Field::new(name, dtype, true)
        })
        .collect();

    Schema::new(fields)
}

/// Convert rows to an Arrow RecordBatch with the given schema
pub fn rows_to_batch(schema: &Arc<Schema>, rows: &[Map<String, Value>]) -> Result<RecordBatch> {
    if rows.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::clone(schema)));
    }

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let values: Vec<Option<&Value>> = rows.iter().map(|row| row.get(field.name())).collect();
        arrays.push(build_array(&values, field.data_type())?);
    }

    RecordBatch::try_new(Arc::clone(schema), arrays)
        .map_err(|e| Error::output(format!("failed to create RecordBatch: {e}")))
}

/// Infer Arrow DataType from a JSON scalar
fn infer_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        // Arrays and objects never come out of CSV parsing
        _ => DataType::Utf8,
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),

        // Null can merge with anything
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        // Numbers can merge (prefer Float64 for mixed)
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        // Different types -> fall back to String (most flexible)
        _ => DataType::Utf8,
    }
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            #[allow(clippy::cast_precision_loss)]
            let arr: Float64Array = values
                .iter()
                .map(|v| v.and_then(|v| v.as_f64().or_else(|| v.as_i64().map(|i| i as f64))))
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.and_then(|v| {
                        if v.is_null() {
                            None
                        } else {
                            Some(match v {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                        }
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        other => Err(Error::output(format!(
            "unsupported column type in merged table: {other}"
        ))),
    }
}
