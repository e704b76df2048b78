//! Output module
//!
//! Handles Arrow RecordBatch creation and in-memory Parquet encoding.

mod schema;
mod writer;

pub use schema::{infer_schema, rows_to_batch};
pub use writer::{encode_batch, ParquetWriterConfig};
