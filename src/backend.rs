//! Swappable table backend
//!
//! The merge pipeline only ever needs a handful of frame operations, so
//! they are factored behind [`TableBackend`]. [`InMemoryBackend`] is the
//! shipped implementation; a distributed or lazy engine can implement the
//! same trait without the pipeline changing. Either way the contract is
//! blocking: `write_parquet` returns only after every partition is
//! materialized or an error propagates.

use crate::error::Result;
use crate::output::{encode_batch, infer_schema, rows_to_batch, ParquetWriterConfig};
use crate::storage::Location;
use crate::table::{parse_csv, Table};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Outcome of a partitioned write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Total rows written across all files
    pub rows: usize,
    /// Number of data files produced
    pub files: usize,
}

/// Frame operations the merge pipeline is built on
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// The backend's tabular value
    type Frame: Send;

    /// Load a CSV table from `path` under `source`
    async fn read_csv(&self, source: &Location, path: &str) -> Result<Self::Frame>;

    /// Check whether a frame has a column
    fn has_column(&self, frame: &Self::Frame, column: &str) -> bool;

    /// Rename every column to `<prefix>_<original>`
    fn prefix_columns(&self, frame: Self::Frame, prefix: &str) -> Self::Frame;

    /// Designate a sort/index column; the returned frame is ordered by it
    fn sort_by(&self, frame: Self::Frame, column: &str) -> Self::Frame;

    /// Full outer join of two frames on the given key columns
    fn outer_join(
        &self,
        left: Self::Frame,
        right: Self::Frame,
        left_key: &str,
        right_key: &str,
    ) -> Result<Self::Frame>;

    /// Write a frame to `destination` as Hive-partitioned Parquet
    ///
    /// `metadata` is embedded in each file's schema metadata. An empty
    /// `partition_on` writes a single file at the destination root.
    async fn write_parquet(
        &self,
        frame: Self::Frame,
        destination: &Location,
        partition_on: &[String],
        config: &ParquetWriterConfig,
        metadata: HashMap<String, String>,
    ) -> Result<WriteSummary>;
}

/// In-memory backend over [`Table`]
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryBackend;

impl InMemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TableBackend for InMemoryBackend {
    type Frame = Table;

    async fn read_csv(&self, source: &Location, path: &str) -> Result<Table> {
        let data = source.get(path).await?;
        let text = std::str::from_utf8(&data)
            .map_err(|e| crate::error::Error::csv(path, format!("not valid UTF-8: {e}")))?;
        parse_csv(path, text)
    }

    fn has_column(&self, frame: &Table, column: &str) -> bool {
        frame.has_column(column)
    }

    fn prefix_columns(&self, frame: Table, prefix: &str) -> Table {
        frame.with_prefix(prefix)
    }

    fn sort_by(&self, frame: Table, column: &str) -> Table {
        frame.sort_by(column)
    }

    fn outer_join(
        &self,
        left: Table,
        right: Table,
        left_key: &str,
        right_key: &str,
    ) -> Result<Table> {
        left.outer_join(right, left_key, right_key)
    }

    async fn write_parquet(
        &self,
        frame: Table,
        destination: &Location,
        partition_on: &[String],
        config: &ParquetWriterConfig,
        metadata: HashMap<String, String>,
    ) -> Result<WriteSummary> {
        // One schema for the whole table so every partition file agrees
        let schema = Arc::new(infer_schema(frame.columns(), frame.rows()).with_metadata(metadata));

        let rows = frame.num_rows();
        let mut files = 0;

        if partition_on.is_empty() {
            let batch = rows_to_batch(&schema, frame.rows())?;
            let data = encode_batch(&batch, config)?;
            let written = destination.put("part-00000.parquet", data).await?;
            debug!(path = %written, rows, "wrote data file");
            return Ok(WriteSummary { rows, files: 1 });
        }

        for (key, group) in frame.split_by(partition_on)? {
            let dir: Vec<String> = partition_on
                .iter()
                .zip(&key)
                .map(|(column, value)| format!("{column}={value}"))
                .collect();
            let path = format!("{}/part-00000.parquet", dir.join("/"));

            let batch = rows_to_batch(&schema, group.rows())?;
            let data = encode_batch(&batch, config)?;
            let written = destination.put(&path, data).await?;
            debug!(path = %written, rows = group.num_rows(), "wrote partition file");
            files += 1;
        }

        Ok(WriteSummary { rows, files })
    }
}
