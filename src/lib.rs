// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # platemerge
//!
//! Merge per-plate CellProfiler CSV exports into partitioned Parquet.
//!
//! One image table plus any number of object tables (cells, cytoplasm,
//! nuclei, ...) go in; one wide, outer-joined table comes out, written as
//! Hive-partitioned Parquet to a local directory or cloud object store.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use platemerge::{to_parquet, MergeOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let options = MergeOptions::new("/data/plate1", "s3://lab-data/plate1");
//!     let summary = to_parquet(&options).await?;
//!     println!("wrote {} rows across {} files", summary.rows, summary.files);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! source/Image.csv ──────────────► image table (sorted by ImageNumber)
//! source/Cells.csv ──► prefix ──┐
//! source/Cytoplasm.csv ► prefix ┼──► outer joins, in order
//! source/Nuclei.csv ──► prefix ─┘           │
//!                                           ▼
//! destination/Metadata_Well=A01/part-00000.parquet
//! destination/Metadata_Well=B02/part-00000.parquet
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Storage locations (local, S3, R2, GCS, Azure)
pub mod storage;

/// In-memory tables and CSV parsing
pub mod table;

/// Arrow/Parquet output
pub mod output;

/// Swappable table backend
pub mod backend;

/// Merge-and-export pipeline
pub mod transport;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use backend::{InMemoryBackend, TableBackend, WriteSummary};
pub use error::{Error, Result};
pub use output::ParquetWriterConfig;
pub use storage::Location;
pub use table::Table;
pub use transport::{to_parquet, to_parquet_with, MergeOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
