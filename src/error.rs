//! Error types for platemerge
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! There is no retry or recovery layer: the first error raised during a
//! conversion propagates to the caller unchanged.

use thiserror::Error;

/// The main error type for platemerge
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid location '{location}': {message}")]
    InvalidLocation { location: String, message: String },

    // ============================================================================
    // Input / Join Errors
    // ============================================================================
    #[error("CSV parse error in '{path}': {message}")]
    CsvParse { path: String, message: String },

    #[error("Table '{table}' is missing join key column '{column}'")]
    MissingJoinKey { table: String, column: String },

    #[error("Object tables '{left}' and '{right}' derive the same prefix '{prefix}'")]
    DuplicatePrefix {
        prefix: String,
        left: String,
        right: String,
    },

    #[error("Column '{column}' appears on both sides of a join")]
    DuplicateColumn { column: String },

    #[error("Partition column '{column}' not found in merged table")]
    PartitionColumn { column: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a location error
    pub fn location(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a CSV parse error
    pub fn csv(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CsvParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a missing-join-key error
    pub fn missing_join_key(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingJoinKey {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }
}

/// Result type alias for platemerge
pub type Result<T> = std::result::Result<T, Error>;
