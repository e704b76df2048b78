//! Merge-and-export pipeline
//!
//! The one operation this crate exists for: load an image table and a set
//! of object tables from a source location, prefix each object table's
//! columns with its table name, outer-join everything onto the image table
//! on the `<prefix>_ImageNumber` convention, and write the merged result
//! as partitioned Parquet at a destination location.

use crate::backend::{InMemoryBackend, TableBackend, WriteSummary};
use crate::error::{Error, Result};
use crate::output::ParquetWriterConfig;
use crate::storage::Location;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Join key every input table must carry before prefixing
pub const JOIN_KEY: &str = "ImageNumber";

/// Conventional image table filename
pub const DEFAULT_IMAGE: &str = "Image.csv";

/// Conventional object table filenames
pub const DEFAULT_OBJECTS: [&str; 3] = ["Cells.csv", "Cytoplasm.csv", "Nuclei.csv"];

/// Conventional partition column
pub const DEFAULT_PARTITION_ON: [&str; 1] = ["Metadata_Well"];

/// Parameters for one merge-and-export run
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Source directory for data; prepend a scheme (s3://, gs://, az://)
    /// for remote data
    pub source: String,

    /// Destination directory for the partitioned output; same location
    /// grammar as `source`
    pub destination: String,

    /// CSV describing the run that produced the inputs. Recorded in the
    /// output's provenance metadata; never read as a table.
    pub experiment: Option<String>,

    /// Image table path, relative to `source`
    pub image: String,

    /// Object table paths, relative to `source`, joined in this order
    pub objects: Vec<String>,

    /// Columns to partition the output by; empty disables partitioning
    pub partition_on: Vec<String>,

    /// Parquet writer knobs forwarded to the encoder
    pub writer: ParquetWriterConfig,
}

impl MergeOptions {
    /// Create options with the conventional defaults
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            experiment: None,
            image: DEFAULT_IMAGE.to_string(),
            objects: DEFAULT_OBJECTS.iter().map(ToString::to_string).collect(),
            partition_on: DEFAULT_PARTITION_ON
                .iter()
                .map(ToString::to_string)
                .collect(),
            writer: ParquetWriterConfig::default(),
        }
    }

    /// Set the experiment metadata path
    #[must_use]
    pub fn with_experiment(mut self, experiment: impl Into<String>) -> Self {
        self.experiment = Some(experiment.into());
        self
    }

    /// Set the image table path
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set the object table paths
    #[must_use]
    pub fn with_objects<I, S>(mut self, objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects = objects.into_iter().map(Into::into).collect();
        self
    }

    /// Set the partition columns; an empty list disables partitioning
    #[must_use]
    pub fn with_partition_on<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_on = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the Parquet writer configuration
    #[must_use]
    pub fn with_writer(mut self, writer: ParquetWriterConfig) -> Self {
        self.writer = writer;
        self
    }
}

/// Run the merge with the in-memory backend
pub async fn to_parquet(options: &MergeOptions) -> Result<WriteSummary> {
    to_parquet_with(&InMemoryBackend::new(), options).await
}

/// Run the merge with an explicit backend
pub async fn to_parquet_with<B: TableBackend>(
    backend: &B,
    options: &MergeOptions,
) -> Result<WriteSummary> {
    let source = Location::parse(&options.source)?;
    let destination = Location::parse_or_create(&options.destination)?;

    let prefixes = derive_prefixes(&options.objects)?;

    info!(source = %source, image = %options.image, "loading image table");
    let image = backend.read_csv(&source, &options.image).await?;
    if !backend.has_column(&image, JOIN_KEY) {
        return Err(Error::missing_join_key(&options.image, JOIN_KEY));
    }
    // The image table is keyed by ImageNumber; keep it ordered by that key
    // through the joins
    let mut merged = backend.sort_by(image, JOIN_KEY);

    for (entry, prefix) in options.objects.iter().zip(&prefixes) {
        debug!(object = %entry, prefix = %prefix, "joining object table");

        let object = backend.read_csv(&source, entry).await?;
        if !backend.has_column(&object, JOIN_KEY) {
            return Err(Error::missing_join_key(entry, JOIN_KEY));
        }

        let object = backend.prefix_columns(object, prefix);
        let right_key = format!("{prefix}_{JOIN_KEY}");
        merged = backend.outer_join(merged, object, JOIN_KEY, &right_key)?;
    }

    for column in &options.partition_on {
        if !backend.has_column(&merged, column) {
            return Err(Error::PartitionColumn {
                column: column.clone(),
            });
        }
    }

    let summary = backend
        .write_parquet(
            merged,
            &destination,
            &options.partition_on,
            &options.writer,
            provenance(options),
        )
        .await?;

    info!(
        rows = summary.rows,
        files = summary.files,
        destination = %destination,
        "wrote merged table"
    );

    Ok(summary)
}

/// Derive column prefixes from object table paths
///
/// The prefix is the path's base name without its extension. Two paths
/// collapsing onto the same prefix would silently collide in the merged
/// schema, so that is a named error here.
fn derive_prefixes(objects: &[String]) -> Result<Vec<String>> {
    let mut prefixes = Vec::with_capacity(objects.len());

    for entry in objects {
        let prefix = Path::new(entry)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::config(format!("cannot derive a column prefix from '{entry}'"))
            })?;

        if let Some(pos) = prefixes.iter().position(|p| p == prefix) {
            return Err(Error::DuplicatePrefix {
                prefix: prefix.to_string(),
                left: objects[pos].clone(),
                right: entry.clone(),
            });
        }

        prefixes.push(prefix.to_string());
    }

    Ok(prefixes)
}

/// Provenance metadata embedded in every written file
fn provenance(options: &MergeOptions) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("platemerge:version".to_string(), crate::VERSION.to_string());
    metadata.insert("platemerge:source".to_string(), options.source.clone());
    metadata.insert(
        "platemerge:created_at".to_string(),
        Utc::now().to_rfc3339(),
    );
    if let Some(experiment) = &options.experiment {
        metadata.insert("platemerge:experiment".to_string(), experiment.clone());
    }
    metadata
}
