//! Command-line interface

use crate::error::Result;
use crate::output::ParquetWriterConfig;
use crate::transport::MergeOptions;
use clap::Parser;

/// Merge per-plate CellProfiler CSV exports into partitioned Parquet
#[derive(Parser, Debug)]
#[command(name = "platemerge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source directory for data; prepend a scheme (s3://, r2://, gs://,
    /// az://) for remote data
    pub source: String,

    /// Destination directory for the partitioned Parquet output; same
    /// location grammar as SOURCE
    pub destination: String,

    /// CSV with the run details behind the inputs; recorded as provenance
    /// metadata, not read
    #[arg(long)]
    pub experiment: Option<String>,

    /// Image table path, relative to SOURCE
    #[arg(long, default_value = "Image.csv")]
    pub image: String,

    /// Object table path, relative to SOURCE; repeat per table
    /// (defaults to Cells.csv, Cytoplasm.csv, Nuclei.csv)
    #[arg(long = "object", value_name = "PATH")]
    pub objects: Vec<String>,

    /// Columns to partition the output by (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "Metadata_Well")]
    pub partition_on: Vec<String>,

    /// Write a single unpartitioned file
    #[arg(long)]
    pub no_partition: bool,

    /// Parquet compression codec (snappy, zstd, gzip, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// Maximum rows per Parquet row group
    #[arg(long)]
    pub row_group_size: Option<usize>,

    /// Disable dictionary encoding
    #[arg(long)]
    pub no_dictionary: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Turn parsed arguments into merge options
    pub fn into_options(self) -> Result<MergeOptions> {
        let mut writer = ParquetWriterConfig::new().with_compression_name(&self.compression)?;
        if let Some(size) = self.row_group_size {
            writer = writer.with_row_group_size(size);
        }
        if self.no_dictionary {
            writer = writer.with_dictionary(false);
        }

        let mut options = MergeOptions::new(self.source, self.destination)
            .with_image(self.image)
            .with_writer(writer);

        if let Some(experiment) = self.experiment {
            options = options.with_experiment(experiment);
        }
        if !self.objects.is_empty() {
            options = options.with_objects(self.objects);
        }
        options = if self.no_partition {
            options.with_partition_on(Vec::<String>::new())
        } else {
            options.with_partition_on(self.partition_on)
        };

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_cli_defaults() {
        let cli = parse(&["platemerge", "/in", "/out"]);
        let options = cli.into_options().unwrap();

        assert_eq!(options.source, "/in");
        assert_eq!(options.destination, "/out");
        assert_eq!(options.objects, ["Cells.csv", "Cytoplasm.csv", "Nuclei.csv"]);
        assert_eq!(options.partition_on, ["Metadata_Well"]);
    }

    #[test]
    fn test_cli_custom_objects() {
        let cli = parse(&[
            "platemerge",
            "/in",
            "/out",
            "--object",
            "Cells.csv",
            "--object",
            "Spots.csv",
        ]);
        let options = cli.into_options().unwrap();
        assert_eq!(options.objects, ["Cells.csv", "Spots.csv"]);
    }

    #[test]
    fn test_cli_partition_on_list() {
        let cli = parse(&[
            "platemerge",
            "/in",
            "/out",
            "--partition-on",
            "Metadata_Plate,Metadata_Well",
        ]);
        let options = cli.into_options().unwrap();
        assert_eq!(options.partition_on, ["Metadata_Plate", "Metadata_Well"]);
    }

    #[test]
    fn test_cli_no_partition() {
        let cli = parse(&["platemerge", "/in", "/out", "--no-partition"]);
        let options = cli.into_options().unwrap();
        assert!(options.partition_on.is_empty());
    }

    #[test]
    fn test_cli_bad_compression() {
        let cli = parse(&["platemerge", "/in", "/out", "--compression", "lz77"]);
        assert!(cli.into_options().is_err());
    }
}
