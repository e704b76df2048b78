//! End-to-end conversion tests
//!
//! Full pipeline against temp directories: CSV inputs → merge-and-export →
//! partitioned Parquet read back with the arrow reader.

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use platemerge::{to_parquet, Error, MergeOptions, ParquetWriterConfig};
use std::fs::File;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn write_csv(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

/// Read one Parquet file back: (column names, row count)
fn read_parquet(path: &Path) -> (Vec<String>, usize) {
    let file = File::open(path).unwrap();
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let reader = builder.build().unwrap();
    let rows = reader.map(|b| b.unwrap().num_rows()).sum();
    (columns, rows)
}

fn fixture() -> (TempDir, TempDir) {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    write_csv(
        source.path(),
        "Image.csv",
        "ImageNumber,Metadata_Well\n1,A01\n2,A01\n",
    );
    write_csv(
        source.path(),
        "Cells.csv",
        "ImageNumber,Area\n1,10\n1,12\n2,5\n",
    );

    (source, dest)
}

fn options(source: &TempDir, dest: &TempDir) -> MergeOptions {
    MergeOptions::new(
        source.path().to_str().unwrap(),
        dest.path().to_str().unwrap(),
    )
}

// ============================================================================
// Merge Scenarios
// ============================================================================

#[tokio::test]
async fn test_image_and_cells_partitioned_by_well() {
    let (source, dest) = fixture();

    let opts = options(&source, &dest).with_objects(["Cells.csv"]);
    let summary = to_parquet(&opts).await.unwrap();

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.files, 1);

    let file = dest.path().join("Metadata_Well=A01/part-00000.parquet");
    let (columns, rows) = read_parquet(&file);

    assert_eq!(rows, 3);
    assert_eq!(
        columns,
        [
            "ImageNumber",
            "Metadata_Well",
            "Cells_ImageNumber",
            "Cells_Area"
        ]
    );
}

#[tokio::test]
async fn test_multiple_object_tables() {
    let (source, dest) = fixture();
    write_csv(
        source.path(),
        "Nuclei.csv",
        "ImageNumber,Area\n1,4\n2,6\n",
    );

    let opts = options(&source, &dest).with_objects(["Cells.csv", "Nuclei.csv"]);
    let summary = to_parquet(&opts).await.unwrap();

    // 3 cell rows, each image's nuclei row fanned out across its cells
    assert_eq!(summary.rows, 3);

    let file = dest.path().join("Metadata_Well=A01/part-00000.parquet");
    let (columns, _) = read_parquet(&file);
    assert!(columns.contains(&"Cells_Area".to_string()));
    assert!(columns.contains(&"Nuclei_Area".to_string()));
    assert!(columns.contains(&"Nuclei_ImageNumber".to_string()));
}

#[tokio::test]
async fn test_multiple_partitions() {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    write_csv(
        source.path(),
        "Image.csv",
        "ImageNumber,Metadata_Well\n1,A01\n2,B02\n",
    );
    write_csv(source.path(), "Cells.csv", "ImageNumber,Area\n1,10\n2,5\n");

    let opts = options(&source, &dest).with_objects(["Cells.csv"]);
    let summary = to_parquet(&opts).await.unwrap();

    assert_eq!(summary.files, 2);

    let (_, a01_rows) = read_parquet(&dest.path().join("Metadata_Well=A01/part-00000.parquet"));
    let (_, b02_rows) = read_parquet(&dest.path().join("Metadata_Well=B02/part-00000.parquet"));

    // No loss or duplication across partitions
    assert_eq!(a01_rows + b02_rows, summary.rows);
}

#[tokio::test]
async fn test_empty_objects_writes_image_table() {
    let (source, dest) = fixture();

    let opts = options(&source, &dest).with_objects(Vec::<String>::new());
    let summary = to_parquet(&opts).await.unwrap();

    assert_eq!(summary.rows, 2);

    let file = dest.path().join("Metadata_Well=A01/part-00000.parquet");
    let (columns, rows) = read_parquet(&file);
    assert_eq!(columns, ["ImageNumber", "Metadata_Well"]);
    assert_eq!(rows, 2);
}

#[tokio::test]
async fn test_no_partition_single_file() {
    let (source, dest) = fixture();

    let opts = options(&source, &dest)
        .with_objects(["Cells.csv"])
        .with_partition_on(Vec::<String>::new());
    let summary = to_parquet(&opts).await.unwrap();

    assert_eq!(summary.files, 1);
    let (_, rows) = read_parquet(&dest.path().join("part-00000.parquet"));
    assert_eq!(rows, 3);
}

#[tokio::test]
async fn test_never_matching_object_table_is_not_an_error() {
    let (source, dest) = fixture();
    write_csv(source.path(), "Spots.csv", "ImageNumber,Count\n99,7\n");

    let opts = options(&source, &dest).with_objects(["Spots.csv"]);
    let summary = to_parquet(&opts).await.unwrap();

    // 2 image rows with null spots + 1 orphan spot row
    assert_eq!(summary.rows, 3);

    // The orphan row has no Metadata_Well; it lands in the null partition
    let null_part = dest
        .path()
        .join("Metadata_Well=__HIVE_DEFAULT_PARTITION__/part-00000.parquet");
    let (_, rows) = read_parquet(&null_part);
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_rerun_is_deterministic() {
    let (source, dest) = fixture();
    let opts = options(&source, &dest).with_objects(["Cells.csv"]);

    let first = to_parquet(&opts).await.unwrap();
    let second = to_parquet(&opts).await.unwrap();

    assert_eq!(first, second);
    let (columns, rows) =
        read_parquet(&dest.path().join("Metadata_Well=A01/part-00000.parquet"));
    assert_eq!(rows, 3);
    assert_eq!(columns.len(), 4);
}

// ============================================================================
// Validation Errors
// ============================================================================

#[tokio::test]
async fn test_missing_source_file() {
    let (source, dest) = fixture();

    let opts = options(&source, &dest).with_objects(["Nuclei.csv"]);
    let result = to_parquet(&opts).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_object_table_missing_join_key() {
    let (source, dest) = fixture();
    write_csv(source.path(), "Bad.csv", "ObjectNumber,Area\n1,10\n");

    let opts = options(&source, &dest).with_objects(["Bad.csv"]);
    let err = to_parquet(&opts).await.unwrap_err();

    match err {
        Error::MissingJoinKey { table, column } => {
            assert_eq!(table, "Bad.csv");
            assert_eq!(column, "ImageNumber");
        }
        other => panic!("expected MissingJoinKey, got {other}"),
    }
}

#[tokio::test]
async fn test_image_table_missing_join_key() {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_csv(source.path(), "Image.csv", "Frame,Metadata_Well\n1,A01\n");

    let opts = options(&source, &dest).with_objects(Vec::<String>::new());
    let err = to_parquet(&opts).await.unwrap_err();
    assert!(matches!(err, Error::MissingJoinKey { .. }));
}

#[tokio::test]
async fn test_duplicate_prefix_rejected() {
    let (source, dest) = fixture();
    std::fs::create_dir(source.path().join("sub")).unwrap();
    write_csv(source.path(), "sub/Cells.csv", "ImageNumber,Area\n1,1\n");

    let opts = options(&source, &dest).with_objects(["Cells.csv", "sub/Cells.csv"]);
    let err = to_parquet(&opts).await.unwrap_err();
    assert!(matches!(err, Error::DuplicatePrefix { .. }));
}

#[tokio::test]
async fn test_unknown_partition_column() {
    let (source, dest) = fixture();

    let opts = options(&source, &dest)
        .with_objects(["Cells.csv"])
        .with_partition_on(["Metadata_Plate"]);
    let err = to_parquet(&opts).await.unwrap_err();

    match err {
        Error::PartitionColumn { column } => assert_eq!(column, "Metadata_Plate"),
        other => panic!("expected PartitionColumn, got {other}"),
    }
}

// ============================================================================
// Provenance & Writer Options
// ============================================================================

#[tokio::test]
async fn test_experiment_recorded_as_provenance() {
    let (source, dest) = fixture();

    let opts = options(&source, &dest)
        .with_objects(["Cells.csv"])
        .with_experiment("Experiment.csv");
    to_parquet(&opts).await.unwrap();

    let file = File::open(dest.path().join("Metadata_Well=A01/part-00000.parquet")).unwrap();
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
    let metadata = builder.schema().metadata();

    assert_eq!(
        metadata.get("platemerge:experiment"),
        Some(&"Experiment.csv".to_string())
    );
    assert!(metadata.contains_key("platemerge:source"));
    assert!(metadata.contains_key("platemerge:created_at"));
}

#[tokio::test]
async fn test_custom_writer_config() {
    let (source, dest) = fixture();

    let writer = ParquetWriterConfig::new()
        .with_compression_name("zstd")
        .unwrap()
        .with_row_group_size(2);
    let opts = options(&source, &dest)
        .with_objects(["Cells.csv"])
        .with_writer(writer);

    let summary = to_parquet(&opts).await.unwrap();
    assert_eq!(summary.rows, 3);

    let (_, rows) = read_parquet(&dest.path().join("Metadata_Well=A01/part-00000.parquet"));
    assert_eq!(rows, 3);
}
