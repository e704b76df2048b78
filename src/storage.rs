//! Storage locations (local filesystem, S3, R2, GCS, Azure)
//!
//! A [`Location`] wraps an `object_store` backend resolved from a URL-style
//! string. Scheme handling is the only logic here; everything else (auth,
//! multipart uploads, retries) belongs to `object_store`.

use crate::error::{Error, Result};
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::fmt;
use std::sync::Arc;

/// A resolved storage location
///
/// Supported formats:
/// - `s3://bucket/path/` - AWS S3
/// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
/// - `gs://bucket/path/` - Google Cloud Storage
/// - `az://container/path/` - Azure Blob Storage
/// - `file:///path/` or a bare path - local filesystem
#[derive(Debug, Clone)]
pub struct Location {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
    /// Original location string
    raw: String,
}

impl Location {
    /// Parse a location string; the location must already exist when local.
    ///
    /// Cloud credentials are taken from the environment by the respective
    /// `object_store` builders.
    pub fn parse(url: &str) -> Result<Self> {
        Self::parse_inner(url, false)
    }

    /// Parse a location string, creating the directory when local.
    ///
    /// Use this for destinations; `parse` for sources.
    pub fn parse_or_create(url: &str) -> Result<Self> {
        Self::parse_inner(url, true)
    }

    fn parse_inner(url: &str, create: bool) -> Result<Self> {
        if url.starts_with("s3://") {
            Self::parse_s3(url, false)
        } else if url.starts_with("r2://") {
            Self::parse_s3(url, true)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else {
            Self::parse_local(url, create)
        }
    }

    /// Parse S3 or R2 URL
    fn parse_s3(url: &str, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let without_scheme = url
            .strip_prefix(&format!("{scheme}://"))
            .ok_or_else(|| Error::location(url, format!("invalid {scheme} URL")))?;

        let (bucket, prefix) = split_bucket(without_scheme);

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // R2 endpoint comes from R2_ENDPOINT_URL; AWS_ENDPOINT is already
        // picked up by from_env()
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::location(url, format!("failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: scheme.to_string(),
            raw: url.to_string(),
        })
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("gs://")
            .ok_or_else(|| Error::location(url, "invalid GCS URL"))?;

        let (bucket, prefix) = split_bucket(without_scheme);

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::location(url, format!("failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "gs".to_string(),
            raw: url.to_string(),
        })
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("az://")
            .ok_or_else(|| Error::location(url, "invalid Azure URL"))?;

        let (container, prefix) = split_bucket(without_scheme);

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::location(url, format!("failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "az".to_string(),
            raw: url.to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(path: &str, create: bool) -> Result<Self> {
        let raw = path;
        let path = path.strip_prefix("file://").unwrap_or(path);

        if create {
            std::fs::create_dir_all(path)
                .map_err(|e| Error::location(raw, format!("failed to create directory: {e}")))?;
        }

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::location(raw, format!("failed to open local path: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
            raw: raw.to_string(),
        })
    }

    /// Check if this is a cloud location (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    fn object_path(&self, rel_path: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(rel_path)
        } else {
            ObjectPath::from(format!(
                "{}/{rel_path}",
                self.prefix.trim_end_matches('/')
            ))
        }
    }

    /// Read an entire object relative to this location
    pub async fn get(&self, rel_path: &str) -> Result<Bytes> {
        let path = self.object_path(rel_path);
        let result = self.store.get(&path).await?;
        Ok(result.bytes().await?)
    }

    /// Write an object relative to this location, returning the full path
    /// for logging
    pub async fn put(&self, rel_path: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(rel_path);

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::output(format!("failed to write {path}: {e}")))?;

        Ok(format!("{}://{path}", self.scheme))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split `bucket/key/prefix` into bucket and prefix
fn split_bucket(without_scheme: &str) -> (&str, String) {
    match without_scheme.find('/') {
        Some(idx) => (
            &without_scheme[..idx],
            without_scheme[idx + 1..].to_string(),
        ),
        None => (without_scheme, String::new()),
    }
}
