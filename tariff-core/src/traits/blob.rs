//! The pluggable content-addressed object store (spec.md §4.2, C3).
//! Two implementations ship in `tariff-evidence`: local filesystem and an
//! S3-compatible adapter, selected by `AppConfig::effective_storage_backend`.

use crate::errors::StorageError;

pub trait BlobBackend: Send + Sync {
    /// Stores `bytes` under a content-addressed key derived from
    /// `(source, external_id, sha256)` and returns the resulting URI
    /// (`{scheme}://{key}`, spec.md §6).
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError>;

    fn get(&self, uri: &str) -> Result<Vec<u8>, StorageError>;

    fn delete(&self, uri: &str) -> Result<bool, StorageError>;

    fn exists(&self, uri: &str) -> Result<bool, StorageError>;
}
