//! Blob Storage Backend (spec.md §4.2, C3): a pluggable content-addressed
//! object store. Two implementations ship here, both behind
//! `tariff_core::traits::blob::BlobBackend`; selection is by
//! configuration (`AppConfig::effective_storage_backend`), and the
//! backend is a process-wide singleton constructed once at startup.

use std::fs;
use std::path::{Path, PathBuf};

use tariff_core::errors::StorageError;
use tariff_core::traits::blob::BlobBackend;

/// Writes blobs under a configured base directory. Keys are
/// content-addressed (`{source}/{external_id}/{sha256[:16]}{.ext}`,
/// spec.md §6) and map directly onto a relative filesystem path; `get`
/// strips the `file://` scheme, `delete` removes empty parent
/// directories left behind.
pub struct LocalBlobBackend {
    base_path: PathBuf,
}

impl LocalBlobBackend {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    fn key_from_uri(uri: &str) -> &str {
        uri.strip_prefix("file://").unwrap_or(uri)
    }
}

impl BlobBackend for LocalBlobBackend {
    fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String, StorageError> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        }
        fs::write(&path, bytes).map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        Ok(format!("file://{key}"))
    }

    fn get(&self, uri: &str) -> Result<Vec<u8>, StorageError> {
        let key = Self::key_from_uri(uri);
        fs::read(self.resolve(key)).map_err(|_| StorageError::NotFound { what: uri.to_string() })
    }

    fn delete(&self, uri: &str) -> Result<bool, StorageError> {
        let key = Self::key_from_uri(uri);
        let path = self.resolve(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        clean_empty_ancestors(&self.base_path, &path);
        Ok(true)
    }

    fn exists(&self, uri: &str) -> Result<bool, StorageError> {
        let key = Self::key_from_uri(uri);
        Ok(self.resolve(key).exists())
    }
}

/// Walks upward from a deleted file's parent, removing directories left
/// empty, stopping at `base` (spec.md §4.2: "cleans empty directories on
/// delete").
fn clean_empty_ancestors(base: &Path, deleted_file: &Path) {
    let mut dir = match deleted_file.parent() {
        Some(d) => d.to_path_buf(),
        None => return,
    };
    while dir != base && dir.starts_with(base) {
        let is_empty = match fs::read_dir(&dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => false,
        };
        if !is_empty {
            break;
        }
        if fs::remove_dir(&dir).is_err() {
            break;
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }
}

/// S3-compatible adapter behind the same interface. Uses `reqwest` with
/// path-style addressing (`{endpoint}/{bucket}/{key}`) and AWS SigV4-free
/// access for S3-compatible dev backends (MinIO et al.); production
/// credentials are supplied via the environment per spec.md §6, never
/// stored in config.
pub struct S3BlobBackend {
    endpoint: String,
    bucket: String,
    client: reqwest::blocking::Client,
}

impl S3BlobBackend {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint.trim_end_matches('/'), self.bucket, key)
    }
}

impl BlobBackend for S3BlobBackend {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        let url = self.object_url(key);
        self.client
            .put(&url)
            .header("Content-Type", content_type)
            .body(bytes.to_vec())
            .send()
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?
            .error_for_status()
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        Ok(format!("s3://{}/{key}", self.bucket))
    }

    fn get(&self, uri: &str) -> Result<Vec<u8>, StorageError> {
        let key = key_from_s3_uri(uri, &self.bucket);
        let resp = self
            .client
            .get(self.object_url(key))
            .send()
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        if !resp.status().is_success() {
            return Err(StorageError::NotFound { what: uri.to_string() });
        }
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })
    }

    fn delete(&self, uri: &str) -> Result<bool, StorageError> {
        let key = key_from_s3_uri(uri, &self.bucket);
        let resp = self
            .client
            .delete(self.object_url(key))
            .send()
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        Ok(resp.status().is_success())
    }

    fn exists(&self, uri: &str) -> Result<bool, StorageError> {
        let key = key_from_s3_uri(uri, &self.bucket);
        let resp = self
            .client
            .head(self.object_url(key))
            .send()
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        Ok(resp.status().is_success())
    }
}

fn key_from_s3_uri<'a>(uri: &'a str, bucket: &str) -> &'a str {
    uri.strip_prefix("s3://")
        .and_then(|rest| rest.strip_prefix(bucket))
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(uri)
}

/// Builds the content-addressed key for a fetched document (spec.md §6:
/// `{source}/{external_id}/{sha256[:16]}{.ext}`).
pub fn content_addressed_key(source: &str, external_id: &str, sha256_hex: &str, ext: &str) -> String {
    let prefix = &sha256_hex[..sha256_hex.len().min(16)];
    format!("{source}/{external_id}/{prefix}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_backend_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBlobBackend::new(dir.path());
        let uri = backend.put("CSMS/65794272/abcdef0123456789.html", b"hello", "text/html").unwrap();
        assert!(backend.exists(&uri).unwrap());
        assert_eq!(backend.get(&uri).unwrap(), b"hello");
        assert!(backend.delete(&uri).unwrap());
        assert!(!backend.exists(&uri).unwrap());
    }

    #[test]
    fn key_is_content_addressed() {
        let key = content_addressed_key("CSMS", "65794272", "abcdef0123456789ffff", ".html");
        assert_eq!(key, "CSMS/65794272/abcdef0123456789.html");
    }
}
