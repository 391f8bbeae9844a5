//! Process configuration, loaded from a TOML file and overlaid with
//! environment variables (spec.md §6 "Configuration (process
//! environment)"). Modeled on the reference engine's `ScanConfig`:
//! every field optional with an `effective_*` accessor supplying the
//! documented default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackendKind {
    #[default]
    Local,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// `STORAGE_BACKEND`.
    pub storage_backend: Option<BlobBackendKind>,
    /// `STORAGE_PATH`: base directory for the local blob backend.
    pub storage_path: Option<String>,
    /// `S3_BUCKET`.
    pub s3_bucket: Option<String>,
    /// S3 credentials are read from the environment by the AWS SDK
    /// convention; only the bucket and optional endpoint override live
    /// here.
    pub s3_endpoint: Option<String>,
    /// Database URL for the relational store (SQLite file path or
    /// `:memory:`).
    pub database_url: Option<String>,
    /// Reader/validator model identifiers.
    pub reader_model: Option<String>,
    pub validator_model: Option<String>,
    /// Name of the environment variable holding the LLM API credential;
    /// the credential value itself is never stored in config.
    pub llm_api_key_env: Option<String>,
    /// Connector request timeout, seconds.
    pub connector_timeout_secs: Option<u64>,
    pub connector_retry_max_attempts: Option<u32>,
    pub connector_retry_backoff_ms: Option<u64>,
    /// Review-queue priority threshold: entries at or above this
    /// priority are surfaced first by `review list`.
    pub review_queue_priority_threshold: Option<u8>,
    /// `RUST_LOG`/`TARIFF_LOG`-style filter string.
    pub log_level: Option<String>,
    /// Chunker size discipline (spec.md §4.4).
    pub chunk_min_size: Option<usize>,
    pub chunk_max_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    /// Section-301 future-date guard horizon, days (spec.md §4.8 step 6).
    pub section301_future_date_horizon_days: Option<i64>,
    /// Warning-only citation document-diversity floor (spec.md §4.6 item 7).
    pub min_citation_document_diversity: Option<usize>,
}

impl AppConfig {
    /// Load from a TOML file, then overlay a handful of environment
    /// variables that operators expect to be able to set without editing
    /// the file (spec.md §6).
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, crate::errors::CoreError> {
        let text = std::fs::read_to_string(path).map_err(|e| crate::errors::CoreError::Validation {
            what: format!("config file {}", path.display()),
            reason: e.to_string(),
        })?;
        let mut cfg: AppConfig = toml::from_str(&text).map_err(|e| crate::errors::CoreError::Validation {
            what: format!("config file {}", path.display()),
            reason: e.to_string(),
        })?;
        cfg.overlay_env();
        Ok(cfg)
    }

    /// Applies the handful of environment overrides spec.md §6 documents
    /// operators expect without editing the config file. Exposed so a
    /// caller with no config file (e.g. `tariffctl` run bare) can still
    /// honor them.
    pub fn overlay_env(&mut self) {
        if let Ok(v) = std::env::var("STORAGE_BACKEND") {
            self.storage_backend = match v.to_lowercase().as_str() {
                "s3" => Some(BlobBackendKind::S3),
                _ => Some(BlobBackendKind::Local),
            };
        }
        if let Ok(v) = std::env::var("STORAGE_PATH") {
            self.storage_path = Some(v);
        }
        if let Ok(v) = std::env::var("S3_BUCKET") {
            self.s3_bucket = Some(v);
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database_url = Some(v);
        }
    }

    pub fn effective_storage_backend(&self) -> BlobBackendKind {
        self.storage_backend.unwrap_or_default()
    }

    pub fn effective_storage_path(&self) -> String {
        self.storage_path.clone().unwrap_or_else(|| "./data/blobs".to_string())
    }

    pub fn effective_database_url(&self) -> String {
        self.database_url.clone().unwrap_or_else(|| "./data/tariff.db".to_string())
    }

    pub fn effective_connector_timeout_secs(&self) -> u64 {
        self.connector_timeout_secs
            .unwrap_or(crate::constants::DEFAULT_CONNECTOR_TIMEOUT_SECS)
    }

    pub fn effective_connector_retry_max_attempts(&self) -> u32 {
        self.connector_retry_max_attempts
            .unwrap_or(crate::constants::DEFAULT_CONNECTOR_RETRY_MAX_ATTEMPTS)
    }

    pub fn effective_connector_retry_backoff_ms(&self) -> u64 {
        self.connector_retry_backoff_ms
            .unwrap_or(crate::constants::DEFAULT_CONNECTOR_RETRY_BACKOFF_MS)
    }

    pub fn effective_review_queue_priority_threshold(&self) -> u8 {
        self.review_queue_priority_threshold.unwrap_or(5)
    }

    pub fn effective_chunk_min_size(&self) -> usize {
        self.chunk_min_size.unwrap_or(crate::constants::DEFAULT_MIN_CHUNK_SIZE)
    }

    pub fn effective_chunk_max_size(&self) -> usize {
        self.chunk_max_size.unwrap_or(crate::constants::DEFAULT_MAX_CHUNK_SIZE)
    }

    pub fn effective_chunk_overlap(&self) -> usize {
        self.chunk_overlap.unwrap_or(crate::constants::DEFAULT_CHUNK_OVERLAP)
    }

    pub fn effective_section301_future_horizon_days(&self) -> i64 {
        self.section301_future_date_horizon_days
            .unwrap_or(crate::constants::DEFAULT_SECTION301_FUTURE_HORIZON_DAYS)
    }

    pub fn effective_min_citation_document_diversity(&self) -> usize {
        self.min_citation_document_diversity
            .unwrap_or(crate::constants::DEFAULT_MIN_CITATION_DOCUMENT_DIVERSITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.effective_chunk_min_size(), 200);
        assert_eq!(cfg.effective_chunk_max_size(), 1200);
        assert_eq!(cfg.effective_chunk_overlap(), 50);
        assert_eq!(cfg.effective_storage_backend(), BlobBackendKind::Local);
    }
}
