//! Stable, machine-readable error codes.
//!
//! Every error enum in the workspace implements [`TariffErrorCode`] so
//! downstream consumers (the CLI, the review queue, audit logs) can key on
//! a stable string instead of matching on `Display` text.

/// Returns a stable string code for an error variant.
pub trait TariffErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const INVALID_HTS_CODE: &str = "INVALID_HTS_CODE";
pub const INVALID_COUNTRY_CODE: &str = "INVALID_COUNTRY_CODE";
pub const INVALID_MONEY_AMOUNT: &str = "INVALID_MONEY_AMOUNT";

pub const DB_BUSY: &str = "DB_BUSY";
pub const DB_CORRUPT: &str = "DB_CORRUPT";
pub const DISK_FULL: &str = "DISK_FULL";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";

pub const UNTRUSTED_SOURCE: &str = "UNTRUSTED_SOURCE";
pub const FETCH_ERROR: &str = "FETCH_ERROR";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const WRITE_GATE_REJECTION: &str = "WRITE_GATE_REJECTION";

pub const INVALID_MATERIAL_ALLOCATION: &str = "INVALID_MATERIAL_ALLOCATION";
pub const DATA_INTEGRITY_ERROR: &str = "DATA_INTEGRITY_ERROR";
pub const AMBIGUOUS_EFFECTIVE_WINDOW: &str = "AMBIGUOUS_EFFECTIVE_WINDOW";
