//! Re-exports the evidence-layer error enum declared in `tariff-core`
//! (the foundation crate owns every per-layer error type so
//! `tariff_core::errors::StorageError` conversions stay in one place).

pub use tariff_core::errors::EvidenceError;
