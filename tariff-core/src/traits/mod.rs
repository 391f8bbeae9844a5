//! Storage-shaped interfaces implemented by `tariff-storage` and
//! `tariff-evidence`, and consumed by `tariff-engine`/`tariff-cli`.
//! Splitting the contract into narrow traits (rather than one god
//! interface) mirrors the reference engine's `traits::storage::*`
//! module split by concern.

pub mod blob;
pub mod evidence_store;
pub mod llm;
pub mod tariff_store;
