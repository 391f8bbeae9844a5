//! Re-exports the duty-calculation error enum declared in `tariff-core`.

pub use tariff_core::errors::EngineError;
