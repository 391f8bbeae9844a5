//! Duty-calculation errors for the temporal store, Section-301 evaluator,
//! and the stacking engine.

use super::error_code::{self, TariffErrorCode};
use super::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Material content values did not sum below the declared entry
    /// value, or a material was subtracted more than once (§4.9 Step 2).
    #[error("invalid material allocation: {reason}")]
    InvalidMaterialAllocation { reason: String },

    /// Two `TariffMeasure` rows for the same `(program, scope)` both have
    /// `effective_end IS NULL`, or their windows overlap. Fatal; must
    /// never be silently swallowed (§4.1, §7).
    #[error("data integrity error: {reason}")]
    DataIntegrityError { reason: String },

    /// An arithmetic mismatch between slice sums and the input value.
    /// Fatal per §4.9 Step 2 and §7.
    #[error("slice sum mismatch: slices summed to {computed_cents} cents, expected {expected_cents} cents")]
    SliceSumMismatch {
        computed_cents: i64,
        expected_cents: i64,
    },

    /// `entry_date` is further in the future than the configured horizon
    /// (§4.8 step 6).
    #[error("entry date {entry_date} is beyond the configured future-date horizon")]
    FutureDateRejected { entry_date: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TariffErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMaterialAllocation { .. } => error_code::INVALID_MATERIAL_ALLOCATION,
            Self::DataIntegrityError { .. } => error_code::DATA_INTEGRITY_ERROR,
            Self::SliceSumMismatch { .. } => error_code::DATA_INTEGRITY_ERROR,
            Self::FutureDateRejected { .. } => error_code::VALIDATION_ERROR,
            Self::Storage(e) => e.error_code(),
        }
    }
}
