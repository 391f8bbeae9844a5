pub mod assertions;
pub mod chunks;
pub mod country;
pub mod documents;
pub mod exclusions;
pub mod measures;
pub mod program_applicability;
pub mod review;

pub(crate) fn sqe(e: impl std::fmt::Display) -> tariff_core::errors::StorageError {
    tariff_core::errors::StorageError::SqliteError {
        message: e.to_string(),
    }
}
