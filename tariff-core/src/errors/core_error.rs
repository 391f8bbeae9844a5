use super::error_code::{self, TariffErrorCode};

/// Validation errors raised at the boundaries every layer shares: parsing
/// an HTS code, a country code, or a money amount out of untrusted input.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid HTS code {value:?}: {reason}")]
    InvalidHtsCode { value: String, reason: String },

    #[error("invalid ISO-3166 alpha-2 country code {value:?}")]
    InvalidCountryCode { value: String },

    #[error("invalid money amount {value:?}: {reason}")]
    InvalidMoneyAmount { value: String, reason: String },

    /// Catch-all for parse/validation failures that aren't specifically
    /// an HTS code, country code, or money amount — an unrecognised
    /// program id or material, a malformed config file.
    #[error("{what}: {reason}")]
    Validation { what: String, reason: String },
}

impl TariffErrorCode for CoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidHtsCode { .. } => error_code::INVALID_HTS_CODE,
            Self::InvalidCountryCode { .. } => error_code::INVALID_COUNTRY_CODE,
            Self::InvalidMoneyAmount { .. } => error_code::INVALID_MONEY_AMOUNT,
            Self::Validation { .. } => error_code::VALIDATION_ERROR,
        }
    }
}
