//! Harmonized Tariff Schedule codes.
//!
//! A code is semantically hierarchical: digits 1-4 are the heading, 1-6
//! the subheading, 1-8 the tariff item, 1-10 the statistical suffix.
//! Stored normalised to digits-only; `digits()` records the precision at
//! which it was recorded (spec.md §3: `hts_digits ∈ {4,6,8,10}`).

use std::fmt;

use crate::errors::CoreError;

/// Precision at which an HTS code was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HtsDigits {
    Four = 4,
    Six = 6,
    Eight = 8,
    Ten = 10,
}

impl HtsDigits {
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            4 => Some(Self::Four),
            6 => Some(Self::Six),
            8 => Some(Self::Eight),
            10 => Some(Self::Ten),
            _ => None,
        }
    }

    pub fn as_usize(self) -> usize {
        self as usize
    }
}

/// Which scope precision a `TariffMeasure` is keyed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ScopeHtsType {
    Hts8,
    Hts10,
}

impl ScopeHtsType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hts8 => "HTS8",
            Self::Hts10 => "HTS10",
        }
    }
}

impl std::str::FromStr for ScopeHtsType {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTS8" => Ok(Self::Hts8),
            "HTS10" => Ok(Self::Hts10),
            other => Err(CoreError::InvalidHtsCode {
                value: other.to_string(),
                reason: "unknown scope_hts_type, expected HTS8 or HTS10".into(),
            }),
        }
    }
}

/// A digits-only HTS code, normalised at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HtsCode {
    digits_only: String,
    precision: HtsDigits,
}

impl HtsCode {
    /// Parse an HTS code from any conventional representation
    /// (`8536.90.4000`, `8536904000`, with or without dots/dashes).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let digits_only: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        let precision = HtsDigits::from_len(digits_only.len()).ok_or_else(|| CoreError::InvalidHtsCode {
            value: raw.to_string(),
            reason: format!(
                "expected 4, 6, 8, or 10 digits after normalisation, got {}",
                digits_only.len()
            ),
        })?;
        Ok(Self {
            digits_only,
            precision,
        })
    }

    pub fn digits(&self) -> &str {
        &self.digits_only
    }

    pub fn precision(&self) -> HtsDigits {
        self.precision
    }

    /// Truncate to the first 8 digits (HTS8). Pads are never invented:
    /// a code shorter than 8 digits has no HTS8 projection.
    pub fn hts8(&self) -> Option<String> {
        if self.digits_only.len() >= 8 {
            Some(self.digits_only[..8].to_string())
        } else {
            None
        }
    }

    /// Truncate to the first 10 digits (HTS10).
    pub fn hts10(&self) -> Option<String> {
        if self.digits_only.len() >= 10 {
            Some(self.digits_only[..10].to_string())
        } else {
            None
        }
    }
}

impl fmt::Display for HtsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.digits_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_hts10() {
        let hts = HtsCode::parse("8536.90.4000").unwrap();
        assert_eq!(hts.digits(), "8536904000");
        assert_eq!(hts.precision(), HtsDigits::Ten);
        assert_eq!(hts.hts8().as_deref(), Some("85369040"));
        assert_eq!(hts.hts10().as_deref(), Some("8536904000"));
    }

    #[test]
    fn rejects_bad_length() {
        assert!(HtsCode::parse("853").is_err());
        assert!(HtsCode::parse("853690400012").is_err());
    }

    #[test]
    fn hts8_code_has_no_hts10_projection() {
        let hts = HtsCode::parse("85369040").unwrap();
        assert_eq!(hts.hts10(), None);
        assert_eq!(hts.hts8().as_deref(), Some("85369040"));
    }
}
