//! `TariffMeasure` — the SCD-2 versioned row at the heart of the temporal
//! tariff store (spec.md §3, §4.1).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::hts::ScopeHtsType;
use crate::types::program::ProgramId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateStatus {
    Confirmed,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureRole {
    Impose,
    Exclude,
}

/// Governs the duty base: `Primary`/`Derivative` use the full entered
/// value, `Content` uses only the declared material-content value
/// (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleType {
    Primary,
    Derivative,
    Content,
}

/// A single SCD-2 row: one program's rate for one HTS scope, valid over
/// `[effective_start, effective_end)`. `effective_end = None` means
/// "current". At most one `Impose` row per `(program, scope)` may be
/// current at a time (spec.md §3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffMeasure {
    pub id: String,
    pub program_id: ProgramId,
    pub ch99_heading: String,
    pub scope_hts_type: ScopeHtsType,
    pub scope_hts_value: String,
    pub effective_start: NaiveDate,
    pub effective_end: Option<NaiveDate>,
    pub additional_rate: f64,
    pub rate_status: RateStatus,
    pub role: MeasureRole,
    pub article_type: ArticleType,
    pub source_version_id: String,
    pub supersedes_id: Option<String>,
    pub superseded_by_id: Option<String>,
}

impl TariffMeasure {
    /// End-exclusive window test: `effective_start <= entry_date <
    /// effective_end` (spec.md §3, §4.1).
    pub fn covers(&self, entry_date: NaiveDate) -> bool {
        if entry_date < self.effective_start {
            return false;
        }
        match self.effective_end {
            Some(end) => entry_date < end,
            None => true,
        }
    }

    pub fn is_current(&self) -> bool {
        self.effective_end.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(start: &str, end: Option<&str>) -> TariffMeasure {
        TariffMeasure {
            id: "m1".into(),
            program_id: ProgramId::Section232Copper,
            ch99_heading: "9903.78.01".into(),
            scope_hts_type: ScopeHtsType::Hts8,
            scope_hts_value: "74092100".into(),
            effective_start: start.parse().unwrap(),
            effective_end: end.map(|e| e.parse().unwrap()),
            additional_rate: 0.5,
            rate_status: RateStatus::Confirmed,
            role: MeasureRole::Impose,
            article_type: ArticleType::Derivative,
            source_version_id: "v1".into(),
            supersedes_id: None,
            superseded_by_id: None,
        }
    }

    #[test]
    fn end_exclusive_window() {
        let m = sample("2025-08-01", Some("2026-01-01"));
        assert!(!m.covers("2025-07-31".parse().unwrap()));
        assert!(m.covers("2025-08-01".parse().unwrap()));
        assert!(m.covers("2025-12-31".parse().unwrap()));
        assert!(!m.covers("2026-01-01".parse().unwrap()));
    }

    #[test]
    fn open_ended_is_current() {
        let m = sample("2025-08-01", None);
        assert!(m.is_current());
        assert!(m.covers("2099-01-01".parse().unwrap()));
    }
}
