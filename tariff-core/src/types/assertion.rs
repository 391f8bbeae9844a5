//! `VerifiedAssertion` — the SCD-2 truth table admitted by the write gate
//! (spec.md §3, §4.6, §4.7).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::program::{Metal, ProgramId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssertionType {
    InScope,
    OutOfScope,
    Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedAssertion {
    pub id: String,
    pub program_id: ProgramId,
    pub hts_code_norm: String,
    pub hts_digits: u8,
    pub material: Option<Metal>,
    pub assertion_type: AssertionType,
    pub claim_code: Option<String>,
    pub disclaim_code: Option<String>,
    pub duty_rate: Option<f64>,
    pub effective_start: NaiveDate,
    pub effective_end: Option<NaiveDate>,
    pub document_id: String,
    pub chunk_id: String,
    pub evidence_quote: String,
    pub evidence_quote_hash: String,
    pub reader_output: String,
    pub validator_output: String,
    pub verified_at: DateTime<Utc>,
    pub verified_by: String,
}

impl VerifiedAssertion {
    /// The current row for `as_of`: started on or before it, and not yet
    /// closed (or closed strictly after it) — spec.md §4.7.
    pub fn is_current(&self, as_of: NaiveDate) -> bool {
        as_of >= self.effective_start && self.effective_end.map_or(true, |e| as_of < e)
    }
}
