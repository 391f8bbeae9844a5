//! `ExclusionClaim` — a carve-out that suppresses an `Impose` measure on
//! matching HTS lines (spec.md §3, §4.1, §4.8 step 4).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The HTS match predicate an exclusion is keyed on. Matches are either
/// exact HTS10 codes or HTS8 prefixes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HtsConstraints {
    #[serde(default)]
    pub hts10_exact: Vec<String>,
    #[serde(default)]
    pub hts8_prefix: Vec<String>,
}

impl HtsConstraints {
    pub fn matches(&self, hts8: Option<&str>, hts10: Option<&str>) -> bool {
        if let Some(h10) = hts10 {
            if self.hts10_exact.iter().any(|x| x == h10) {
                return true;
            }
        }
        if let Some(h8) = hts8 {
            if self.hts8_prefix.iter().any(|x| x == h8) {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveWindow {
    pub effective_start: NaiveDate,
    pub effective_end: Option<NaiveDate>,
}

impl EffectiveWindow {
    pub fn covers(&self, as_of: NaiveDate) -> bool {
        as_of >= self.effective_start && self.effective_end.map_or(true, |e| as_of < e)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionClaim {
    pub exclusion_id: String,
    pub note_bucket: String,
    pub claim_ch99_heading: String,
    pub source_heading: String,
    pub hts_constraints: HtsConstraints,
    pub description_scope_text: String,
    pub scope_text_hash: String,
    pub effective_window: EffectiveWindow,
    /// Always true per spec.md §3 — exclusions always require follow-up
    /// verification even once matched mechanically.
    pub verification_required: bool,
}

impl ExclusionClaim {
    pub fn applies(&self, hts8: Option<&str>, hts10: Option<&str>, as_of: NaiveDate) -> bool {
        self.effective_window.covers(as_of) && self.hts_constraints.matches(hts8, hts10)
    }
}
