//! Country code mappings: census code and IEEPA-Reciprocal Ch99-heading
//! to ISO alpha-2, versioned by effective date (spec.md §3).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryMapping {
    pub census_code: Option<String>,
    pub ch99_country_heading: Option<String>,
    pub iso_alpha2: String,
    pub effective_start: NaiveDate,
    pub effective_end: Option<NaiveDate>,
}

impl CountryMapping {
    pub fn covers(&self, as_of: NaiveDate) -> bool {
        as_of >= self.effective_start && self.effective_end.map_or(true, |e| as_of < e)
    }
}

/// The fixed set of COO values in scope for IEEPA Fentanyl at the time
/// this corpus was built (spec.md §4.9 Step 4: "if COO is in the
/// fentanyl set"). Kept as data, not a hardcoded match arm, so ingestion
/// can extend it without a code change.
#[derive(Debug, Clone, Default)]
pub struct FentanylCountrySet {
    pub iso_alpha2_codes: Vec<String>,
}

impl FentanylCountrySet {
    pub fn contains(&self, iso_alpha2: &str) -> bool {
        self.iso_alpha2_codes
            .iter()
            .any(|c| c.eq_ignore_ascii_case(iso_alpha2))
    }
}
