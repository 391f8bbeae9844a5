//! USITC (U.S. International Trade Commission) connector: HTS chapter
//! and note citations (`HTS-CHNN`, `HTS-NOTENN[A]`) used by Section-301
//! exclusion notes (spec.md §4.3).

use chrono::NaiveDate;
use regex::Regex;
use tariff_core::types::document::{DocumentSource, DocumentTier};

use super::TrustedConnector;

pub struct UsitcConnector;

const TRUSTED_DOMAINS: &[&str] = &["usitc.gov", "hts.usitc.gov"];

impl TrustedConnector for UsitcConnector {
    fn connector_name(&self) -> &'static str {
        "usitc"
    }

    fn source(&self) -> DocumentSource {
        DocumentSource::Usitc
    }

    fn tier(&self) -> DocumentTier {
        DocumentTier::A
    }

    fn trusted_domains(&self) -> &'static [&'static str] {
        TRUSTED_DOMAINS
    }

    fn extract_canonical_id(&self, text: &str) -> Option<String> {
        if let Some(caps) = Regex::new(r"(?i)Note\s+(\d{1,3})(\w?)\s+to\s+[Cc]hapter\s+99").ok()?.captures(text) {
            return Some(format!("HTS-NOTE{}{}", &caps[1], &caps[2]));
        }
        if let Some(caps) = Regex::new(r"(?i)[Cc]hapter\s+(\d{1,2})\b").ok()?.captures(text) {
            return Some(format!("HTS-CH{:0>2}", &caps[1]));
        }
        None
    }

    fn extract_effective_date(&self, text: &str) -> Option<NaiveDate> {
        let re = Regex::new(r"[Ee]ffective\s+(\w+\s+\d{1,2},\s*\d{4})").ok()?;
        let caps = re.captures(text)?;
        NaiveDate::parse_from_str(&caps[1], "%B %d, %Y").ok()
    }
}
