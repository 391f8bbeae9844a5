//! Federal Register connector: executive orders, proclamations, and `NN
//! FR NNNNN` citations (spec.md §4.3).

use chrono::NaiveDate;
use regex::Regex;
use tariff_core::types::document::{DocumentSource, DocumentTier};

use super::TrustedConnector;

pub struct FederalRegisterConnector;

const TRUSTED_DOMAINS: &[&str] = &["federalregister.gov", "govinfo.gov"];

impl TrustedConnector for FederalRegisterConnector {
    fn connector_name(&self) -> &'static str {
        "govinfo"
    }

    fn source(&self) -> DocumentSource {
        DocumentSource::FederalRegister
    }

    fn tier(&self) -> DocumentTier {
        DocumentTier::A
    }

    fn trusted_domains(&self) -> &'static [&'static str] {
        TRUSTED_DOMAINS
    }

    fn extract_canonical_id(&self, text: &str) -> Option<String> {
        if let Some(caps) = Regex::new(r"(\d{2})\s*FR\s*(\d{3,6})").ok()?.captures(text) {
            return Some(format!("{} FR {}", &caps[1], &caps[2]));
        }
        if let Some(caps) = Regex::new(r"(?i)Executive\s+Order\s+(\d{4,5})").ok()?.captures(text) {
            return Some(format!("EO-{}", &caps[1]));
        }
        if let Some(caps) = Regex::new(r"(?i)Proclamation\s+(\d{3,5})").ok()?.captures(text) {
            return Some(format!("PROC-{}", &caps[1]));
        }
        None
    }

    fn extract_effective_date(&self, text: &str) -> Option<NaiveDate> {
        let re = Regex::new(r"[Ee]ffective\s+(?:date\s+of\s+)?(\w+\s+\d{1,2},\s*\d{4})").ok()?;
        let caps = re.captures(text)?;
        NaiveDate::parse_from_str(&caps[1], "%B %d, %Y").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fr_citation() {
        let connector = FederalRegisterConnector;
        assert_eq!(
            connector.extract_canonical_id("Published at 90 FR 12345 on this date."),
            Some("90 FR 12345".to_string())
        );
    }

    #[test]
    fn extracts_executive_order() {
        let connector = FederalRegisterConnector;
        assert_eq!(
            connector.extract_canonical_id("Executive Order 14257 imposes additional duties."),
            Some("EO-14257".to_string())
        );
    }
}
