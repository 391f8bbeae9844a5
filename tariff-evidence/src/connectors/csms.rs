//! CSMS (CBP Cargo Systems Messaging Service) connector. Tier A: CSMS
//! bulletins are the authoritative source for Section 232/301 and IEEPA
//! administration notices (spec.md §4.3).

use chrono::NaiveDate;
use regex::Regex;
use tariff_core::types::document::{DocumentSource, DocumentTier};

use super::TrustedConnector;

pub struct CsmsConnector;

const TRUSTED_DOMAINS: &[&str] = &["cbp.gov"];

impl TrustedConnector for CsmsConnector {
    fn connector_name(&self) -> &'static str {
        "csms"
    }

    fn source(&self) -> DocumentSource {
        DocumentSource::Csms
    }

    fn tier(&self) -> DocumentTier {
        DocumentTier::A
    }

    fn trusted_domains(&self) -> &'static [&'static str] {
        TRUSTED_DOMAINS
    }

    fn extract_canonical_id(&self, text: &str) -> Option<String> {
        let re = Regex::new(r"CSMS\s*#\s*(\d{8})").ok()?;
        re.captures(text).map(|c| format!("CSMS#{}", &c[1]))
    }

    fn extract_effective_date(&self, text: &str) -> Option<NaiveDate> {
        let re = Regex::new(r"[Ee]ffective\s+(\w+\s+\d{1,2},\s*\d{4})").ok()?;
        let caps = re.captures(text)?;
        NaiveDate::parse_from_str(&caps[1], "%B %d, %Y").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_csms_canonical_id() {
        let connector = CsmsConnector;
        let id = connector.extract_canonical_id("See CSMS #65794272 for details.");
        assert_eq!(id.as_deref(), Some("CSMS#65794272"));
    }

    #[test]
    fn extracts_effective_date() {
        let connector = CsmsConnector;
        let date = connector.extract_effective_date("This guidance is effective January 1, 2026 for all filers.");
        assert_eq!(date, Some(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }
}
