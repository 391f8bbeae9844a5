//! Trusted Connectors (spec.md §4.3, C4): per-source fetchers with a
//! domain allowlist, audit trail, and metadata extraction. Each
//! connector declares its trusted domains, tier, and canonical-id/
//! effective-date extraction rules; the shared `fetch` default method
//! does the HTTP GET, hashing, text cleaning, and HTS/program scanning
//! common to every source.

pub mod csms;
pub mod federal_register;
pub mod usitc;

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};
use tariff_core::errors::EvidenceError;
use tariff_core::types::document::{DocumentSource, DocumentTier, FetchLogEntry};

pub use csms::CsmsConnector;
pub use federal_register::FederalRegisterConnector;
pub use usitc::UsitcConnector;

/// Outcome of one connector fetch (spec.md §4.3, §6). Fetch failures
/// return `success: false` with the exception string; the connector
/// never panics or propagates the transport error as a Rust `Err` — the
/// orchestrator aggregates successes and failures uniformly.
#[derive(Debug, Clone)]
pub struct ConnectorResult {
    pub success: bool,
    pub document_id: String,
    pub source: DocumentSource,
    pub tier: DocumentTier,
    pub connector_name: String,
    pub canonical_id: Option<String>,
    pub effective_start: Option<NaiveDate>,
    pub url: String,
    pub sha256_raw: String,
    pub extracted_text: String,
    pub hts_codes_mentioned: Vec<String>,
    pub programs_mentioned: Vec<String>,
    pub fetch_log: Vec<FetchLogEntry>,
    pub error: Option<String>,
}

/// HTS-code scan pattern (spec.md §4.3 item g): a 4-digit heading
/// optionally followed by up to three dot-separated 2-digit groups.
fn hts_scan_regex() -> Regex {
    Regex::new(tariff_core::constants::HTS_SCAN_PATTERN).expect("HTS_SCAN_PATTERN is a valid regex")
}

/// Program-hint substrings scanned for in extracted text (spec.md §4.3
/// item g).
const PROGRAM_HINTS: &[&str] = &["section 232", "section 301", "ieepa", "reciprocal", "fentanyl"];

pub trait TrustedConnector: Send + Sync {
    fn connector_name(&self) -> &'static str;
    fn source(&self) -> DocumentSource;
    fn tier(&self) -> DocumentTier;
    fn trusted_domains(&self) -> &'static [&'static str];
    fn user_agent(&self) -> &'static str {
        "tariffstack-connector/0.1"
    }

    /// Pattern-based canonical-id extraction over cleaned text, per
    /// known citation formats for this source (spec.md §4.3 item f):
    /// `CSMS #NNNNNNNN`, `NN FR NNNNN`, `EO-NNNN`, `PROC-NNNN`,
    /// `HTS-CHNN`, `HTS-NOTENN[A]`.
    fn extract_canonical_id(&self, text: &str) -> Option<String>;

    /// Pattern-based effective-date extraction for this source.
    fn extract_effective_date(&self, text: &str) -> Option<NaiveDate>;

    /// Rejects URLs outside the trusted-domain allowlist (exact or
    /// subdomain match), performs the GET, and builds the full
    /// `ConnectorResult`. Never panics; transport failures are folded
    /// into `success=false` (spec.md §4.3, §7).
    fn fetch(&self, url: &str) -> ConnectorResult {
        let document_id = uuid::Uuid::new_v4().to_string();
        match self.fetch_checked(url) {
            Ok(result) => result,
            Err(EvidenceError::UntrustedSource { host, connector }) => {
                tracing::warn!(host, connector, url, "connector refused untrusted domain");
                ConnectorResult {
                    success: false,
                    document_id,
                    source: self.source(),
                    tier: self.tier(),
                    connector_name: self.connector_name().to_string(),
                    canonical_id: None,
                    effective_start: None,
                    url: url.to_string(),
                    sha256_raw: String::new(),
                    extracted_text: String::new(),
                    hts_codes_mentioned: Vec::new(),
                    programs_mentioned: Vec::new(),
                    fetch_log: Vec::new(),
                    error: Some(format!("untrusted source: {host}")),
                }
            }
            Err(other) => {
                tracing::warn!(url, error = %other, "connector fetch failed");
                ConnectorResult {
                    success: false,
                    document_id,
                    source: self.source(),
                    tier: self.tier(),
                    connector_name: self.connector_name().to_string(),
                    canonical_id: None,
                    effective_start: None,
                    url: url.to_string(),
                    sha256_raw: String::new(),
                    extracted_text: String::new(),
                    hts_codes_mentioned: Vec::new(),
                    programs_mentioned: Vec::new(),
                    fetch_log: Vec::new(),
                    error: Some(other.to_string()),
                }
            }
        }
    }

    fn fetch_checked(&self, url: &str) -> Result<ConnectorResult, EvidenceError> {
        let host = url_host(url).ok_or_else(|| EvidenceError::UntrustedSource {
            host: url.to_string(),
            connector: self.connector_name().to_string(),
        })?;
        if !is_trusted(&host, self.trusted_domains()) {
            return Err(EvidenceError::UntrustedSource {
                host,
                connector: self.connector_name().to_string(),
            });
        }

        tracing::info!(url, connector = self.connector_name(), "fetching document");
        let started = Instant::now();
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent())
            .build()
            .map_err(|e| EvidenceError::FetchFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let response = client.get(url).send().map_err(|e| EvidenceError::FetchFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().map_err(|e| EvidenceError::FetchFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let sha256_raw = hex_sha256(&body);
        let extracted_text = clean_text(&String::from_utf8_lossy(&body));
        let hts_codes_mentioned = scan_hts_codes(&extracted_text);
        let programs_mentioned = scan_program_hints(&extracted_text);
        let canonical_id = self.extract_canonical_id(&extracted_text);
        let effective_start = self.extract_effective_date(&extracted_text);

        let fetch_log = vec![FetchLogEntry {
            retrieved_at: Utc::now(),
            status_code,
            content_type,
            content_length: Some(body.len() as u64),
            response_time_ms,
        }];

        tracing::info!(url, status_code, "fetch succeeded");

        Ok(ConnectorResult {
            success: true,
            document_id: uuid::Uuid::new_v4().to_string(),
            source: self.source(),
            tier: self.tier(),
            connector_name: self.connector_name().to_string(),
            canonical_id,
            effective_start,
            url: url.to_string(),
            sha256_raw,
            extracted_text,
            hts_codes_mentioned,
            programs_mentioned,
            fetch_log,
            error: None,
        })
    }
}

fn url_host(url: &str) -> Option<String> {
    let without_scheme = url.split("://").nth(1)?;
    let host_and_path = without_scheme.split('/').next()?;
    let host = host_and_path.split('@').next_back()?.split(':').next()?;
    Some(host.to_lowercase())
}

/// Exact or subdomain match against the trusted-domain allowlist
/// (spec.md §4.3 item a).
fn is_trusted(host: &str, trusted_domains: &[&str]) -> bool {
    trusted_domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Strips `script/style/nav/header/footer` elements and collapses
/// whitespace (spec.md §4.3 item e). This is a lightweight tag stripper,
/// not a full HTML parser: good enough for government bulletin pages
/// which are not adversarial input.
fn clean_text(raw: &str) -> String {
    let tag_strip =
        Regex::new(r"(?is)<(?:script|style|nav|header|footer)[^>]*>.*?</(?:script|style|nav|header|footer)>")
            .unwrap();
    let without_blocks = tag_strip.replace_all(raw, " ");
    let tag_re = Regex::new(r"(?s)<[^>]+>").unwrap();
    let without_tags = tag_re.replace_all(&without_blocks, " ");
    let ws_re = Regex::new(r"\s+").unwrap();
    ws_re.replace_all(without_tags.trim(), " ").to_string()
}

fn scan_hts_codes(text: &str) -> Vec<String> {
    let re = hts_scan_regex();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for m in re.find_iter(text) {
        let code = m.as_str().to_string();
        if seen.insert(code.clone()) {
            out.push(code);
        }
    }
    out
}

fn scan_program_hints(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    PROGRAM_HINTS
        .iter()
        .filter(|hint| lower.contains(*hint))
        .map(|hint| hint.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_domain_matches_exact_and_subdomain() {
        let domains = ["cbp.gov"];
        assert!(is_trusted("cbp.gov", &domains));
        assert!(is_trusted("content.cbp.gov", &domains));
        assert!(!is_trusted("evilcbp.gov", &domains));
        assert!(!is_trusted("cbp.gov.evil.com", &domains));
    }

    #[test]
    fn cleans_script_and_style_blocks() {
        let raw = "<html><head><style>.a{}</style></head><body><script>alert(1)</script><p>Hello  world</p></body></html>";
        assert_eq!(clean_text(raw), "Hello world");
    }

    #[test]
    fn scans_hts_codes_and_program_hints() {
        let text = "Section 301 applies to 8536.90.4000 and also 8536.90 under IEEPA fentanyl policy.";
        let codes = scan_hts_codes(text);
        assert!(codes.contains(&"8536.90.4000".to_string()));
        let hints = scan_program_hints(text);
        assert!(hints.contains(&"section 301".to_string()));
        assert!(hints.contains(&"fentanyl".to_string()));
    }
}
