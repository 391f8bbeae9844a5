//! Documents and chunks (spec.md §3, §4.2, §4.4).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentTier {
    A,
    B,
    C,
}

impl DocumentTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// Only Tier A documents may be evidence for a verified assertion
    /// (spec.md §3, §4.6).
    pub fn is_evidence_eligible(self) -> bool {
        matches!(self, Self::A)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentSource {
    Csms,
    FederalRegister,
    Usitc,
}

impl DocumentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csms => "CSMS",
            Self::FederalRegister => "FEDERAL_REGISTER",
            Self::Usitc => "USITC",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchLogEntry {
    pub retrieved_at: DateTime<Utc>,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source: DocumentSource,
    pub tier: DocumentTier,
    pub connector_name: String,
    pub canonical_id: String,
    pub url: String,
    pub title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub effective_start: Option<NaiveDate>,
    pub sha256_raw: String,
    pub storage_uri: String,
    pub extracted_text: String,
    pub hts_codes_mentioned: Vec<String>,
    pub programs_mentioned: Vec<String>,
    pub fetch_log: Vec<FetchLogEntry>,
    pub extraction_failed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: u32,
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
    pub text_hash: String,
    pub embedding_id: Option<String>,
}
