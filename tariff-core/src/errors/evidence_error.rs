//! Evidence-pipeline errors: connectors, chunking, the reader/validator
//! round trip, and the write gate.

use super::error_code::{self, TariffErrorCode};
use super::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    /// A connector refused a URL outside its trusted-domain allowlist.
    /// Surfaced to the caller; never retried automatically (§7).
    #[error("untrusted source: {host} is not an allowed domain for connector {connector}")]
    UntrustedSource { host: String, connector: String },

    /// Transport-level failure. The orchestrator retries this with
    /// exponential backoff up to a bounded attempt count (§7).
    #[error("fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    /// The chunker or text extractor failed on a document. Recorded on
    /// the document as `extraction_failed=true`; does not block other
    /// documents (§7).
    #[error("parse error on document {document_id}: {message}")]
    ParseError {
        document_id: String,
        message: String,
    },

    /// One or more mechanical write-gate checks failed. Recorded to the
    /// review queue with full context; never admits the fact (§4.6, §7).
    #[error("write gate rejected assertion: {reason}")]
    WriteGateRejection { reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TariffErrorCode for EvidenceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UntrustedSource { .. } => error_code::UNTRUSTED_SOURCE,
            Self::FetchFailed { .. } => error_code::FETCH_ERROR,
            Self::ParseError { .. } => error_code::PARSE_ERROR,
            Self::WriteGateRejection { .. } => error_code::WRITE_GATE_REJECTION,
            Self::Storage(e) => e.error_code(),
        }
    }
}
