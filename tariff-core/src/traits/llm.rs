//! Reader + Validator capabilities (spec.md §4.5, C6) and the closed-sum
//! output types they return.
//!
//! Design note (spec.md §9): "Dynamic output objects from
//! Reader/Validator" are modeled here as a closed sum of variants
//! (`Success`/`Failure`) rather than an exception path — the permissive
//! JSON-extraction step (locate the outermost `{...}`) is a parser that
//! *yields* this sum, never raises.

use serde::{Deserialize, Serialize};

use crate::types::program::Metal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub document_id: String,
    pub chunk_id: String,
    pub quote: String,
    pub why_this_supports: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderAnswer {
    /// `None` is the required answer when the provided chunks do not
    /// support either conclusion (spec.md §4.5).
    pub in_scope: Option<bool>,
    pub program: String,
    pub hts_code: String,
    pub claim_codes: Vec<String>,
    pub disclaim_codes: Vec<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderSuccess {
    pub answer: ReaderAnswer,
    pub citations: Vec<Citation>,
    pub missing_info: Vec<String>,
    pub contradictions: Vec<String>,
}

/// Closed sum of Reader outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReaderOutput {
    Success(ReaderSuccess),
    Failure { error: String, raw_text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub citation_index: usize,
    pub reason: String,
    pub severity: FailureSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorSuccess {
    pub verified: bool,
    pub failures: Vec<ValidationFailure>,
    pub required_fixes: Vec<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidatorOutput {
    Success(ValidatorSuccess),
    Failure { error: String, raw_text: String },
}

/// Packed input handed to the Reader: the question plus the chunks
/// assembled by the ingestion orchestrator.
#[derive(Debug, Clone)]
pub struct ReaderQuestion {
    pub hts_code: String,
    pub program: String,
    pub material: Option<Metal>,
    pub chunks: Vec<ChunkRef>,
}

#[derive(Debug, Clone)]
pub struct ChunkRef {
    pub document_id: String,
    pub chunk_id: String,
    pub text: String,
}

/// Injected into C6 rather than called as global state (spec.md §9:
/// "Inject `ReaderClient` and `ValidatorClient` capabilities into C6;
/// tests provide deterministic fakes. No mocking of global modules at
/// call sites."). Runs at low temperature (spec.md §4.5).
pub trait ReaderClient: Send + Sync {
    fn ask(&self, question: &ReaderQuestion) -> ReaderOutput;
}

/// Runs independently-prompted, at zero temperature or an entirely
/// different prompt than the Reader, for correlated-error reduction
/// (spec.md §4.5).
pub trait ValidatorClient: Send + Sync {
    fn validate(&self, reader_output: &ReaderOutput, chunks: &[ChunkRef]) -> ValidatorOutput;
}
