//! Write Gate (spec.md §4.6, C7): a purely deterministic admission
//! filter between unverified reader/validator output and the
//! `verified_assertions` truth store. On pass, admits the fact with
//! SCD-2 closure of any overlapping prior assertion; on fail, records
//! the attempt to the Review Queue with full context.

use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};
use tariff_core::traits::evidence_store::{IAssertionCache, IDocumentStore, IReviewQueue};
use tariff_core::traits::llm::{Citation, ReaderOutput, ValidatorOutput};
use tariff_core::types::assertion::{AssertionType, VerifiedAssertion};
use tariff_core::types::program::{Metal, ProgramId};
use tariff_core::types::review::NeedsReviewEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateFailureReason {
    DocumentMissing,
    DocumentNotTierA,
    ChunkMissing,
    QuoteNotVerbatim,
    ValidatorRejected,
    NoCitations,
}

impl GateFailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentMissing => "document_missing",
            Self::DocumentNotTierA => "document_not_tier_a",
            Self::ChunkMissing => "chunk_missing",
            Self::QuoteNotVerbatim => "quote_not_verbatim",
            Self::ValidatorRejected => "validator_rejected",
            Self::NoCitations => "write_gate_failed",
        }
    }
}

pub struct WriteGateInput<'a> {
    pub program_id: ProgramId,
    pub hts_code_norm: &'a str,
    pub hts_digits: u8,
    pub material: Option<Metal>,
    pub assertion_type: AssertionType,
    pub effective_start: NaiveDate,
    pub reader_output: &'a ReaderOutput,
    pub validator_output: &'a ValidatorOutput,
    /// Minimum distinct documents across citations before the
    /// diversity check becomes a (non-blocking) warning (spec.md §4.6
    /// item 7).
    pub min_citation_document_diversity: usize,
}

pub enum GateOutcome {
    Admitted(VerifiedAssertion),
    Rejected {
        reason: GateFailureReason,
        details: String,
        review_entry: NeedsReviewEntry,
    },
}

/// Runs the seven mechanical checks of spec.md §4.6 and, on pass,
/// writes the assertion through `assertion_cache` with SCD-2 closure;
/// on fail, enqueues the attempt to `review_queue`.
pub fn run_write_gate(
    input: WriteGateInput<'_>,
    document_store: &dyn IDocumentStore,
    assertion_cache: &dyn IAssertionCache,
    review_queue: &dyn IReviewQueue,
) -> Result<GateOutcome, tariff_core::errors::StorageError> {
    let (reader_success, validator_success) = match (input.reader_output, input.validator_output) {
        (ReaderOutput::Success(r), ValidatorOutput::Success(v)) => (r, v),
        _ => {
            let entry = build_review_entry(&input, GateFailureReason::NoCitations, "reader or validator call failed".to_string());
            review_queue.enqueue(entry.clone())?;
            return Ok(GateOutcome::Rejected {
                reason: GateFailureReason::NoCitations,
                details: "reader or validator call failed".to_string(),
                review_entry: entry,
            });
        }
    };
    let citations = &reader_success.citations;

    if citations.is_empty() {
        return reject(&input, GateFailureReason::NoCitations, "no citations provided".to_string(), review_queue);
    }

    for citation in citations {
        match check_citation(citation, document_store)? {
            Some((reason, details)) => return reject(&input, reason, details, review_queue),
            None => continue,
        }
    }

    if !validator_success.verified {
        return reject(
            &input,
            GateFailureReason::ValidatorRejected,
            format!("validator reported {} failure(s)", validator_success.failures.len()),
            review_queue,
        );
    }

    let distinct_documents: std::collections::HashSet<&str> = citations.iter().map(|c| c.document_id.as_str()).collect();
    if distinct_documents.len() < input.min_citation_document_diversity {
        tracing::warn!(
            hts = input.hts_code_norm,
            program = %input.program_id,
            distinct = distinct_documents.len(),
            "citation document diversity below threshold (warning only)"
        );
    }

    let primary = &citations[0];
    let evidence_quote_hash = hex_sha256(primary.quote.as_bytes());
    let assertion = VerifiedAssertion {
        id: uuid::Uuid::new_v4().to_string(),
        program_id: input.program_id,
        hts_code_norm: input.hts_code_norm.to_string(),
        hts_digits: input.hts_digits,
        material: input.material,
        assertion_type: input.assertion_type,
        claim_code: reader_success.answer.claim_codes.first().cloned(),
        disclaim_code: reader_success.answer.disclaim_codes.first().cloned(),
        duty_rate: None,
        effective_start: input.effective_start,
        effective_end: None,
        document_id: primary.document_id.clone(),
        chunk_id: primary.chunk_id.clone(),
        evidence_quote: primary.quote.clone(),
        evidence_quote_hash,
        reader_output: serde_json::to_string(input.reader_output).unwrap_or_default(),
        validator_output: serde_json::to_string(input.validator_output).unwrap_or_default(),
        verified_at: Utc::now(),
        verified_by: "write_gate".to_string(),
    };

    assertion_cache.insert_with_closure(assertion.clone())?;
    Ok(GateOutcome::Admitted(assertion))
}

fn check_citation(citation: &Citation, document_store: &dyn IDocumentStore) -> Result<Option<(GateFailureReason, String)>, tariff_core::errors::StorageError> {
    let Some(document) = document_store.get_document(&citation.document_id)? else {
        return Ok(Some((GateFailureReason::DocumentMissing, format!("document {} not found", citation.document_id))));
    };
    if !document.tier.is_evidence_eligible() {
        return Ok(Some((
            GateFailureReason::DocumentNotTierA,
            format!("document {} is tier {:?}, not A", citation.document_id, document.tier),
        )));
    }
    let Some(chunk) = document_store.get_chunk(&citation.document_id, &citation.chunk_id)? else {
        return Ok(Some((GateFailureReason::ChunkMissing, format!("chunk {} not found on document {}", citation.chunk_id, citation.document_id))));
    };
    if !chunk.text.contains(&citation.quote) {
        return Ok(Some((
            GateFailureReason::QuoteNotVerbatim,
            format!("quote is not a verbatim substring of chunk {}", citation.chunk_id),
        )));
    }
    Ok(None)
}

fn reject(
    input: &WriteGateInput<'_>,
    reason: GateFailureReason,
    details: String,
    review_queue: &dyn IReviewQueue,
) -> Result<GateOutcome, tariff_core::errors::StorageError> {
    let entry = build_review_entry(input, reason.clone(), details.clone());
    review_queue.enqueue(entry.clone())?;
    tracing::warn!(hts = input.hts_code_norm, program = %input.program_id, reason = reason.as_str(), "write gate rejected assertion");
    Ok(GateOutcome::Rejected {
        reason,
        details,
        review_entry: entry,
    })
}

fn build_review_entry(input: &WriteGateInput<'_>, reason: GateFailureReason, details: String) -> NeedsReviewEntry {
    NeedsReviewEntry {
        id: uuid::Uuid::new_v4().to_string(),
        hts_code: input.hts_code_norm.to_string(),
        query_type: input.program_id.as_str().to_string(),
        material: input.material,
        reader_output: serde_json::to_string(input.reader_output).ok(),
        validator_output: serde_json::to_string(input.validator_output).ok(),
        block_reason: reason.as_str().to_string(),
        block_details: details,
        status: tariff_core::types::review::ReviewStatus::Pending,
        priority: 5,
        created_at: Utc::now(),
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
