//! Ingestion Orchestrator (spec.md §4.3 item c onward, §5, C12): drives
//! connector → document store → chunker → reader → validator → write
//! gate end to end for one question.

use std::time::Duration;

use chrono::NaiveDate;
use tariff_core::errors::EvidenceError;
use tariff_core::traits::blob::BlobBackend;
use tariff_core::traits::evidence_store::{IAssertionCache, IDocumentStore, IReviewQueue};
use tariff_core::traits::llm::{ChunkRef, ReaderClient, ReaderQuestion, ValidatorClient};
use tariff_core::types::document::{Document, DocumentChunk};
use tariff_core::types::program::{Metal, ProgramId};

use crate::blob::content_addressed_key;
use crate::chunker::{chunk_text, ChunkerConfig};
use crate::connectors::{ConnectorResult, TrustedConnector};
use crate::write_gate::{run_write_gate, GateOutcome, WriteGateInput};

/// Calls `connector.fetch_checked` up to `max_attempts` times with
/// exponential backoff (spec.md §7: "`FetchError` ... retried by
/// orchestrator with exponential backoff up to a bounded attempt
/// count"). `UntrustedSource` is never retried — it is surfaced on the
/// first attempt (spec.md §7: "Surfaced to caller; never retried
/// automatically").
fn fetch_with_retry(connector: &dyn TrustedConnector, url: &str, max_attempts: u32, backoff_ms: u64) -> Result<ConnectorResult, EvidenceError> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match connector.fetch_checked(url) {
            Ok(result) => return Ok(result),
            Err(err @ EvidenceError::UntrustedSource { .. }) => return Err(err),
            Err(err) if attempt < max_attempts => {
                let backoff = Duration::from_millis(backoff_ms.saturating_mul(1u64 << (attempt - 1)));
                tracing::warn!(url, attempt, max_attempts, error = %err, "connector fetch failed, retrying after backoff");
                std::thread::sleep(backoff);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Runs one connector fetch through to storage: builds the `Document`
/// row from the `ConnectorResult`, writes the raw bytes to the blob
/// backend under a content-addressed key (spec.md §6: `{source}/
/// {external_id}/{sha256[:16]}{.ext}`), upserts the document (idempotent
/// on `(source, canonical_id)`, spec.md §8), chunks the extracted text,
/// and replaces the document's chunks (spec.md §5: one transaction per
/// document).
pub fn ingest_document(
    connector: &dyn TrustedConnector,
    url: &str,
    chunker_config: &ChunkerConfig,
    document_store: &dyn IDocumentStore,
    blob_backend: &dyn BlobBackend,
    retry_max_attempts: u32,
    retry_backoff_ms: u64,
) -> Result<(String, Vec<DocumentChunk>), EvidenceError> {
    let result = fetch_with_retry(connector, url, retry_max_attempts, retry_backoff_ms)?;
    let canonical_id = result.canonical_id.clone().ok_or_else(|| EvidenceError::ParseError {
        document_id: result.document_id.clone(),
        message: "connector could not extract a canonical id".to_string(),
    })?;

    let blob_key = content_addressed_key(result.source.as_str(), &canonical_id, &result.sha256_raw, ".txt");
    let blob_uri = blob_backend
        .put(&blob_key, result.extracted_text.as_bytes(), "text/plain")
        .map_err(|e| EvidenceError::ParseError {
            document_id: result.document_id.clone(),
            message: format!("blob store write failed: {e}"),
        })?;

    let document = Document {
        id: result.document_id.clone(),
        source: result.source,
        tier: result.tier,
        connector_name: result.connector_name.clone(),
        canonical_id,
        url: result.url.clone(),
        title: None,
        published_at: None,
        effective_start: result.effective_start,
        sha256_raw: result.sha256_raw.clone(),
        storage_uri: blob_uri,
        extracted_text: result.extracted_text.clone(),
        hts_codes_mentioned: result.hts_codes_mentioned.clone(),
        programs_mentioned: result.programs_mentioned.clone(),
        fetch_log: result.fetch_log.clone(),
        extraction_failed: false,
    };

    let document_id = document_store.upsert_document(document)?;
    let chunks = chunk_text(&result.extracted_text, &document_id, chunker_config);
    document_store.replace_chunks(&document_id, chunks.clone())?;

    tracing::info!(document_id, chunks = chunks.len(), "ingested document");
    Ok((document_id, chunks))
}

/// Drives one `(hts, program, material?)` scope question through the
/// cache, then (on a miss) the reader, validator, and write gate
/// (spec.md §4.7: "used as a fast path by request-time scope checks";
/// §5: "each question is handled by one task that issues two LLM calls
/// sequentially"). A cache hit short-circuits straight to
/// `GateOutcome::Admitted` without calling the reader or validator at
/// all.
#[allow(clippy::too_many_arguments)]
pub fn answer_scope_question(
    hts_code_norm: &str,
    hts_digits: u8,
    program_id: ProgramId,
    material: Option<Metal>,
    chunks: Vec<ChunkRef>,
    effective_start: NaiveDate,
    min_citation_document_diversity: usize,
    reader: &dyn ReaderClient,
    validator: &dyn ValidatorClient,
    document_store: &dyn IDocumentStore,
    assertion_cache: &dyn IAssertionCache,
    review_queue: &dyn IReviewQueue,
) -> Result<GateOutcome, tariff_core::errors::StorageError> {
    if let Some(cached) = assertion_cache.lookup(
        program_id,
        hts_code_norm,
        material,
        tariff_core::types::assertion::AssertionType::InScope,
        effective_start,
    )? {
        return Ok(GateOutcome::Admitted(cached));
    }

    let question = ReaderQuestion {
        hts_code: hts_code_norm.to_string(),
        program: program_id.as_str().to_string(),
        material,
        chunks: chunks.clone(),
    };
    let reader_output = reader.ask(&question);
    let validator_output = validator.validate(&reader_output, &chunks);

    run_write_gate(
        WriteGateInput {
            program_id,
            hts_code_norm,
            hts_digits,
            material,
            assertion_type: tariff_core::types::assertion::AssertionType::InScope,
            effective_start,
            reader_output: &reader_output,
            validator_output: &validator_output,
            min_citation_document_diversity,
        },
        document_store,
        assertion_cache,
        review_queue,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Mutex;

    use chrono::Utc;
    use tariff_core::traits::llm::{Citation, Confidence, ReaderAnswer, ReaderSuccess};
    use tariff_core::types::assertion::AssertionType;
    use tariff_core::types::document::{DocumentSource, DocumentTier, FetchLogEntry};
    use tariff_storage::TariffStorageEngine;

    use crate::reader_validator::fakes::{FakeReaderClient, FakeValidatorClient};

    /// A connector whose `fetch_checked` fails with `FetchFailed` for the
    /// first `fail_times` calls, then succeeds, so `fetch_with_retry` can
    /// be exercised without touching the network.
    struct FlakyConnector {
        fail_times: u32,
        calls: Mutex<Cell<u32>>,
    }

    impl TrustedConnector for FlakyConnector {
        fn connector_name(&self) -> &'static str {
            "flaky"
        }
        fn source(&self) -> DocumentSource {
            DocumentSource::Csms
        }
        fn tier(&self) -> DocumentTier {
            DocumentTier::A
        }
        fn trusted_domains(&self) -> &'static [&'static str] {
            &["content.govdelivery.com"]
        }
        fn extract_canonical_id(&self, _text: &str) -> Option<String> {
            Some("CSMS #1".to_string())
        }
        fn extract_effective_date(&self, _text: &str) -> Option<NaiveDate> {
            None
        }
        fn fetch_checked(&self, url: &str) -> Result<ConnectorResult, EvidenceError> {
            let calls = self.calls.lock().unwrap();
            let attempt = calls.get() + 1;
            calls.set(attempt);
            if attempt <= self.fail_times {
                return Err(EvidenceError::FetchFailed {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            Ok(ConnectorResult {
                success: true,
                document_id: "doc-flaky".to_string(),
                source: self.source(),
                tier: self.tier(),
                connector_name: self.connector_name().to_string(),
                canonical_id: Some("CSMS #1".to_string()),
                effective_start: None,
                url: url.to_string(),
                sha256_raw: "abc".to_string(),
                extracted_text: "recovered text".to_string(),
                hts_codes_mentioned: Vec::new(),
                programs_mentioned: Vec::new(),
                fetch_log: vec![FetchLogEntry {
                    retrieved_at: Utc::now(),
                    status_code: 200,
                    content_type: None,
                    content_length: None,
                    response_time_ms: 1,
                }],
                error: None,
            })
        }
    }

    #[test]
    fn fetch_with_retry_succeeds_after_transient_failures() {
        let connector = FlakyConnector {
            fail_times: 2,
            calls: Mutex::new(Cell::new(0)),
        };
        let result = fetch_with_retry(&connector, "https://content.govdelivery.com/x", 5, 1);
        assert!(result.is_ok());
        assert_eq!(*connector.calls.lock().unwrap().get_mut(), 3);
    }

    #[test]
    fn fetch_with_retry_gives_up_after_max_attempts() {
        let connector = FlakyConnector {
            fail_times: 10,
            calls: Mutex::new(Cell::new(0)),
        };
        let result = fetch_with_retry(&connector, "https://content.govdelivery.com/x", 3, 1);
        assert!(matches!(result, Err(EvidenceError::FetchFailed { .. })));
        assert_eq!(*connector.calls.lock().unwrap().get_mut(), 3);
    }

    #[test]
    fn fetch_with_retry_never_retries_untrusted_source() {
        let connector = FlakyConnector {
            fail_times: 10,
            calls: Mutex::new(Cell::new(0)),
        };
        let result = fetch_with_retry(&connector, "https://evil.example.com/x", 5, 1);
        assert!(matches!(result, Err(EvidenceError::UntrustedSource { .. })));
        assert_eq!(*connector.calls.lock().unwrap().get_mut(), 1);
    }

    fn scope_inputs() -> (Vec<ChunkRef>, ReaderSuccess) {
        let chunks = vec![ChunkRef {
            document_id: "doc1".to_string(),
            chunk_id: "doc1:0".to_string(),
            text: "Copper articles are subject to Section 301 duties under 8536.90.4000.".to_string(),
        }];
        let success = ReaderSuccess {
            answer: ReaderAnswer {
                in_scope: Some(true),
                program: "section_301_note20".to_string(),
                hts_code: "8536904000".to_string(),
                claim_codes: vec!["9903.88.01".to_string()],
                disclaim_codes: vec![],
                confidence: Confidence::High,
            },
            citations: vec![Citation {
                document_id: "doc1".to_string(),
                chunk_id: "doc1:0".to_string(),
                quote: "Copper articles are subject to Section 301 duties".to_string(),
                why_this_supports: "direct statement".to_string(),
            }],
            missing_info: vec![],
            contradictions: vec![],
        };
        (chunks, success)
    }

    #[test]
    fn answer_scope_question_checks_cache_before_asking_reader() {
        let engine = TariffStorageEngine::open_in_memory().unwrap();
        let effective_start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let cached = tariff_core::types::assertion::VerifiedAssertion {
            id: "va-1".to_string(),
            program_id: ProgramId::Section301Note20,
            hts_code_norm: "8536904000".to_string(),
            hts_digits: 10,
            material: None,
            assertion_type: AssertionType::InScope,
            claim_code: Some("9903.88.01".to_string()),
            disclaim_code: None,
            duty_rate: None,
            effective_start,
            effective_end: None,
            document_id: "doc1".to_string(),
            chunk_id: "doc1:0".to_string(),
            evidence_quote: "Copper articles are subject to Section 301 duties".to_string(),
            evidence_quote_hash: "hash".to_string(),
            reader_output: "{}".to_string(),
            validator_output: "{}".to_string(),
            verified_at: Utc::now(),
            verified_by: "write_gate".to_string(),
        };
        engine.insert_with_closure(cached.clone()).unwrap();

        let reader = FakeReaderClient::success(scope_inputs().1);
        let validator = FakeValidatorClient;
        let (chunks, _) = scope_inputs();

        let outcome = answer_scope_question(
            "8536904000",
            10,
            ProgramId::Section301Note20,
            None,
            chunks,
            effective_start,
            1,
            &reader,
            &validator,
            &engine,
            &engine,
            &engine,
        )
        .unwrap();

        match outcome {
            GateOutcome::Admitted(assertion) => assert_eq!(assertion.id, cached.id),
            GateOutcome::Rejected { .. } => panic!("expected the cached assertion to short-circuit the gate"),
        }
    }

    #[test]
    fn answer_scope_question_runs_the_gate_on_a_cache_miss() {
        let engine = TariffStorageEngine::open_in_memory().unwrap();
        let effective_start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let (chunks, success) = scope_inputs();
        let reader = FakeReaderClient::success(success);
        let validator = FakeValidatorClient;

        engine
            .upsert_document(Document {
                id: "doc1".to_string(),
                source: DocumentSource::Csms,
                tier: DocumentTier::A,
                connector_name: "csms".to_string(),
                canonical_id: "CSMS #1".to_string(),
                url: "https://content.govdelivery.com/x".to_string(),
                title: None,
                published_at: None,
                effective_start: None,
                sha256_raw: "abc".to_string(),
                storage_uri: "file:///tmp/abc.txt".to_string(),
                extracted_text: chunks[0].text.clone(),
                hts_codes_mentioned: vec![],
                programs_mentioned: vec![],
                fetch_log: vec![],
                extraction_failed: false,
            })
            .unwrap();
        engine
            .replace_chunks(
                "doc1",
                vec![DocumentChunk {
                    id: "doc1:0".to_string(),
                    document_id: "doc1".to_string(),
                    chunk_index: 0,
                    char_start: 0,
                    char_end: chunks[0].text.len(),
                    text: chunks[0].text.clone(),
                    text_hash: "hash".to_string(),
                    embedding_id: None,
                }],
            )
            .unwrap();

        let outcome = answer_scope_question(
            "8536904000",
            10,
            ProgramId::Section301Note20,
            None,
            chunks,
            effective_start,
            1,
            &reader,
            &validator,
            &engine,
            &engine,
            &engine,
        )
        .unwrap();

        match outcome {
            GateOutcome::Admitted(assertion) => {
                assert_eq!(assertion.assertion_type, AssertionType::InScope);
                assert_eq!(assertion.hts_code_norm, "8536904000");
            }
            GateOutcome::Rejected { reason, details, .. } => panic!("expected admission, got {reason:?}: {details}"),
        }
    }
}
