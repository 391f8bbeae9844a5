//! Reader + Validator (spec.md §4.5, C6): the Reader answers a scope
//! question from packed chunks; the Validator independently checks the
//! Reader's citations. Both are injected capabilities
//! (`tariff_core::traits::llm::{ReaderClient, ValidatorClient}`); this
//! module holds the mechanical `quick_validate` fast path and
//! deterministic fakes for tests (spec.md §9: "no mocking of global
//! modules at call sites").

use tariff_core::traits::llm::{
    ChunkRef, FailureSeverity, ReaderOutput, ReaderQuestion, ReaderSuccess, ValidationFailure, ValidatorOutput, ValidatorSuccess,
};

/// Mechanical fast-path check (spec.md §4.5): per citation, `document_id`
/// and `chunk_id` must be present and must resolve to one of the
/// supplied `chunks`, `quote` must be a verbatim substring of that
/// chunk's text, and `in_scope=true` implies at least one citation.
/// Returns a `ValidatorSuccess` summarizing every failure found; an
/// empty `failures` list with `verified=true` means the fast path
/// passed outright.
pub fn quick_validate(reader_output: &ReaderOutput, chunks: &[ChunkRef]) -> ValidatorOutput {
    let success = match reader_output {
        ReaderOutput::Success(s) => s,
        ReaderOutput::Failure { error, raw_text } => {
            return ValidatorOutput::Failure {
                error: error.clone(),
                raw_text: raw_text.clone(),
            }
        }
    };

    let mut failures = Vec::new();

    if success.answer.in_scope == Some(true) && success.citations.is_empty() {
        failures.push(ValidationFailure {
            citation_index: 0,
            reason: "in_scope=true requires at least one citation".to_string(),
            severity: FailureSeverity::Error,
        });
    }

    for (index, citation) in success.citations.iter().enumerate() {
        if citation.document_id.is_empty() || citation.chunk_id.is_empty() || citation.quote.is_empty() {
            failures.push(ValidationFailure {
                citation_index: index,
                reason: "citation is missing document_id, chunk_id, or quote".to_string(),
                severity: FailureSeverity::Error,
            });
            continue;
        }
        let chunk = chunks
            .iter()
            .find(|c| c.document_id == citation.document_id && c.chunk_id == citation.chunk_id);
        match chunk {
            Some(c) if c.text.contains(&citation.quote) => {}
            Some(_) => failures.push(ValidationFailure {
                citation_index: index,
                reason: "quote is not a verbatim substring of the referenced chunk".to_string(),
                severity: FailureSeverity::Error,
            }),
            None => failures.push(ValidationFailure {
                citation_index: index,
                reason: "citation references a chunk not present in the packed set".to_string(),
                severity: FailureSeverity::Error,
            }),
        }
    }

    let verified = !failures.iter().any(|f| f.severity == FailureSeverity::Error);
    ValidatorOutput::Success(ValidatorSuccess {
        verified,
        failures,
        required_fixes: Vec::new(),
        confidence: success.answer.confidence,
    })
}

/// Deterministic `ReaderClient`/`ValidatorClient` fakes for tests
/// (spec.md §9). `FakeReaderClient` is seeded with a fixed
/// `ReaderOutput` it returns for every question; `FakeValidatorClient`
/// delegates to `quick_validate` so tests exercise the real mechanical
/// check rather than a second canned answer.
pub mod fakes {
    use super::*;
    use tariff_core::traits::llm::{ReaderClient, ValidatorClient};

    pub struct FakeReaderClient {
        pub output: ReaderOutput,
    }

    impl FakeReaderClient {
        pub fn success(success: ReaderSuccess) -> Self {
            Self {
                output: ReaderOutput::Success(success),
            }
        }
    }

    impl ReaderClient for FakeReaderClient {
        fn ask(&self, _question: &ReaderQuestion) -> ReaderOutput {
            self.output.clone()
        }
    }

    pub struct FakeValidatorClient;

    impl ValidatorClient for FakeValidatorClient {
        fn validate(&self, reader_output: &ReaderOutput, chunks: &[ChunkRef]) -> ValidatorOutput {
            quick_validate(reader_output, chunks)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariff_core::traits::llm::{Citation, Confidence, ReaderAnswer};

    fn chunk(document_id: &str, chunk_id: &str, text: &str) -> ChunkRef {
        ChunkRef {
            document_id: document_id.to_string(),
            chunk_id: chunk_id.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn passes_when_quote_is_verbatim() {
        let chunks = vec![chunk("d1", "c1", "Copper articles are subject to Section 232 duties.")];
        let output = ReaderOutput::Success(ReaderSuccess {
            answer: ReaderAnswer {
                in_scope: Some(true),
                program: "section_232_copper".into(),
                hts_code: "7409210000".into(),
                claim_codes: vec!["9903.78.01".into()],
                disclaim_codes: vec![],
                confidence: Confidence::High,
            },
            citations: vec![Citation {
                document_id: "d1".into(),
                chunk_id: "c1".into(),
                quote: "Copper articles are subject to Section 232 duties.".into(),
                why_this_supports: "direct statement".into(),
            }],
            missing_info: vec![],
            contradictions: vec![],
        });
        match quick_validate(&output, &chunks) {
            ValidatorOutput::Success(s) => assert!(s.verified),
            ValidatorOutput::Failure { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn fails_when_quote_is_not_verbatim() {
        let chunks = vec![chunk("d1", "c1", "Copper articles are subject to Section 232 duties.")];
        let output = ReaderOutput::Success(ReaderSuccess {
            answer: ReaderAnswer {
                in_scope: Some(true),
                program: "section_232_copper".into(),
                hts_code: "7409210000".into(),
                claim_codes: vec![],
                disclaim_codes: vec![],
                confidence: Confidence::Medium,
            },
            citations: vec![Citation {
                document_id: "d1".into(),
                chunk_id: "c1".into(),
                quote: "Copper is completely exempt from all duties.".into(),
                why_this_supports: "fabricated".into(),
            }],
            missing_info: vec![],
            contradictions: vec![],
        });
        match quick_validate(&output, &chunks) {
            ValidatorOutput::Success(s) => assert!(!s.verified),
            ValidatorOutput::Failure { .. } => panic!("expected a Success wrapping failures"),
        }
    }
}
