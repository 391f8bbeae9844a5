//! Evidence-pipeline storage contracts: Document Store (C2), Verified
//! Assertion Cache (C8), Review Queue (C11). Implemented by
//! `tariff-evidence`, backed by `tariff-storage`.

use chrono::NaiveDate;

use crate::errors::StorageError;
use crate::types::assertion::{AssertionType, VerifiedAssertion};
use crate::types::document::{Document, DocumentChunk};
use crate::types::program::{Metal, ProgramId};
use crate::types::review::{NeedsReviewEntry, ReviewStatus};

pub trait IDocumentStore: Send + Sync {
    /// Insert a document. Enforces uniqueness on `(source,
    /// canonical_id)` (spec.md §3, §8 "Idempotent ingestion") — returns
    /// the existing id instead of inserting a duplicate.
    fn upsert_document(&self, document: Document) -> Result<String, StorageError>;

    fn get_document(&self, id: &str) -> Result<Option<Document>, StorageError>;

    fn find_by_source_canonical_id(
        &self,
        source: &str,
        canonical_id: &str,
    ) -> Result<Option<Document>, StorageError>;

    /// Insert a document's chunks in a single transaction so that
    /// `(document_id, chunk_index)` uniqueness cannot be violated by a
    /// partial replay (spec.md §5).
    fn replace_chunks(&self, document_id: &str, chunks: Vec<DocumentChunk>) -> Result<(), StorageError>;

    fn get_chunks(&self, document_id: &str) -> Result<Vec<DocumentChunk>, StorageError>;

    fn get_chunk(&self, document_id: &str, chunk_id: &str) -> Result<Option<DocumentChunk>, StorageError>;

    /// All document ids, oldest first. Backs the `reindex-chunks` and
    /// `stats` admin commands (spec.md §6).
    fn list_document_ids(&self) -> Result<Vec<String>, StorageError>;

    fn count_documents(&self) -> Result<i64, StorageError>;
}

pub trait IAssertionCache: Send + Sync {
    /// Point-in-time lookup (spec.md §4.7): returns the current row
    /// (`effective_end` null or in the future) if one exists.
    fn lookup(
        &self,
        program_id: ProgramId,
        hts_norm: &str,
        material: Option<Metal>,
        assertion_type: AssertionType,
        as_of: NaiveDate,
    ) -> Result<Option<VerifiedAssertion>, StorageError>;

    /// Insert with SCD-2 closure of any overlapping prior assertion for
    /// the same `(program, hts, material, assertion_type)` (spec.md §4.6).
    fn insert_with_closure(&self, assertion: VerifiedAssertion) -> Result<(), StorageError>;
}

pub trait IReviewQueue: Send + Sync {
    fn enqueue(&self, entry: NeedsReviewEntry) -> Result<(), StorageError>;

    fn list(&self, status: Option<ReviewStatus>) -> Result<Vec<NeedsReviewEntry>, StorageError>;

    fn set_status(&self, id: &str, status: ReviewStatus) -> Result<(), StorageError>;
}
