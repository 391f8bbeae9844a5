//! `BatchCommand` — write operations the ingestion pipeline (C12) can
//! batch onto the dedicated writer thread, rather than taking the write
//! lock once per chunk/assertion (spec.md §5).

use tariff_core::types::assertion::VerifiedAssertion;
use tariff_core::types::document::{Document, DocumentChunk};
use tariff_core::types::review::NeedsReviewEntry;

#[derive(Debug)]
pub enum BatchCommand {
    UpsertDocument(Box<Document>),
    ReplaceChunks {
        document_id: String,
        chunks: Vec<DocumentChunk>,
    },
    InsertAssertion(Box<VerifiedAssertion>),
    EnqueueReview(Box<NeedsReviewEntry>),
    /// Flush any pending writes immediately (fire-and-forget).
    Flush,
    /// Flush and signal completion via the provided sender (synchronous).
    FlushSync(std::sync::mpsc::SyncSender<()>),
    /// Shut down the writer thread.
    Shutdown,
}
