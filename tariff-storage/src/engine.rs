//! `TariffStorageEngine` — unified storage engine implementing all of
//! `tariff-core`'s storage traits over one SQLite database.
//!
//! Wraps [`DatabaseManager`] (read/write routing) + [`BatchWriter`]
//! (async batch writes). All synchronous reads and writes go through
//! `DatabaseManager` directly; the batch writer is reserved for the
//! ingestion pipeline's high-volume document/chunk/assertion writes.

use std::path::Path;

use chrono::NaiveDate;
use tariff_core::errors::StorageError;
use tariff_core::traits::evidence_store::{IAssertionCache, IDocumentStore, IReviewQueue};
use tariff_core::traits::tariff_store::ITariffStore;
use tariff_core::types::assertion::{AssertionType, VerifiedAssertion};
use tariff_core::types::country::CountryMapping;
use tariff_core::types::document::{Document, DocumentChunk};
use tariff_core::types::exclusion::ExclusionClaim;
use tariff_core::types::measure::TariffMeasure;
use tariff_core::types::program::{CountryScope, Metal, ProgramId};
use tariff_core::types::review::{NeedsReviewEntry, ReviewStatus};

use crate::batch::BatchWriter;
use crate::connection::DatabaseManager;
use crate::queries;

pub struct TariffStorageEngine {
    db: DatabaseManager,
    batch: BatchWriter,
}

impl TariffStorageEngine {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let db = DatabaseManager::open(path)?;
        let batch_conn = db.open_batch_connection()?;
        let batch = BatchWriter::new(batch_conn);
        Ok(Self { db, batch })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let db = DatabaseManager::open_in_memory()?;
        let batch_conn = db.open_batch_connection()?;
        let batch = BatchWriter::new(batch_conn);
        Ok(Self { db, batch })
    }

    pub fn send_batch(&self, command: crate::batch::BatchCommand) -> Result<(), StorageError> {
        self.batch.send(command)
    }

    pub fn flush_batch_sync(&self) -> Result<(), StorageError> {
        self.batch.flush_sync()
    }

    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.db.checkpoint()
    }

    pub fn path(&self) -> Option<&Path> {
        self.db.path()
    }
}

impl ITariffStore for TariffStorageEngine {
    fn lookup_measures(
        &self,
        program_id: ProgramId,
        hts8: Option<&str>,
        hts10: Option<&str>,
        entry_date: NaiveDate,
    ) -> Result<Vec<TariffMeasure>, StorageError> {
        self.db
            .with_reader(|conn| queries::measures::lookup_measures(conn, program_id, hts8, hts10, entry_date))
    }

    fn insert_measure(&self, measure: TariffMeasure) -> Result<(), StorageError> {
        self.db.with_writer(|conn| queries::measures::insert_measure(conn, &measure))
    }

    fn lookup_exclusions(
        &self,
        hts8: Option<&str>,
        hts10: Option<&str>,
        as_of: NaiveDate,
    ) -> Result<Vec<ExclusionClaim>, StorageError> {
        self.db.with_reader(|conn| queries::exclusions::lookup_candidates(conn, hts8, hts10, as_of))
    }

    fn insert_exclusion(&self, exclusion: ExclusionClaim) -> Result<(), StorageError> {
        self.db.with_writer(|conn| queries::exclusions::insert(conn, &exclusion))
    }

    fn lookup_country_mapping(&self, ch99_country_heading: &str, as_of: NaiveDate) -> Result<Option<CountryMapping>, StorageError> {
        self.db
            .with_reader(|conn| queries::country::lookup_by_ch99_heading(conn, ch99_country_heading, as_of))
    }

    fn lookup_country_iso(&self, census_code: &str, as_of: NaiveDate) -> Result<Option<CountryMapping>, StorageError> {
        self.db.with_reader(|conn| queries::country::lookup_by_census_code(conn, census_code, as_of))
    }

    fn program_applicability(
        &self,
        country_iso: &str,
        hts8: Option<&str>,
        hts10: Option<&str>,
        entry_date: NaiveDate,
    ) -> Result<Vec<ProgramId>, StorageError> {
        self.db
            .with_reader(|conn| queries::program_applicability::applicable_programs(conn, country_iso, hts8, hts10, entry_date))
    }

    fn set_program_country_scope(&self, program_id: ProgramId, scope: CountryScope) -> Result<(), StorageError> {
        self.db
            .with_writer(|conn| queries::program_applicability::set_scope(conn, program_id, "ALL", "ALL", &scope))
    }
}

impl IDocumentStore for TariffStorageEngine {
    fn upsert_document(&self, document: Document) -> Result<String, StorageError> {
        self.db.with_writer(|conn| queries::documents::upsert(conn, &document))
    }

    fn get_document(&self, id: &str) -> Result<Option<Document>, StorageError> {
        self.db.with_reader(|conn| queries::documents::get(conn, id))
    }

    fn find_by_source_canonical_id(&self, source: &str, canonical_id: &str) -> Result<Option<Document>, StorageError> {
        self.db.with_reader(|conn| queries::documents::find_by_source_canonical_id(conn, source, canonical_id))
    }

    fn replace_chunks(&self, document_id: &str, chunks: Vec<DocumentChunk>) -> Result<(), StorageError> {
        self.db.with_writer(|conn| queries::chunks::replace_chunks(conn, document_id, &chunks))
    }

    fn get_chunks(&self, document_id: &str) -> Result<Vec<DocumentChunk>, StorageError> {
        self.db.with_reader(|conn| queries::chunks::get_chunks(conn, document_id))
    }

    fn get_chunk(&self, document_id: &str, chunk_id: &str) -> Result<Option<DocumentChunk>, StorageError> {
        self.db.with_reader(|conn| queries::chunks::get_chunk(conn, document_id, chunk_id))
    }

    fn list_document_ids(&self) -> Result<Vec<String>, StorageError> {
        self.db.with_reader(queries::documents::list_ids)
    }

    fn count_documents(&self) -> Result<i64, StorageError> {
        self.db.with_reader(queries::documents::count)
    }
}

impl IAssertionCache for TariffStorageEngine {
    fn lookup(
        &self,
        program_id: ProgramId,
        hts_norm: &str,
        material: Option<Metal>,
        assertion_type: AssertionType,
        as_of: NaiveDate,
    ) -> Result<Option<VerifiedAssertion>, StorageError> {
        self.db
            .with_reader(|conn| queries::assertions::lookup(conn, program_id, hts_norm, material, assertion_type, as_of))
    }

    fn insert_with_closure(&self, assertion: VerifiedAssertion) -> Result<(), StorageError> {
        self.db.with_writer(|conn| queries::assertions::insert_with_closure(conn, &assertion))
    }
}

impl IReviewQueue for TariffStorageEngine {
    fn enqueue(&self, entry: NeedsReviewEntry) -> Result<(), StorageError> {
        self.db.with_writer(|conn| queries::review::enqueue(conn, &entry))
    }

    fn list(&self, status: Option<ReviewStatus>) -> Result<Vec<NeedsReviewEntry>, StorageError> {
        self.db.with_reader(|conn| queries::review::list(conn, status))
    }

    fn set_status(&self, id: &str, status: ReviewStatus) -> Result<(), StorageError> {
        self.db.with_writer(|conn| queries::review::set_status(conn, id, status))
    }
}
