//! The Temporal Tariff Store contract (spec.md §4.1, C1), consumed by
//! the Stacking Engine and Section-301 Evaluator, implemented by
//! `tariff-storage`.

use chrono::NaiveDate;

use crate::errors::StorageError;
use crate::types::country::CountryMapping;
use crate::types::exclusion::ExclusionClaim;
use crate::types::measure::TariffMeasure;
use crate::types::program::{CountryScope, ProgramId};

/// Given `(program_id, hts_code, entry_date)`, returns the applicable
/// `TariffMeasure` rows in precedence order: HTS10 before HTS8, and
/// within a bucket, latest `effective_start` first (spec.md §4.1).
pub trait ITariffStore: Send + Sync {
    fn lookup_measures(
        &self,
        program_id: ProgramId,
        hts8: Option<&str>,
        hts10: Option<&str>,
        entry_date: NaiveDate,
    ) -> Result<Vec<TariffMeasure>, StorageError>;

    /// Insert a new measure as a transaction, closing any prior current
    /// row for the same `(program, scope)` by setting its
    /// `effective_end` (spec.md §4.1 "Insertion (supersession)").
    fn insert_measure(&self, measure: TariffMeasure) -> Result<(), StorageError>;

    fn lookup_exclusions(
        &self,
        hts8: Option<&str>,
        hts10: Option<&str>,
        as_of: NaiveDate,
    ) -> Result<Vec<ExclusionClaim>, StorageError>;

    fn insert_exclusion(&self, exclusion: ExclusionClaim) -> Result<(), StorageError>;

    fn lookup_country_mapping(
        &self,
        ch99_country_heading: &str,
        as_of: NaiveDate,
    ) -> Result<Option<CountryMapping>, StorageError>;

    fn lookup_country_iso(&self, census_code: &str, as_of: NaiveDate) -> Result<Option<CountryMapping>, StorageError>;

    fn program_applicability(
        &self,
        country_iso: &str,
        hts8: Option<&str>,
        hts10: Option<&str>,
        entry_date: NaiveDate,
    ) -> Result<Vec<ProgramId>, StorageError>;

    /// Test/seeding hook: install the country-scope row for a program.
    fn set_program_country_scope(&self, program_id: ProgramId, scope: CountryScope) -> Result<(), StorageError>;
}
