//! Temporal Tariff Store (spec.md §4.1, C1) request-time helpers. The
//! SCD-2 persistence itself lives behind `tariff_core::traits::tariff_store::ITariffStore`,
//! implemented by `tariff-storage`; this module adds the HTS
//! normalisation and country-mapping steps the Stacking Engine and
//! Section-301 Evaluator need on top of the raw lookup.

use chrono::NaiveDate;
use tariff_core::errors::StorageError;
use tariff_core::traits::tariff_store::ITariffStore;
use tariff_core::types::hts::HtsCode;
use tariff_core::types::measure::TariffMeasure;
use tariff_core::types::program::ProgramId;

/// Computes `hts8`/`hts10` from a normalised code (spec.md §4.1 step a)
/// and delegates to the store's precedence-ordered lookup (step c).
pub fn lookup_current_measures(
    store: &dyn ITariffStore,
    program_id: ProgramId,
    hts: &HtsCode,
    entry_date: NaiveDate,
) -> Result<Vec<TariffMeasure>, StorageError> {
    store.lookup_measures(program_id, hts.hts8().as_deref(), hts.hts10().as_deref(), entry_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariff_storage::TariffStorageEngine;
    use tariff_core::types::hts::ScopeHtsType;
    use tariff_core::types::measure::{ArticleType, MeasureRole, RateStatus};

    #[test]
    fn lookup_finds_hts10_measure_by_precision() {
        let engine = TariffStorageEngine::open_in_memory().unwrap();
        let measure = TariffMeasure {
            id: "m1".into(),
            program_id: ProgramId::Section301Note20,
            ch99_heading: "9903.88.69".into(),
            scope_hts_type: ScopeHtsType::Hts10,
            scope_hts_value: "8536904000".into(),
            effective_start: "2024-01-01".parse().unwrap(),
            effective_end: None,
            additional_rate: 0.25,
            rate_status: RateStatus::Confirmed,
            role: MeasureRole::Impose,
            article_type: ArticleType::Primary,
            source_version_id: "v1".into(),
            supersedes_id: None,
            superseded_by_id: None,
        };
        store_measure(&engine, measure);

        let hts = HtsCode::parse("8536.90.4000").unwrap();
        let found = lookup_current_measures(&engine, ProgramId::Section301Note20, &hts, "2025-01-01".parse().unwrap()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ch99_heading, "9903.88.69");
    }

    fn store_measure(engine: &TariffStorageEngine, measure: TariffMeasure) {
        engine.insert_measure(measure).unwrap();
    }
}
