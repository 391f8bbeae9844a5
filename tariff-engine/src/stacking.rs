//! The Stacking Engine (spec.md §4.9, C9) — the deterministic duty
//! calculator and slice builder. Given an entry's HTS, country, date,
//! declared value, and optional material composition, this produces the
//! ordered list of ACE filing entries the Section 232/301/IEEPA regimes
//! require.

use std::collections::HashMap;

use chrono::NaiveDate;

use tariff_core::traits::evidence_store::IAssertionCache;
use tariff_core::traits::tariff_store::ITariffStore;
use tariff_core::types::entry::{
    Action, ContentDeductions, DecisionLogItem, DecisionSource, DutyCalculationResult, Entry, SliceType, StackLine, TotalDuty, UnstackingAudit,
};
use tariff_core::types::hts::HtsCode;
use tariff_core::types::money::Money;
use tariff_core::types::program::{Metal, ProgramId};

use crate::errors::EngineError;
use crate::section301::{self, Section301CountryPolicy, Section301Outcome};
use crate::temporal_store::lookup_current_measures;

/// Reciprocal/Fentanyl Chapter-99 exempt-line variants (spec.md §4.9
/// Step 4). These programs are scoped per-country rather than per-HTS,
/// so they consult `TariffMeasure` rows whose `scope_hts_value` holds
/// the ISO alpha-2 country code in place of an HTS scope (see
/// `lookup_country_scoped_measure` below and DESIGN.md).
const RECIPROCAL_METAL_EXEMPT_HEADING: &str = "9903.01.32";
const RECIPROCAL_ANNEX_II_EXEMPT_HEADING: &str = "9903.01.33";

#[derive(Debug, Clone)]
pub struct StackingRequest {
    pub hts: HtsCode,
    pub country_iso: String,
    pub entry_date: NaiveDate,
    pub product_value: Money,
    pub materials: HashMap<Metal, Money>,
}

struct Slice {
    slice_type: SliceType,
    line_value: Money,
}

/// Computes the full duty calculation for one entry (spec.md §4.9 Steps
/// 1-6). `today` is injected for the Section-301 future-date guard so
/// the whole pipeline stays deterministic under test.
pub fn calculate_duty(
    store: &dyn ITariffStore,
    assertion_cache: Option<&dyn IAssertionCache>,
    section301_policy: &Section301CountryPolicy,
    section301_future_horizon_days: i64,
    today: NaiveDate,
    request: &StackingRequest,
) -> Result<DutyCalculationResult, EngineError> {
    let mut decision_log: Vec<DecisionLogItem> = Vec::new();

    // Step 1: applicable programs, already sorted by filing_sequence.
    let hts8 = request.hts.hts8();
    let hts10 = request.hts.hts10();
    let applicable = store.program_applicability(&request.country_iso, hts8.as_deref(), hts10.as_deref(), request.entry_date)?;

    // Step 2: slice construction.
    let slices = build_slices(&applicable, request)?;

    // Step 3: IEEPA unstacking audit. Only the `non_metal` slice is
    // subject to IEEPA Reciprocal; 232-covered content is exempt.
    let non_metal_value = slices
        .iter()
        .find(|s| s.slice_type == SliceType::NonMetal)
        .map(|s| s.line_value)
        .unwrap_or(Money::ZERO);
    let unstacking = UnstackingAudit {
        initial_value: request.product_value,
        content_deductions: ContentDeductions {
            copper: request.materials.get(&Metal::Copper).copied().unwrap_or(Money::ZERO),
            steel: request.materials.get(&Metal::Steel).copied().unwrap_or(Money::ZERO),
            aluminum: request.materials.get(&Metal::Aluminum).copied().unwrap_or(Money::ZERO),
        },
        remaining_value: non_metal_value,
    };

    // Section 301 is evaluated once: it applies identically, at each
    // slice's own value, regardless of which slice it lands on.
    let section301_outcome = section301::evaluate(
        store,
        assertion_cache,
        section301_policy,
        &request.hts,
        &request.country_iso,
        request.entry_date,
        today,
        section301_future_horizon_days,
    )?;
    if let Section301Outcome::Applicable(ref decision) = section301_outcome {
        decision_log.push(DecisionLogItem {
            source: decision.decision_source,
            id: decision.consulted_id.clone(),
        });
        if let Some(exclusion_id) = &decision.exclusion_id {
            decision_log.push(DecisionLogItem {
                source: DecisionSource::ExclusionClaim,
                id: exclusion_id.clone(),
            });
        }
    }

    let annex_ii_exempt = store
        .lookup_exclusions(hts8.as_deref(), hts10.as_deref(), request.entry_date)?
        .into_iter()
        .filter(|e| e.note_bucket == "annex_ii")
        .any(|e| e.applies(hts8.as_deref(), hts10.as_deref(), request.entry_date));

    // Step 4: per-slice stack composition.
    let mut entries = Vec::with_capacity(slices.len());
    for slice in &slices {
        let mut stack = Vec::new();

        for program_id in &applicable {
            if !program_id.is_section_232() {
                continue;
            }
            let metal = program_id.metal().expect("section_232 program always has a metal");
            if matches!(slice.slice_type, SliceType::Metal(m) if m == metal) {
                let measures = lookup_current_measures(store, *program_id, &request.hts, request.entry_date)?;
                if let Some(measure) = measures.first() {
                    decision_log.push(DecisionLogItem {
                        source: DecisionSource::TariffMeasure,
                        id: measure.id.clone(),
                    });
                    stack.push(StackLine::new(*program_id, measure.ch99_heading.clone(), Action::Claim, slice.line_value, measure.additional_rate));
                }
            } else {
                match program_id.disclaim_behavior() {
                    tariff_core::types::program::DisclaimBehavior::Required => {
                        let measures = lookup_current_measures(store, *program_id, &request.hts, request.entry_date)?;
                        let heading = measures.first().map(|m| m.ch99_heading.clone()).unwrap_or_default();
                        stack.push(StackLine::new(*program_id, heading, Action::Disclaim, Money::ZERO, 0.0));
                    }
                    tariff_core::types::program::DisclaimBehavior::Omit | tariff_core::types::program::DisclaimBehavior::None => {}
                }
            }
        }

        if let Section301Outcome::Applicable(decision) = &section301_outcome {
            let action = if decision.excluded { Action::Claim } else { Action::Apply };
            stack.push(StackLine::new(decision.program_id, decision.ch99_heading.clone(), action, slice.line_value, decision.duty_rate));
        }

        if slice.slice_type == SliceType::NonMetal {
            if applicable.contains(&ProgramId::IeepaFentanyl) {
                if let Some(measure) = lookup_country_scoped_measure(store, ProgramId::IeepaFentanyl, &request.country_iso, request.entry_date)? {
                    decision_log.push(DecisionLogItem {
                        source: DecisionSource::TariffMeasure,
                        id: measure.id.clone(),
                    });
                    // Fentanyl's duty base is the full entry value, not
                    // this slice's own value, even though the line is
                    // recorded on the `non_metal` entry (spec.md §4.9
                    // Step 4: "applies to the full entry value").
                    stack.push(StackLine::new(ProgramId::IeepaFentanyl, measure.ch99_heading, Action::Apply, request.product_value, measure.additional_rate));
                }
            }

            if applicable.contains(&ProgramId::IeepaReciprocal) {
                if annex_ii_exempt {
                    stack.push(StackLine::new(ProgramId::IeepaReciprocal, RECIPROCAL_ANNEX_II_EXEMPT_HEADING, Action::Exempt, slice.line_value, 0.0));
                } else if let Some(measure) = lookup_country_scoped_measure(store, ProgramId::IeepaReciprocal, &request.country_iso, request.entry_date)? {
                    decision_log.push(DecisionLogItem {
                        source: DecisionSource::TariffMeasure,
                        id: measure.id.clone(),
                    });
                    stack.push(StackLine::new(ProgramId::IeepaReciprocal, measure.ch99_heading, Action::Paid, slice.line_value, measure.additional_rate));
                }
            }
        } else if applicable.contains(&ProgramId::IeepaReciprocal) {
            let heading = if annex_ii_exempt { RECIPROCAL_ANNEX_II_EXEMPT_HEADING } else { RECIPROCAL_METAL_EXEMPT_HEADING };
            stack.push(StackLine::new(ProgramId::IeepaReciprocal, heading, Action::Exempt, slice.line_value, 0.0));
        }

        // Base HTS line: always the final line of each entry. No
        // separate MFN base-rate table exists in this corpus, so the
        // base rate is carried as 0.0 (see DESIGN.md); the worked
        // scenarios in spec.md §8 are consistent with a zero base rate.
        stack.push(StackLine::new(
            ProgramId::BaseMfn,
            request.hts.digits().to_string(),
            Action::Apply,
            slice.line_value,
            0.0,
        ));

        entries.push(Entry {
            slice_type: slice.slice_type,
            line_value: slice.line_value,
            stack,
        });
    }

    let slice_sum: Money = entries.iter().map(|e| e.line_value).sum();
    if slice_sum != request.product_value {
        return Err(EngineError::SliceSumMismatch {
            computed_cents: slice_sum.cents(),
            expected_cents: request.product_value.cents(),
        });
    }

    let total_duty_amount: Money = entries.iter().map(|e| e.total()).sum();
    let effective_rate = if request.product_value.cents() == 0 {
        0.0
    } else {
        total_duty_amount.cents() as f64 / request.product_value.cents() as f64
    };

    Ok(DutyCalculationResult {
        entries,
        total_duty: TotalDuty {
            total_duty_amount,
            effective_rate,
            unstacking,
        },
        decision_log,
    })
}

/// Step 2 of spec.md §4.9: material slices plus the remainder.
fn build_slices(applicable: &[ProgramId], request: &StackingRequest) -> Result<Vec<Slice>, EngineError> {
    let mut slices = Vec::new();
    let mut total_content = Money::ZERO;

    for metal in Metal::all() {
        let content_value = request.materials.get(metal).copied().unwrap_or(Money::ZERO);
        if content_value.cents() > 0 && applicable.contains(&metal.program()) {
            slices.push(Slice {
                slice_type: SliceType::Metal(*metal),
                line_value: content_value,
            });
            total_content = total_content + content_value;
        }
    }

    let non_metal_value = request.product_value.checked_sub(total_content);
    if non_metal_value.is_negative() {
        return Err(EngineError::InvalidMaterialAllocation {
            reason: format!(
                "material content values ({} cents) exceed declared product value ({} cents)",
                total_content.cents(),
                request.product_value.cents()
            ),
        });
    }

    slices.insert(
        0,
        Slice {
            slice_type: SliceType::NonMetal,
            line_value: non_metal_value,
        },
    );

    Ok(slices)
}

/// Looks up a country-scoped `TariffMeasure` for programs whose
/// Chapter-99 heading and rate vary by country of origin rather than by
/// HTS scope (IEEPA Fentanyl, IEEPA Reciprocal). These rows carry the
/// ISO alpha-2 country code in `scope_hts_value` under `ScopeHtsType::Hts8`;
/// see DESIGN.md for why this reuses the HTS scope slot instead of
/// adding a country-keyed column to `TariffMeasure`.
fn lookup_country_scoped_measure(
    store: &dyn ITariffStore,
    program_id: ProgramId,
    country_iso: &str,
    entry_date: NaiveDate,
) -> Result<Option<tariff_core::types::measure::TariffMeasure>, EngineError> {
    let measures = store.lookup_measures(program_id, Some(country_iso), None, entry_date)?;
    Ok(measures.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariff_core::types::hts::ScopeHtsType;
    use tariff_core::types::measure::{ArticleType, MeasureRole, RateStatus, TariffMeasure};
    use tariff_core::types::program::CountryScope;
    use tariff_storage::TariffStorageEngine;

    fn seed_usb_c_cable(engine: &TariffStorageEngine) {
        let hts = "8536904000";
        let measures = [
            (ProgramId::Section232Copper, "9903.78.01", 0.50, ScopeHtsType::Hts10),
            (ProgramId::Section232Steel, "9903.81.87", 0.50, ScopeHtsType::Hts10),
            (ProgramId::Section232Aluminum, "9903.85.04", 0.25, ScopeHtsType::Hts10),
            (ProgramId::Section301Note20, "9903.88.01", 0.25, ScopeHtsType::Hts10),
        ];
        for (i, (program_id, heading, rate, scope_type)) in measures.iter().enumerate() {
            engine
                .insert_measure(TariffMeasure {
                    id: format!("m{i}"),
                    program_id: *program_id,
                    ch99_heading: heading.to_string(),
                    scope_hts_type: *scope_type,
                    scope_hts_value: hts.to_string(),
                    effective_start: "2024-01-01".parse().unwrap(),
                    effective_end: None,
                    additional_rate: *rate,
                    rate_status: RateStatus::Confirmed,
                    role: MeasureRole::Impose,
                    article_type: ArticleType::Derivative,
                    source_version_id: "v1".into(),
                    supersedes_id: None,
                    superseded_by_id: None,
                })
                .unwrap();
            if program_id.is_section_232() {
                engine.set_program_country_scope(*program_id, CountryScope::All).unwrap();
            }
        }

        engine
            .insert_measure(TariffMeasure {
                id: "fentanyl-cn".into(),
                program_id: ProgramId::IeepaFentanyl,
                ch99_heading: "9903.01.24".into(),
                scope_hts_type: ScopeHtsType::Hts8,
                scope_hts_value: "CN".into(),
                effective_start: "2024-01-01".parse().unwrap(),
                effective_end: None,
                additional_rate: 0.10,
                rate_status: RateStatus::Confirmed,
                role: MeasureRole::Impose,
                article_type: ArticleType::Primary,
                source_version_id: "v1".into(),
                supersedes_id: None,
                superseded_by_id: None,
            })
            .unwrap();
        engine.set_program_country_scope(ProgramId::IeepaFentanyl, CountryScope::All).unwrap();

        engine
            .insert_measure(TariffMeasure {
                id: "reciprocal-cn".into(),
                program_id: ProgramId::IeepaReciprocal,
                ch99_heading: "9903.02.20".into(),
                scope_hts_type: ScopeHtsType::Hts8,
                scope_hts_value: "CN".into(),
                effective_start: "2024-01-01".parse().unwrap(),
                effective_end: None,
                additional_rate: 0.10,
                rate_status: RateStatus::Confirmed,
                role: MeasureRole::Impose,
                article_type: ArticleType::Primary,
                source_version_id: "v1".into(),
                supersedes_id: None,
                superseded_by_id: None,
            })
            .unwrap();
        engine.set_program_country_scope(ProgramId::IeepaReciprocal, CountryScope::All).unwrap();
        engine.set_program_country_scope(ProgramId::Section301Note20, CountryScope::Allowlist(vec!["CN".into()])).unwrap();
    }

    fn request(country: &str, materials: &[(Metal, i64)]) -> StackingRequest {
        StackingRequest {
            hts: HtsCode::parse("8536.90.4000").unwrap(),
            country_iso: country.to_string(),
            entry_date: "2025-06-01".parse().unwrap(),
            product_value: Money::from_cents(10_000_00),
            materials: materials.iter().map(|(m, c)| (*m, Money::from_cents(*c))).collect(),
        }
    }

    #[test]
    fn scenario_1_china_full_materials() {
        let engine = TariffStorageEngine::open_in_memory().unwrap();
        seed_usb_c_cable(&engine);
        let req = request("CN", &[(Metal::Copper, 500_00), (Metal::Steel, 2000_00), (Metal::Aluminum, 7200_00)]);

        let result = calculate_duty(&engine, None, &Section301CountryPolicy::default(), 365, "2025-06-01".parse().unwrap(), &req).unwrap();

        assert_eq!(result.entries.len(), 4);
        let slice_sum: Money = result.entries.iter().map(|e| e.line_value).sum();
        assert_eq!(slice_sum, req.product_value);

        let non_metal = result.entries.iter().find(|e| e.slice_type == SliceType::NonMetal).unwrap();
        assert_eq!(non_metal.line_value.cents(), 300_00);
    }

    #[test]
    fn scenario_2_germany_no_301_no_ieepa() {
        let engine = TariffStorageEngine::open_in_memory().unwrap();
        seed_usb_c_cable(&engine);
        let req = request("DE", &[(Metal::Copper, 500_00), (Metal::Steel, 2000_00), (Metal::Aluminum, 7200_00)]);

        let result = calculate_duty(&engine, None, &Section301CountryPolicy::default(), 365, "2025-06-01".parse().unwrap(), &req).unwrap();

        let total: i64 = result.entries.iter().map(|e| e.total().cents()).sum();
        assert_eq!(total, 250_00 + 1000_00 + 1800_00);
    }

    #[test]
    fn invalid_material_allocation_when_content_exceeds_value() {
        let engine = TariffStorageEngine::open_in_memory().unwrap();
        seed_usb_c_cable(&engine);
        let req = request("CN", &[(Metal::Copper, 6000_00), (Metal::Steel, 3000_00), (Metal::Aluminum, 3000_00)]);

        let err = calculate_duty(&engine, None, &Section301CountryPolicy::default(), 365, "2025-06-01".parse().unwrap(), &req).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMaterialAllocation { .. }));
    }
}
