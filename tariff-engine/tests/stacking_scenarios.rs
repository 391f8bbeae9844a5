//! End-to-end stacking scenarios (spec.md §8) not already covered by the
//! unit tests in `src/stacking.rs`: the alternate-materials split, the
//! Note 20(vvv)(i) exclusion path, and the quantified invariants as
//! property tests.

use std::collections::HashMap;

use proptest::prelude::*;

use tariff_core::traits::evidence_store::IAssertionCache;
use tariff_core::traits::tariff_store::ITariffStore;
use tariff_core::types::exclusion::{EffectiveWindow, ExclusionClaim, HtsConstraints};
use tariff_core::types::hts::{HtsCode, ScopeHtsType};
use tariff_core::types::measure::{ArticleType, MeasureRole, RateStatus, TariffMeasure};
use tariff_core::types::money::Money;
use tariff_core::types::program::{CountryScope, Metal, ProgramId};
use tariff_engine::section301::Section301CountryPolicy;
use tariff_engine::stacking::{calculate_duty, StackingRequest};
use tariff_storage::TariffStorageEngine;

fn seed_usb_c_cable(engine: &TariffStorageEngine) {
    let hts = "8536904000";
    let measures = [
        (ProgramId::Section232Copper, "9903.78.01", 0.50),
        (ProgramId::Section232Steel, "9903.81.87", 0.50),
        (ProgramId::Section232Aluminum, "9903.85.04", 0.25),
        (ProgramId::Section301Note20, "9903.88.01", 0.25),
    ];
    for (i, (program_id, heading, rate)) in measures.iter().enumerate() {
        engine
            .insert_measure(TariffMeasure {
                id: format!("m{i}"),
                program_id: *program_id,
                ch99_heading: heading.to_string(),
                scope_hts_type: ScopeHtsType::Hts10,
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

    for (id, program_id, heading) in [
        ("fentanyl-cn", ProgramId::IeepaFentanyl, "9903.01.24"),
        ("reciprocal-cn", ProgramId::IeepaReciprocal, "9903.02.20"),
    ] {
        engine
            .insert_measure(TariffMeasure {
                id: id.into(),
                program_id,
                ch99_heading: heading.into(),
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
        engine.set_program_country_scope(program_id, CountryScope::All).unwrap();
    }
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

/// Scenario 3: `non_metal` = $5,000, so IEEPA Reciprocal and Fentanyl
/// both land on a nonzero base instead of the $300 of scenarios 1-2.
#[test]
fn scenario_3_alternate_material_split() {
    let engine = TariffStorageEngine::open_in_memory().unwrap();
    seed_usb_c_cable(&engine);
    let req = request("CN", &[(Metal::Copper, 3000_00), (Metal::Steel, 1000_00), (Metal::Aluminum, 1000_00)]);

    let result = calculate_duty(&engine, None, &Section301CountryPolicy::default(), 365, "2025-06-01".parse().unwrap(), &req).unwrap();

    let non_metal = result.entries.iter().find(|e| e.slice_type == tariff_core::types::entry::SliceType::NonMetal).unwrap();
    assert_eq!(non_metal.line_value.cents(), 5000_00);
    assert_eq!(result.total_duty.unstacking.remaining_value.cents(), 5000_00);

    let total = result.total_duty.total_duty_amount.cents();
    assert_eq!(total, 2500_00 + 1000_00 + 1500_00 + 500_00 + 250_00 + 500_00);
    assert!((result.total_duty.effective_rate - 0.625).abs() < 1e-9);
}

/// Scenario 4: a filer claiming the Note 20(vvv)(i) exclusion gets the
/// claim heading substituted for the impose heading, with
/// `verification_required` surfaced via the decision log.
#[test]
fn scenario_4_note20_exclusion_claim() {
    let engine = TariffStorageEngine::open_in_memory().unwrap();
    seed_usb_c_cable(&engine);
    engine
        .insert_exclusion(ExclusionClaim {
            exclusion_id: "ex-vvv-i".into(),
            note_bucket: "note_20_vvv_i".into(),
            claim_ch99_heading: "9903.88.69".into(),
            source_heading: "9903.88.01".into(),
            hts_constraints: HtsConstraints {
                hts10_exact: vec!["8536904000".into()],
                hts8_prefix: vec![],
            },
            description_scope_text: "connector assemblies".into(),
            scope_text_hash: "hash".into(),
            effective_window: EffectiveWindow {
                effective_start: "2026-01-01".parse().unwrap(),
                effective_end: None,
            },
            verification_required: true,
        })
        .unwrap();

    let mut req = request("CN", &[(Metal::Copper, 500_00), (Metal::Steel, 2000_00), (Metal::Aluminum, 7200_00)]);
    req.entry_date = "2026-01-15".parse().unwrap();

    let result = calculate_duty(&engine, None, &Section301CountryPolicy::default(), 365, "2026-01-15".parse().unwrap(), &req).unwrap();

    let non_metal = result.entries.iter().find(|e| e.slice_type == tariff_core::types::entry::SliceType::NonMetal).unwrap();
    let claim_line = non_metal.stack.iter().find(|l| l.program_id == ProgramId::Section301Note20).unwrap();
    assert_eq!(claim_line.chapter_99_code, "9903.88.69");
    assert_eq!(claim_line.action, tariff_core::types::entry::Action::Claim);
    assert_eq!(claim_line.duty_amount, Money::ZERO);

    assert!(result
        .decision_log
        .iter()
        .any(|d| matches!(d.source, tariff_core::types::entry::DecisionSource::ExclusionClaim) && d.id == "ex-vvv-i"));
}

fn arb_money_cents() -> impl Strategy<Value = i64> {
    0i64..10_000_000
}

proptest! {
    /// Slice sum and unstacking non-negativity (spec.md §8) hold for any
    /// material split that does not exceed the declared product value.
    #[test]
    fn slice_sum_and_unstacking_hold_for_any_valid_split(
        product_cents in 0i64..10_000_000,
        copper_frac in 0.0f64..1.0,
        steel_frac in 0.0f64..1.0,
        aluminum_frac in 0.0f64..1.0,
    ) {
        let engine = TariffStorageEngine::open_in_memory().unwrap();
        seed_usb_c_cable(&engine);

        // Scale the three fractions down so their sum never exceeds 1.0,
        // keeping every generated case a valid allocation.
        let total_frac = copper_frac + steel_frac + aluminum_frac;
        let scale = if total_frac > 1.0 { 1.0 / total_frac } else { 1.0 };

        let copper = (product_cents as f64 * copper_frac * scale) as i64;
        let steel = (product_cents as f64 * steel_frac * scale) as i64;
        let aluminum = (product_cents as f64 * aluminum_frac * scale) as i64;

        let mut materials = HashMap::new();
        materials.insert(Metal::Copper, Money::from_cents(copper));
        materials.insert(Metal::Steel, Money::from_cents(steel));
        materials.insert(Metal::Aluminum, Money::from_cents(aluminum));

        let req = StackingRequest {
            hts: HtsCode::parse("8536.90.4000").unwrap(),
            country_iso: "CN".to_string(),
            entry_date: "2025-06-01".parse().unwrap(),
            product_value: Money::from_cents(product_cents),
            materials,
        };

        let result = calculate_duty(&engine, None, &Section301CountryPolicy::default(), 365, "2025-06-01".parse().unwrap(), &req).unwrap();

        let slice_sum: Money = result.entries.iter().map(|e| e.line_value).sum();
        prop_assert_eq!(slice_sum, req.product_value);

        let non_metal = result.entries.iter().find(|e| e.slice_type == tariff_core::types::entry::SliceType::NonMetal).unwrap();
        prop_assert!(!non_metal.line_value.is_negative());

        let expected_non_metal = req.product_value.checked_sub(
            Money::from_cents(copper) + Money::from_cents(steel) + Money::from_cents(aluminum),
        );
        prop_assert_eq!(non_metal.line_value, expected_non_metal);
    }

    /// Each material's content value appears in the unstacking audit
    /// exactly once, regardless of the generated split (spec.md §8 "no
    /// double subtraction").
    #[test]
    fn content_deductions_match_input_materials_exactly(cents in arb_money_cents()) {
        let engine = TariffStorageEngine::open_in_memory().unwrap();
        seed_usb_c_cable(&engine);

        let mut materials = HashMap::new();
        materials.insert(Metal::Copper, Money::from_cents(cents / 4));

        let req = StackingRequest {
            hts: HtsCode::parse("8536.90.4000").unwrap(),
            country_iso: "CN".to_string(),
            entry_date: "2025-06-01".parse().unwrap(),
            product_value: Money::from_cents(cents),
            materials,
        };

        let result = calculate_duty(&engine, None, &Section301CountryPolicy::default(), 365, "2025-06-01".parse().unwrap(), &req).unwrap();

        prop_assert_eq!(result.total_duty.unstacking.content_deductions.copper.cents(), cents / 4);
        prop_assert_eq!(result.total_duty.unstacking.content_deductions.steel, Money::ZERO);
        prop_assert_eq!(result.total_duty.unstacking.content_deductions.aluminum, Money::ZERO);
    }
}

/// A no-op assertion cache used to confirm `calculate_duty` accepts the
/// trait object form without a concrete evidence crate in scope.
struct NullAssertionCache;

impl IAssertionCache for NullAssertionCache {
    fn lookup(
        &self,
        _program_id: ProgramId,
        _hts_norm: &str,
        _material: Option<Metal>,
        _assertion_type: tariff_core::types::assertion::AssertionType,
        _as_of: chrono::NaiveDate,
    ) -> Result<Option<tariff_core::types::assertion::VerifiedAssertion>, tariff_core::errors::StorageError> {
        Ok(None)
    }

    fn insert_with_closure(&self, _assertion: tariff_core::types::assertion::VerifiedAssertion) -> Result<(), tariff_core::errors::StorageError> {
        Ok(())
    }
}

#[test]
fn calculate_duty_accepts_an_empty_assertion_cache() {
    let engine = TariffStorageEngine::open_in_memory().unwrap();
    seed_usb_c_cable(&engine);
    let cache = NullAssertionCache;
    let req = request("DE", &[]);

    let result = calculate_duty(&engine, Some(&cache), &Section301CountryPolicy::default(), 365, "2025-06-01".parse().unwrap(), &req).unwrap();
    assert_eq!(result.entries.len(), 1);
}
