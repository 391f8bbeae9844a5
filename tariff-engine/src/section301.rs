//! Section-301 Evaluator (spec.md §4.8, C10): a deterministic six-step
//! pipeline with no LLM in the path. Consulted by the Stacking Engine
//! once per `(hts, country, entry_date)` and applied identically across
//! every slice of the resulting entry.

use chrono::NaiveDate;

use tariff_core::errors::StorageError;
use tariff_core::traits::evidence_store::IAssertionCache;
use tariff_core::traits::tariff_store::ITariffStore;
use tariff_core::types::assertion::AssertionType;
use tariff_core::types::entry::DecisionSource;
use tariff_core::types::hts::{HtsCode, ScopeHtsType};
use tariff_core::types::measure::{RateStatus, TariffMeasure};
use tariff_core::types::program::ProgramId;

use crate::errors::EngineError;
use crate::temporal_store::lookup_current_measures;

/// Resolves whether a country of origin is routed to China for Section
/// 301 purposes. Hong Kong/Macau routing is policy-dependent and was
/// still being adjusted at the time this corpus was captured (spec.md
/// §9 Open Questions); kept as data a deployment can update rather than
/// a hardcoded match arm.
#[derive(Debug, Clone)]
pub struct Section301CountryPolicy {
    pub china_equivalent_isos: Vec<String>,
}

impl Default for Section301CountryPolicy {
    fn default() -> Self {
        Self {
            china_equivalent_isos: vec!["CN".to_string()],
        }
    }
}

impl Section301CountryPolicy {
    pub fn routes_to_china(&self, country_iso: &str) -> bool {
        self.china_equivalent_isos.iter().any(|c| c.eq_ignore_ascii_case(country_iso))
    }
}

const NOTE_PROGRAMS: [ProgramId; 2] = [ProgramId::Section301Note20, ProgramId::Section301Note31];

/// Outcome of one evaluation. `NotApplicable` is a normal result, not an
/// error (spec.md §7): the country gate failed, or no program matched.
#[derive(Debug, Clone)]
pub enum Section301Outcome {
    NotApplicable,
    Applicable(Section301Decision),
}

#[derive(Debug, Clone)]
pub struct Section301Decision {
    pub program_id: ProgramId,
    pub ch99_heading: String,
    pub duty_rate: f64,
    pub rate_status: RateStatus,
    pub excluded: bool,
    pub exclusion_id: Option<String>,
    pub decision_source: DecisionSource,
    pub consulted_id: String,
}

/// Runs the six-step pipeline of spec.md §4.8. `today` is injected
/// rather than read from the system clock so the future-date guard is
/// deterministic under test.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    store: &dyn ITariffStore,
    assertion_cache: Option<&dyn IAssertionCache>,
    policy: &Section301CountryPolicy,
    hts: &HtsCode,
    country_iso: &str,
    entry_date: NaiveDate,
    today: NaiveDate,
    future_horizon_days: i64,
) -> Result<Section301Outcome, EngineError> {
    // Step 6 is checked early: an entry date past the horizon is
    // rejected outright regardless of what else would have matched.
    let horizon = today + chrono::Duration::days(future_horizon_days);
    if entry_date > horizon {
        return Err(EngineError::FutureDateRejected {
            entry_date: entry_date.to_string(),
        });
    }

    // Step 1: country gate.
    if !policy.routes_to_china(country_iso) {
        return Ok(Section301Outcome::NotApplicable);
    }

    // Step 2: HTS validity. `HtsCode::parse` already rejects malformed
    // codes at construction; this corpus carries no separate
    // `HtsCodeHistory` table of historical code validity windows, so
    // digit-format validity stands in for it here.
    let hts8 = hts.hts8();
    let hts10 = hts.hts10();

    // Step 3: inclusion match across both notes, same precedence rule
    // as the temporal store (§4.1c): HTS10 before HTS8, later
    // `effective_start` first within a bucket.
    let mut candidates: Vec<TariffMeasure> = Vec::new();
    for program_id in NOTE_PROGRAMS {
        candidates.extend(lookup_current_measures(store, program_id, hts, entry_date)?);
    }
    candidates.sort_by(|a, b| {
        let rank = |s: ScopeHtsType| if s == ScopeHtsType::Hts10 { 0 } else { 1 };
        rank(a.scope_hts_type)
            .cmp(&rank(b.scope_hts_type))
            .then(b.effective_start.cmp(&a.effective_start))
    });

    let (program_id, heading, rate, rate_status, measure_id, decision_source) = match candidates.first() {
        Some(m) => (m.program_id, m.ch99_heading.clone(), m.additional_rate, m.rate_status, m.id.clone(), DecisionSource::TariffMeasure),
        None => match lookup_cached_scope(assertion_cache, hts, entry_date) {
            Some((program_id, heading, rate, id)) => (program_id, heading, rate, RateStatus::Pending, id, DecisionSource::VerifiedAssertion),
            None => return Ok(Section301Outcome::NotApplicable),
        },
    };

    // Step 4: exclusion check. Annex-II entries belong to IEEPA
    // Reciprocal, not Section 301, and are filtered out here.
    let exclusions = store.lookup_exclusions(hts8.as_deref(), hts10.as_deref(), entry_date)?;
    let matched_exclusion = exclusions
        .into_iter()
        .filter(|e| e.note_bucket != "annex_ii")
        .find(|e| e.applies(hts8.as_deref(), hts10.as_deref(), entry_date));

    let decision = match matched_exclusion {
        Some(exclusion) => Section301Decision {
            program_id,
            ch99_heading: exclusion.claim_ch99_heading.clone(),
            duty_rate: rate,
            rate_status,
            excluded: true,
            exclusion_id: Some(exclusion.exclusion_id),
            decision_source: DecisionSource::ExclusionClaim,
            consulted_id: measure_id,
        },
        None => Section301Decision {
            program_id,
            ch99_heading: heading,
            duty_rate: rate,
            rate_status,
            excluded: false,
            exclusion_id: None,
            decision_source,
            consulted_id: measure_id,
        },
    };

    Ok(Section301Outcome::Applicable(decision))
}

/// Request-time fallback (spec.md §4.7/§2 data flow: "Stacking Engine
/// ... C8 for cached scope decisions") used only when no `TariffMeasure`
/// row matched: a previously write-gated assertion can still answer the
/// scope question until a rule-enumerated measure is ingested.
fn lookup_cached_scope(assertion_cache: Option<&dyn IAssertionCache>, hts: &HtsCode, as_of: NaiveDate) -> Option<(ProgramId, String, f64, String)> {
    let cache = assertion_cache?;
    for program_id in NOTE_PROGRAMS {
        let result: Result<Option<_>, StorageError> = cache.lookup(program_id, hts.digits(), None, AssertionType::InScope, as_of);
        if let Ok(Some(assertion)) = result {
            let heading = assertion.claim_code.clone().unwrap_or_default();
            return Some((program_id, heading, assertion.duty_rate.unwrap_or(0.0), assertion.id));
        }
    }
    None
}
