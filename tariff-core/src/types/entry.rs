//! Output types of the Stacking Engine (spec.md §4.9, §6): the ordered
//! list of ACE `Entry` objects, each carrying a `stack` of `StackLine`s.

use serde::{Deserialize, Serialize};

use crate::types::money::Money;
use crate::types::program::{Metal, ProgramId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceType {
    NonMetal,
    Metal(Metal),
}

impl SliceType {
    pub fn label(self) -> String {
        match self {
            Self::NonMetal => "non_metal".to_string(),
            Self::Metal(m) => format!("{}_slice", m.as_str()),
        }
    }
}

/// The ACE filing action for one `StackLine` (spec.md Glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Apply,
    Claim,
    Disclaim,
    Paid,
    Exempt,
}

impl Action {
    /// Actions that carry a nonzero duty (spec.md §4.9 Step 5).
    pub fn carries_duty(self) -> bool {
        matches!(self, Self::Apply | Self::Claim | Self::Paid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackLine {
    pub program_id: ProgramId,
    pub chapter_99_code: String,
    pub action: Action,
    pub duty_rate: f64,
    pub duty_amount: Money,
}

impl StackLine {
    pub fn new(program_id: ProgramId, chapter_99_code: impl Into<String>, action: Action, line_value: Money, duty_rate: f64) -> Self {
        let duty_amount = if action.carries_duty() {
            line_value.apply_rate(duty_rate)
        } else {
            Money::ZERO
        };
        Self {
            program_id,
            chapter_99_code: chapter_99_code.into(),
            action,
            duty_rate,
            duty_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub slice_type: SliceType,
    pub line_value: Money,
    pub stack: Vec<StackLine>,
}

impl Entry {
    pub fn total(&self) -> Money {
        self.stack.iter().map(|l| l.duty_amount).sum()
    }
}

/// The audit record required by spec.md §4.9 Step 3: the IEEPA
/// unstacking calculation, recorded for the decision log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnstackingAudit {
    pub initial_value: Money,
    pub content_deductions: ContentDeductions,
    pub remaining_value: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentDeductions {
    pub copper: Money,
    pub steel: Money,
    pub aluminum: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalDuty {
    pub total_duty_amount: Money,
    pub effective_rate: f64,
    pub unstacking: UnstackingAudit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    TariffMeasure,
    ExclusionClaim,
    VerifiedAssertion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLogItem {
    pub source: DecisionSource,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyCalculationResult {
    pub entries: Vec<Entry>,
    pub total_duty: TotalDuty,
    pub decision_log: Vec<DecisionLogItem>,
}

impl DutyCalculationResult {
    pub fn engine_total(&self) -> Money {
        self.entries.iter().map(|e| e.total()).sum()
    }
}
