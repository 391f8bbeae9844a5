//! Tariff programs: Section 232 (per-metal), Section 301 (per-note),
//! IEEPA Fentanyl, and IEEPA Reciprocal. See spec.md §3.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Stable identifier for a tariff program. Kept as a closed enum (rather
/// than a bare string) because every downstream rule in the stacking
/// engine switches on it exhaustively; new programs are added here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramId {
    Section232Copper,
    Section232Steel,
    Section232Aluminum,
    Section301Note20,
    Section301Note31,
    IeepaFentanyl,
    IeepaReciprocal,
    /// Not a Chapter-99 program: the base HTS/MFN line the stacking
    /// engine always appends last to every slice (spec.md §4.9 Step 4
    /// final bullet). Carries a `ProgramId` only so it fits the
    /// `StackLine` shape alongside the real additional-duty programs.
    BaseMfn,
}

impl ProgramId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Section232Copper => "section_232_copper",
            Self::Section232Steel => "section_232_steel",
            Self::Section232Aluminum => "section_232_aluminum",
            Self::Section301Note20 => "section_301_note20",
            Self::Section301Note31 => "section_301_note31",
            Self::IeepaFentanyl => "ieepa_fentanyl",
            Self::IeepaReciprocal => "ieepa_reciprocal",
            Self::BaseMfn => "base_mfn",
        }
    }

    pub fn is_section_232(self) -> bool {
        matches!(
            self,
            Self::Section232Copper | Self::Section232Steel | Self::Section232Aluminum
        )
    }

    pub fn is_section_301(self) -> bool {
        matches!(self, Self::Section301Note20 | Self::Section301Note31)
    }

    /// The metal a Section-232 program governs, if any.
    pub fn metal(self) -> Option<Metal> {
        match self {
            Self::Section232Copper => Some(Metal::Copper),
            Self::Section232Steel => Some(Metal::Steel),
            Self::Section232Aluminum => Some(Metal::Aluminum),
            _ => None,
        }
    }

    /// Disclaim behavior on slices this program's metal does not occupy
    /// (spec.md §4.9 Step 4, second bullet).
    pub fn disclaim_behavior(self) -> DisclaimBehavior {
        match self {
            Self::Section232Copper => DisclaimBehavior::Required,
            Self::Section232Steel | Self::Section232Aluminum => DisclaimBehavior::Omit,
            _ => DisclaimBehavior::None,
        }
    }

    /// Filing sequence order used to sort applicable programs (spec.md
    /// §4.9 Step 1). Section 232 files first, Section 301 next, then the
    /// two IEEPA regimes, matching the worked examples in spec.md §8.
    pub fn filing_sequence(self) -> u32 {
        match self {
            Self::Section232Copper => 10,
            Self::Section232Steel => 11,
            Self::Section232Aluminum => 12,
            Self::Section301Note20 => 20,
            Self::Section301Note31 => 21,
            Self::IeepaFentanyl => 30,
            Self::IeepaReciprocal => 31,
            Self::BaseMfn => 99,
        }
    }

    pub fn all() -> &'static [ProgramId] {
        &[
            Self::Section232Copper,
            Self::Section232Steel,
            Self::Section232Aluminum,
            Self::Section301Note20,
            Self::Section301Note31,
            Self::IeepaFentanyl,
            Self::IeepaReciprocal,
        ]
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProgramId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "section_232_copper" => Ok(Self::Section232Copper),
            "section_232_steel" => Ok(Self::Section232Steel),
            "section_232_aluminum" => Ok(Self::Section232Aluminum),
            "section_301_note20" => Ok(Self::Section301Note20),
            "section_301_note31" => Ok(Self::Section301Note31),
            "ieepa_fentanyl" => Ok(Self::IeepaFentanyl),
            "ieepa_reciprocal" => Ok(Self::IeepaReciprocal),
            "base_mfn" => Ok(Self::BaseMfn),
            other => Err(CoreError::Validation {
                what: "program_id".into(),
                reason: format!("unknown program_id {other:?}"),
            }),
        }
    }
}

/// What happens to a Section-232 program's ACE line on a slice it does
/// not govern (spec.md §3, §4.9 Step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisclaimBehavior {
    /// Always emit a disclaim line on every slice this program does not
    /// occupy, when the program applies to the product at all (copper).
    Required,
    /// Emit no line on slices that do not carry this metal (steel,
    /// aluminum).
    Omit,
    /// Never emit a disclaim line (non-232 programs).
    None,
}

/// The three Section-232 metals a material-composition map may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metal {
    Copper,
    Steel,
    Aluminum,
}

impl Metal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copper => "copper",
            Self::Steel => "steel",
            Self::Aluminum => "aluminum",
        }
    }

    pub fn program(self) -> ProgramId {
        match self {
            Self::Copper => ProgramId::Section232Copper,
            Self::Steel => ProgramId::Section232Steel,
            Self::Aluminum => ProgramId::Section232Aluminum,
        }
    }

    pub fn all() -> &'static [Metal] {
        &[Metal::Copper, Metal::Steel, Metal::Aluminum]
    }
}

impl FromStr for Metal {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copper" => Ok(Self::Copper),
            "steel" => Ok(Self::Steel),
            "aluminum" => Ok(Self::Aluminum),
            other => Err(CoreError::Validation {
                what: "material".into(),
                reason: format!("unrecognised material {other:?}, expected copper|steel|aluminum"),
            }),
        }
    }
}

/// Country-scope allowlist for a `ProgramApplicability` row (spec.md §9
/// Open Questions: "a single authoritative table keyed by
/// `(program_id, country_code | 'ALL', hts_scope)`").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountryScope {
    All,
    Allowlist(Vec<String>),
}

impl CountryScope {
    pub fn matches(&self, iso_alpha2: &str) -> bool {
        match self {
            Self::All => true,
            Self::Allowlist(list) => list.iter().any(|c| c.eq_ignore_ascii_case(iso_alpha2)),
        }
    }
}

/// A row of the `ProgramApplicability` table (spec.md §9 Open Questions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramApplicability {
    pub program_id: ProgramId,
    pub country_scope: CountryScope,
    pub hts_scope_type: crate::types::hts::ScopeHtsType,
    pub hts_scope_value: String,
}
