//! `program_applicability` queries: the single authoritative table keyed
//! by `(program_id, country_code | 'ALL', hts_scope)` (spec.md §9 Open
//! Questions).

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use tariff_core::errors::StorageError;
use tariff_core::types::program::{CountryScope, ProgramId};

use super::sqe;

fn country_scope_to_str(scope: &CountryScope) -> String {
    match scope {
        CountryScope::All => "ALL".to_string(),
        CountryScope::Allowlist(list) => serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string()),
    }
}

fn country_scope_from_str(raw: &str) -> CountryScope {
    if raw == "ALL" {
        CountryScope::All
    } else {
        CountryScope::Allowlist(serde_json::from_str(raw).unwrap_or_default())
    }
}

pub fn set_scope(
    conn: &Connection,
    program_id: ProgramId,
    hts_scope_type: &str,
    hts_scope_value: &str,
    scope: &CountryScope,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO program_applicability (program_id, country_scope, hts_scope_type, hts_scope_value)
         VALUES (?1, ?2, ?3, ?4)",
        params![program_id.as_str(), country_scope_to_str(scope), hts_scope_type, hts_scope_value],
    )
    .map_err(sqe)?;
    Ok(())
}

/// Step 1 of spec.md §4.9: programs whose country-scope matches
/// `country` and whose HTS scope contains `hts` at `entry_date`. This
/// table is not itself temporally versioned beyond the HTS scope's
/// presence; program temporal bounds live on `tariff_measures`, so
/// applicability here is "structurally eligible", filtered against
/// current measures by the caller.
pub fn applicable_programs(
    conn: &Connection,
    country_iso: &str,
    hts8: Option<&str>,
    hts10: Option<&str>,
    _entry_date: NaiveDate,
) -> Result<Vec<ProgramId>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT program_id, country_scope FROM program_applicability
             WHERE (hts_scope_type = 'HTS10' AND hts_scope_value = ?1)
                OR (hts_scope_type = 'HTS8' AND hts_scope_value = ?2)
                OR hts_scope_value = 'ALL'",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![hts10.unwrap_or(""), hts8.unwrap_or("")], |row| {
            let program_raw: String = row.get(0)?;
            let scope_raw: String = row.get(1)?;
            Ok((program_raw, scope_raw))
        })
        .map_err(sqe)?;

    let mut out = Vec::new();
    for r in rows {
        let (program_raw, scope_raw) = r.map_err(sqe)?;
        let Ok(program_id) = program_raw.parse::<ProgramId>() else {
            continue;
        };
        let scope = country_scope_from_str(&scope_raw);
        if scope.matches(country_iso) {
            out.push(program_id);
        }
    }
    out.sort_by_key(|p| p.filing_sequence());
    out.dedup();
    Ok(out)
}
