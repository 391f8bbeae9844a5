//! `exclusion_claims` queries (spec.md §3, §4.8 step 4).

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde_json;
use tariff_core::errors::StorageError;
use tariff_core::types::exclusion::{EffectiveWindow, ExclusionClaim, HtsConstraints};

use super::sqe;

fn row_to_exclusion(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExclusionClaim> {
    let hts10_json: String = row.get("hts10_exact_json")?;
    let hts8_json: String = row.get("hts8_prefix_json")?;
    let effective_start: String = row.get("effective_start")?;
    let effective_end: Option<String> = row.get("effective_end")?;
    Ok(ExclusionClaim {
        exclusion_id: row.get("exclusion_id")?,
        note_bucket: row.get("note_bucket")?,
        claim_ch99_heading: row.get("claim_ch99_heading")?,
        source_heading: row.get("source_heading")?,
        hts_constraints: HtsConstraints {
            hts10_exact: serde_json::from_str(&hts10_json).unwrap_or_default(),
            hts8_prefix: serde_json::from_str(&hts8_json).unwrap_or_default(),
        },
        description_scope_text: row.get("description_scope_text")?,
        scope_text_hash: row.get("scope_text_hash")?,
        effective_window: EffectiveWindow {
            effective_start: effective_start.parse().unwrap_or(NaiveDate::MIN),
            effective_end: effective_end.and_then(|s| s.parse().ok()),
        },
        verification_required: row.get::<_, i64>("verification_required")? != 0,
    })
}

pub fn lookup_candidates(
    conn: &Connection,
    hts8: Option<&str>,
    hts10: Option<&str>,
    as_of: NaiveDate,
) -> Result<Vec<ExclusionClaim>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT * FROM exclusion_claims
             WHERE effective_start <= ?1 AND (effective_end IS NULL OR effective_end > ?1)",
        )
        .map_err(sqe)?;
    let as_of_str = as_of.to_string();
    let rows = stmt.query_map(params![as_of_str], row_to_exclusion).map_err(sqe)?;
    let mut out = Vec::new();
    for r in rows {
        let exclusion = r.map_err(sqe)?;
        if exclusion.hts_constraints.matches(hts8, hts10) {
            out.push(exclusion);
        }
    }
    Ok(out)
}

pub fn insert(conn: &Connection, exclusion: &ExclusionClaim) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO exclusion_claims
         (exclusion_id, note_bucket, claim_ch99_heading, source_heading,
          hts10_exact_json, hts8_prefix_json, description_scope_text,
          scope_text_hash, effective_start, effective_end, verification_required)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(exclusion_id) DO UPDATE SET
            claim_ch99_heading = excluded.claim_ch99_heading,
            effective_end = excluded.effective_end",
        params![
            exclusion.exclusion_id,
            exclusion.note_bucket,
            exclusion.claim_ch99_heading,
            exclusion.source_heading,
            serde_json::to_string(&exclusion.hts_constraints.hts10_exact).map_err(|e| StorageError::SqliteError {
                message: e.to_string()
            })?,
            serde_json::to_string(&exclusion.hts_constraints.hts8_prefix).map_err(|e| StorageError::SqliteError {
                message: e.to_string()
            })?,
            exclusion.description_scope_text,
            exclusion.scope_text_hash,
            exclusion.effective_window.effective_start.to_string(),
            exclusion.effective_window.effective_end.map(|d| d.to_string()),
            exclusion.verification_required as i64,
        ],
    )
    .map_err(sqe)?;
    Ok(())
}
