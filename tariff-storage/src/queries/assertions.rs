//! `verified_assertions` queries: point-in-time lookup and SCD-2
//! closure (spec.md §3, §4.6, §4.7).

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tariff_core::errors::StorageError;
use tariff_core::types::assertion::{AssertionType, VerifiedAssertion};
use tariff_core::types::program::{Metal, ProgramId};

use super::sqe;

fn assertion_type_str(t: AssertionType) -> &'static str {
    match t {
        AssertionType::InScope => "IN_SCOPE",
        AssertionType::OutOfScope => "OUT_OF_SCOPE",
        AssertionType::Rate => "RATE",
    }
}

fn parse_assertion_type(s: &str) -> AssertionType {
    match s {
        "OUT_OF_SCOPE" => AssertionType::OutOfScope,
        "RATE" => AssertionType::Rate,
        _ => AssertionType::InScope,
    }
}

fn material_str(m: Option<Metal>) -> Option<&'static str> {
    m.map(|m| m.as_str())
}

fn row_to_assertion(row: &rusqlite::Row<'_>) -> rusqlite::Result<VerifiedAssertion> {
    let program_raw: String = row.get("program_id")?;
    let material_raw: Option<String> = row.get("material")?;
    let effective_start: String = row.get("effective_start")?;
    let effective_end: Option<String> = row.get("effective_end")?;
    let verified_at: String = row.get("verified_at")?;
    Ok(VerifiedAssertion {
        id: row.get("id")?,
        program_id: program_raw.parse().unwrap_or(ProgramId::IeepaFentanyl),
        hts_code_norm: row.get("hts_code_norm")?,
        hts_digits: row.get::<_, i64>("hts_digits")? as u8,
        material: material_raw.and_then(|m| m.parse().ok()),
        assertion_type: parse_assertion_type(&row.get::<_, String>("assertion_type")?),
        claim_code: row.get("claim_code")?,
        disclaim_code: row.get("disclaim_code")?,
        duty_rate: row.get("duty_rate")?,
        effective_start: effective_start.parse().unwrap_or(NaiveDate::MIN),
        effective_end: effective_end.and_then(|s| s.parse().ok()),
        document_id: row.get("document_id")?,
        chunk_id: row.get("chunk_id")?,
        evidence_quote: row.get("evidence_quote")?,
        evidence_quote_hash: row.get("evidence_quote_hash")?,
        reader_output: row.get("reader_output")?,
        validator_output: row.get("validator_output")?,
        verified_at: DateTime::parse_from_rfc3339(&verified_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        verified_by: row.get("verified_by")?,
    })
}

pub fn lookup(
    conn: &Connection,
    program_id: ProgramId,
    hts_norm: &str,
    material: Option<Metal>,
    assertion_type: AssertionType,
    as_of: NaiveDate,
) -> Result<Option<VerifiedAssertion>, StorageError> {
    conn.query_row(
        "SELECT * FROM verified_assertions
         WHERE program_id = ?1 AND hts_code_norm = ?2
           AND COALESCE(material, '') = COALESCE(?3, '')
           AND assertion_type = ?4
           AND effective_start <= ?5
           AND (effective_end IS NULL OR effective_end > ?5)
         ORDER BY effective_start DESC LIMIT 1",
        params![
            program_id.as_str(),
            hts_norm,
            material_str(material),
            assertion_type_str(assertion_type),
            as_of.to_string(),
        ],
        row_to_assertion,
    )
    .optional()
    .map_err(sqe)
}

/// Insert with SCD-2 closure of any overlapping prior assertion for the
/// same `(program, hts, material, assertion_type)` (spec.md §4.6).
pub fn insert_with_closure(conn: &mut Connection, assertion: &VerifiedAssertion) -> Result<(), StorageError> {
    let tx = conn.transaction().map_err(sqe)?;

    tx.execute(
        "UPDATE verified_assertions
         SET effective_end = ?1
         WHERE effective_end IS NULL
           AND program_id = ?2 AND hts_code_norm = ?3
           AND COALESCE(material, '') = COALESCE(?4, '')
           AND assertion_type = ?5
           AND effective_start <= ?1",
        params![
            assertion.effective_start.to_string(),
            assertion.program_id.as_str(),
            assertion.hts_code_norm,
            material_str(assertion.material),
            assertion_type_str(assertion.assertion_type),
        ],
    )
    .map_err(sqe)?;

    tx.execute(
        "INSERT INTO verified_assertions
         (id, program_id, hts_code_norm, hts_digits, material, assertion_type,
          claim_code, disclaim_code, duty_rate, effective_start, effective_end,
          document_id, chunk_id, evidence_quote, evidence_quote_hash,
          reader_output, validator_output, verified_at, verified_by)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)",
        params![
            assertion.id,
            assertion.program_id.as_str(),
            assertion.hts_code_norm,
            assertion.hts_digits as i64,
            material_str(assertion.material),
            assertion_type_str(assertion.assertion_type),
            assertion.claim_code,
            assertion.disclaim_code,
            assertion.duty_rate,
            assertion.effective_start.to_string(),
            assertion.effective_end.map(|d| d.to_string()),
            assertion.document_id,
            assertion.chunk_id,
            assertion.evidence_quote,
            assertion.evidence_quote_hash,
            assertion.reader_output,
            assertion.validator_output,
            assertion.verified_at.to_rfc3339(),
            assertion.verified_by,
        ],
    )
    .map_err(sqe)?;

    tx.commit().map_err(sqe)?;
    Ok(())
}
