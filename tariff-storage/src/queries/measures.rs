//! `tariff_measures` queries: point-in-time lookup and SCD-2 supersession
//! (spec.md §4.1).

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tariff_core::errors::StorageError;
use tariff_core::types::hts::ScopeHtsType;
use tariff_core::types::measure::{ArticleType, MeasureRole, RateStatus, TariffMeasure};
use tariff_core::types::program::ProgramId;

use super::sqe;

fn article_type_str(a: ArticleType) -> &'static str {
    match a {
        ArticleType::Primary => "primary",
        ArticleType::Derivative => "derivative",
        ArticleType::Content => "content",
    }
}

fn parse_article_type(s: &str) -> ArticleType {
    match s {
        "primary" => ArticleType::Primary,
        "content" => ArticleType::Content,
        _ => ArticleType::Derivative,
    }
}

fn role_str(r: MeasureRole) -> &'static str {
    match r {
        MeasureRole::Impose => "impose",
        MeasureRole::Exclude => "exclude",
    }
}

fn parse_role(s: &str) -> MeasureRole {
    match s {
        "exclude" => MeasureRole::Exclude,
        _ => MeasureRole::Impose,
    }
}

fn rate_status_str(r: RateStatus) -> &'static str {
    match r {
        RateStatus::Confirmed => "confirmed",
        RateStatus::Pending => "pending",
    }
}

fn parse_rate_status(s: &str) -> RateStatus {
    match s {
        "pending" => RateStatus::Pending,
        _ => RateStatus::Confirmed,
    }
}

fn row_to_measure(row: &rusqlite::Row<'_>) -> rusqlite::Result<TariffMeasure> {
    let program_id_raw: String = row.get("program_id")?;
    let scope_type_raw: String = row.get("scope_hts_type")?;
    let effective_start: String = row.get("effective_start")?;
    let effective_end: Option<String> = row.get("effective_end")?;
    Ok(TariffMeasure {
        id: row.get("id")?,
        program_id: program_id_raw.parse().unwrap_or(ProgramId::IeepaFentanyl),
        ch99_heading: row.get("ch99_heading")?,
        scope_hts_type: scope_type_raw.parse().unwrap_or(ScopeHtsType::Hts8),
        scope_hts_value: row.get("scope_hts_value")?,
        effective_start: effective_start.parse().unwrap_or(NaiveDate::MIN),
        effective_end: effective_end.and_then(|s| s.parse().ok()),
        additional_rate: row.get("additional_rate")?,
        rate_status: parse_rate_status(&row.get::<_, String>("rate_status")?),
        role: parse_role(&row.get::<_, String>("role")?),
        article_type: parse_article_type(&row.get::<_, String>("article_type")?),
        source_version_id: row.get("source_version_id")?,
        supersedes_id: row.get("supersedes_id")?,
        superseded_by_id: row.get("superseded_by_id")?,
    })
}

/// Step (b)+(c) of spec.md §4.1: query current-window rows for the
/// program at either HTS10 or HTS8 scope, then sort HTS10 before HTS8
/// and, within a bucket, latest `effective_start` first.
pub fn lookup_measures(
    conn: &Connection,
    program_id: ProgramId,
    hts8: Option<&str>,
    hts10: Option<&str>,
    entry_date: NaiveDate,
) -> Result<Vec<TariffMeasure>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT * FROM tariff_measures
             WHERE program_id = ?1
               AND role = 'impose'
               AND effective_start <= ?2
               AND (effective_end IS NULL OR effective_end > ?2)
               AND (
                    (scope_hts_type = 'HTS10' AND scope_hts_value = ?3)
                 OR (scope_hts_type = 'HTS8' AND scope_hts_value = ?4)
               )",
        )
        .map_err(sqe)?;

    let entry_date_str = entry_date.to_string();
    let rows = stmt
        .query_map(
            params![program_id.as_str(), entry_date_str, hts10.unwrap_or(""), hts8.unwrap_or("")],
            row_to_measure,
        )
        .map_err(sqe)?;

    let mut out: Vec<TariffMeasure> = Vec::new();
    for r in rows {
        out.push(r.map_err(sqe)?);
    }
    out.sort_by(|a, b| {
        let rank = |s: ScopeHtsType| if s == ScopeHtsType::Hts10 { 0 } else { 1 };
        rank(a.scope_hts_type)
            .cmp(&rank(b.scope_hts_type))
            .then(b.effective_start.cmp(&a.effective_start))
    });
    Ok(out)
}

/// Insertion with supersession, as one transaction (spec.md §4.1, §5):
/// close any current row for the same `(program, scope, role)` whose
/// window overlaps the new row's start, then insert.
pub fn insert_measure(conn: &mut Connection, measure: &TariffMeasure) -> Result<(), StorageError> {
    let tx = conn.transaction().map_err(sqe)?;

    let closed = tx
        .execute(
            "UPDATE tariff_measures
             SET effective_end = ?1, superseded_by_id = ?2
             WHERE effective_end IS NULL
               AND program_id = ?3
               AND scope_hts_type = ?4
               AND scope_hts_value = ?5
               AND role = ?6
               AND effective_start <= ?1",
            params![
                measure.effective_start.to_string(),
                measure.id,
                measure.program_id.as_str(),
                measure.scope_hts_type.as_str(),
                measure.scope_hts_value,
                role_str(measure.role),
            ],
        )
        .map_err(sqe)?;

    if closed > 1 {
        return Err(StorageError::DbCorrupt {
            details: format!(
                "more than one current row existed for program={} scope={} role={:?} before insert of {}",
                measure.program_id, measure.scope_hts_value, measure.role, measure.id
            ),
        });
    }

    tx.execute(
        "INSERT INTO tariff_measures
         (id, program_id, ch99_heading, scope_hts_type, scope_hts_value,
          effective_start, effective_end, additional_rate, rate_status,
          role, article_type, source_version_id, supersedes_id, superseded_by_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            measure.id,
            measure.program_id.as_str(),
            measure.ch99_heading,
            measure.scope_hts_type.as_str(),
            measure.scope_hts_value,
            measure.effective_start.to_string(),
            measure.effective_end.map(|d| d.to_string()),
            measure.additional_rate,
            rate_status_str(measure.rate_status),
            role_str(measure.role),
            article_type_str(measure.article_type),
            measure.source_version_id,
            measure.supersedes_id,
            measure.superseded_by_id,
        ],
    )
    .map_err(sqe)?;

    tx.commit().map_err(sqe)?;
    Ok(())
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<TariffMeasure>, StorageError> {
    conn.query_row("SELECT * FROM tariff_measures WHERE id = ?1", params![id], row_to_measure)
        .optional()
        .map_err(sqe)
}
