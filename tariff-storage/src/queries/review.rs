//! `needs_review_queue` queries (spec.md §3, §4.6, C11).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tariff_core::errors::StorageError;
use tariff_core::types::program::Metal;
use tariff_core::types::review::{NeedsReviewEntry, ReviewStatus};

use super::sqe;

fn status_str(s: ReviewStatus) -> &'static str {
    match s {
        ReviewStatus::Pending => "pending",
        ReviewStatus::Resolved => "resolved",
        ReviewStatus::Dismissed => "dismissed",
    }
}

fn parse_status(s: &str) -> ReviewStatus {
    match s {
        "resolved" => ReviewStatus::Resolved,
        "dismissed" => ReviewStatus::Dismissed,
        _ => ReviewStatus::Pending,
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<NeedsReviewEntry> {
    let material_raw: Option<String> = row.get("material")?;
    let created_at: String = row.get("created_at")?;
    Ok(NeedsReviewEntry {
        id: row.get("id")?,
        hts_code: row.get("hts_code")?,
        query_type: row.get("query_type")?,
        material: material_raw.and_then(|m| m.parse::<Metal>().ok()),
        reader_output: row.get("reader_output")?,
        validator_output: row.get("validator_output")?,
        block_reason: row.get("block_reason")?,
        block_details: row.get("block_details")?,
        status: parse_status(&row.get::<_, String>("status")?),
        priority: row.get::<_, i64>("priority")? as u8,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

pub fn enqueue(conn: &Connection, entry: &NeedsReviewEntry) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO needs_review_queue
         (id, hts_code, query_type, material, reader_output, validator_output,
          block_reason, block_details, status, priority, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        params![
            entry.id,
            entry.hts_code,
            entry.query_type,
            entry.material.map(|m| m.as_str()),
            entry.reader_output,
            entry.validator_output,
            entry.block_reason,
            entry.block_details,
            status_str(entry.status),
            entry.priority as i64,
            entry.created_at.to_rfc3339(),
        ],
    )
    .map_err(sqe)?;
    Ok(())
}

pub fn list(conn: &Connection, status: Option<ReviewStatus>) -> Result<Vec<NeedsReviewEntry>, StorageError> {
    let sql = match status {
        Some(_) => "SELECT * FROM needs_review_queue WHERE status = ?1 ORDER BY priority DESC, created_at",
        None => "SELECT * FROM needs_review_queue ORDER BY priority DESC, created_at",
    };
    let mut stmt = conn.prepare_cached(sql).map_err(sqe)?;
    let rows = match status {
        Some(s) => stmt.query_map(params![status_str(s)], row_to_entry).map_err(sqe)?,
        None => stmt.query_map([], row_to_entry).map_err(sqe)?,
    };
    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(sqe)?);
    }
    Ok(out)
}

pub fn set_status(conn: &Connection, id: &str, status: ReviewStatus) -> Result<(), StorageError> {
    let changed = conn
        .execute(
            "UPDATE needs_review_queue SET status = ?1 WHERE id = ?2",
            params![status_str(status), id],
        )
        .map_err(sqe)?;
    if changed == 0 {
        return Err(StorageError::NotFound {
            what: format!("needs_review_queue row {id}"),
        });
    }
    Ok(())
}
