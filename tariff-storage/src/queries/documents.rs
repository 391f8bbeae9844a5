//! `documents` queries (spec.md §3, §4.2).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tariff_core::errors::StorageError;
use tariff_core::types::document::{Document, DocumentSource, DocumentTier, FetchLogEntry};

use super::sqe;

fn source_str(s: DocumentSource) -> &'static str {
    s.as_str()
}

fn parse_source(s: &str) -> DocumentSource {
    match s {
        "FEDERAL_REGISTER" => DocumentSource::FederalRegister,
        "USITC" => DocumentSource::Usitc,
        _ => DocumentSource::Csms,
    }
}

fn tier_str(t: DocumentTier) -> &'static str {
    t.as_str()
}

fn parse_tier(s: &str) -> DocumentTier {
    match s {
        "B" => DocumentTier::B,
        "C" => DocumentTier::C,
        _ => DocumentTier::A,
    }
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let published_at: Option<String> = row.get("published_at")?;
    let effective_start: Option<String> = row.get("effective_start")?;
    let hts_json: String = row.get("hts_codes_mentioned")?;
    let programs_json: String = row.get("programs_mentioned")?;
    let fetch_log_json: String = row.get("fetch_log")?;
    Ok(Document {
        id: row.get("id")?,
        source: parse_source(&row.get::<_, String>("source")?),
        tier: parse_tier(&row.get::<_, String>("tier")?),
        connector_name: row.get("connector_name")?,
        canonical_id: row.get("canonical_id")?,
        url: row.get("url")?,
        title: row.get("title")?,
        published_at: published_at.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|d| d.with_timezone(&Utc)),
        effective_start: effective_start.and_then(|s| s.parse().ok()),
        sha256_raw: row.get("sha256_raw")?,
        storage_uri: row.get("storage_uri")?,
        extracted_text: row.get("extracted_text")?,
        hts_codes_mentioned: serde_json::from_str(&hts_json).unwrap_or_default(),
        programs_mentioned: serde_json::from_str(&programs_json).unwrap_or_default(),
        fetch_log: serde_json::from_str::<Vec<FetchLogEntry>>(&fetch_log_json).unwrap_or_default(),
        extraction_failed: row.get::<_, i64>("extraction_failed")? != 0,
    })
}

/// Uniqueness on `(source, canonical_id)` (spec.md §3, §8 "Idempotent
/// ingestion"): re-ingesting the same URL returns the existing row's id
/// instead of inserting a duplicate.
pub fn upsert(conn: &Connection, doc: &Document) -> Result<String, StorageError> {
    if let Some(existing) = find_by_source_canonical_id(conn, source_str(doc.source), &doc.canonical_id)? {
        return Ok(existing.id);
    }
    conn.execute(
        "INSERT INTO documents
         (id, source, tier, connector_name, canonical_id, url, title,
          published_at, effective_start, sha256_raw, storage_uri,
          extracted_text, hts_codes_mentioned, programs_mentioned,
          fetch_log, extraction_failed)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
        params![
            doc.id,
            source_str(doc.source),
            tier_str(doc.tier),
            doc.connector_name,
            doc.canonical_id,
            doc.url,
            doc.title,
            doc.published_at.map(|d| d.to_rfc3339()),
            doc.effective_start.map(|d| d.to_string()),
            doc.sha256_raw,
            doc.storage_uri,
            doc.extracted_text,
            serde_json::to_string(&doc.hts_codes_mentioned).map_err(|e| StorageError::SqliteError { message: e.to_string() })?,
            serde_json::to_string(&doc.programs_mentioned).map_err(|e| StorageError::SqliteError { message: e.to_string() })?,
            serde_json::to_string(&doc.fetch_log).map_err(|e| StorageError::SqliteError { message: e.to_string() })?,
            doc.extraction_failed as i64,
        ],
    )
    .map_err(sqe)?;
    Ok(doc.id.clone())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Document>, StorageError> {
    conn.query_row("SELECT * FROM documents WHERE id = ?1", params![id], row_to_document)
        .optional()
        .map_err(sqe)
}

pub fn find_by_source_canonical_id(
    conn: &Connection,
    source: &str,
    canonical_id: &str,
) -> Result<Option<Document>, StorageError> {
    conn.query_row(
        "SELECT * FROM documents WHERE source = ?1 AND canonical_id = ?2",
        params![source, canonical_id],
        row_to_document,
    )
    .optional()
    .map_err(sqe)
}

/// All document ids, oldest first. Backs `tariffctl reindex-chunks` and
/// `tariffctl stats` (spec.md §6), neither of which has a narrower
/// natural key to page through.
pub fn list_ids(conn: &Connection) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn.prepare("SELECT id FROM documents ORDER BY rowid").map_err(sqe)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0)).map_err(sqe)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqe)
}

pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0)).map_err(sqe)
}
