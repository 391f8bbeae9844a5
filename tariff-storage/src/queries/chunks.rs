//! `document_chunks` queries (spec.md §3, §4.4, §5).

use rusqlite::{params, Connection, OptionalExtension};
use tariff_core::errors::StorageError;
use tariff_core::types::document::DocumentChunk;

use super::sqe;

fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentChunk> {
    Ok(DocumentChunk {
        id: row.get("id")?,
        document_id: row.get("document_id")?,
        chunk_index: row.get::<_, i64>("chunk_index")? as u32,
        char_start: row.get::<_, i64>("char_start")? as usize,
        char_end: row.get::<_, i64>("char_end")? as usize,
        text: row.get("text")?,
        text_hash: row.get("text_hash")?,
        embedding_id: row.get("embedding_id")?,
    })
}

/// Replace all chunks for a document in a single transaction, so that
/// `(document_id, chunk_index)` uniqueness cannot be violated by a
/// partial replay (spec.md §5).
pub fn replace_chunks(conn: &mut Connection, document_id: &str, chunks: &[DocumentChunk]) -> Result<(), StorageError> {
    let tx = conn.transaction().map_err(sqe)?;
    tx.execute("DELETE FROM document_chunks WHERE document_id = ?1", params![document_id])
        .map_err(sqe)?;
    for chunk in chunks {
        tx.execute(
            "INSERT INTO document_chunks
             (id, document_id, chunk_index, char_start, char_end, text, text_hash, embedding_id)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                chunk.id,
                chunk.document_id,
                chunk.chunk_index,
                chunk.char_start as i64,
                chunk.char_end as i64,
                chunk.text,
                chunk.text_hash,
                chunk.embedding_id,
            ],
        )
        .map_err(sqe)?;
    }
    tx.commit().map_err(sqe)?;
    Ok(())
}

pub fn get_chunks(conn: &Connection, document_id: &str) -> Result<Vec<DocumentChunk>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT * FROM document_chunks WHERE document_id = ?1 ORDER BY chunk_index")
        .map_err(sqe)?;
    let rows = stmt.query_map(params![document_id], row_to_chunk).map_err(sqe)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(sqe)?);
    }
    Ok(out)
}

pub fn get_chunk(conn: &Connection, document_id: &str, chunk_id: &str) -> Result<Option<DocumentChunk>, StorageError> {
    conn.query_row(
        "SELECT * FROM document_chunks WHERE document_id = ?1 AND id = ?2",
        params![document_id, chunk_id],
        row_to_chunk,
    )
    .optional()
    .map_err(sqe)
}
