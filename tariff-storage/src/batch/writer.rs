//! Dedicated writer thread with a bounded crossbeam channel. Batches
//! writes into single transactions for throughput, following the
//! reference engine's batch-writer pattern (one writer thread owns the
//! write `Connection`; the transaction either commits the whole buffer
//! or rolls it back and the buffer is retried).

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rusqlite::Connection;
use tariff_core::errors::StorageError;

use super::commands::BatchCommand;
use crate::queries;

const CHANNEL_BOUND: usize = 1024;
const BATCH_SIZE: usize = 200;
const FLUSH_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Default, Clone)]
pub struct WriteStats {
    pub documents: usize,
    pub chunk_batches: usize,
    pub assertions: usize,
    pub review_entries: usize,
    pub flushes: usize,
}

pub struct BatchWriter {
    tx: Sender<BatchCommand>,
    handle: Option<JoinHandle<Result<WriteStats, StorageError>>>,
}

impl BatchWriter {
    pub fn new(conn: Connection) -> Self {
        let (tx, rx) = bounded(CHANNEL_BOUND);
        let handle = thread::Builder::new()
            .name("tariff-batch-writer".to_string())
            .spawn(move || writer_loop(conn, rx))
            .expect("failed to spawn batch writer thread");
        Self {
            tx,
            handle: Some(handle),
        }
    }

    pub fn send(&self, cmd: BatchCommand) -> Result<(), StorageError> {
        self.tx.send(cmd).map_err(|_| StorageError::SqliteError {
            message: "batch writer channel disconnected".to_string(),
        })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.send(BatchCommand::Flush)
    }

    /// Flush pending writes and block until the writer thread confirms
    /// every buffered command has been committed.
    pub fn flush_sync(&self) -> Result<(), StorageError> {
        let (tx, rx) = std::sync::mpsc::sync_channel(0);
        self.send(BatchCommand::FlushSync(tx))?;
        rx.recv().map_err(|_| StorageError::SqliteError {
            message: "batch writer thread did not respond to flush_sync".to_string(),
        })
    }

    pub fn shutdown(mut self) -> Result<WriteStats, StorageError> {
        let _ = self.tx.send(BatchCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| StorageError::SqliteError {
                message: "batch writer thread panicked".to_string(),
            })?
        } else {
            Ok(WriteStats::default())
        }
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(BatchCommand::Shutdown);
    }
}

fn writer_loop(mut conn: Connection, rx: Receiver<BatchCommand>) -> Result<WriteStats, StorageError> {
    let mut buffer: Vec<BatchCommand> = Vec::with_capacity(BATCH_SIZE);
    let mut stats = WriteStats::default();

    loop {
        match rx.recv_timeout(FLUSH_TIMEOUT) {
            Ok(BatchCommand::Shutdown) => {
                flush_buffer(&mut conn, &mut buffer, &mut stats)?;
                break;
            }
            Ok(BatchCommand::Flush) => {
                flush_buffer(&mut conn, &mut buffer, &mut stats)?;
            }
            Ok(BatchCommand::FlushSync(done_tx)) => {
                flush_buffer(&mut conn, &mut buffer, &mut stats)?;
                let _ = done_tx.send(());
            }
            Ok(cmd) => {
                buffer.push(cmd);
                if buffer.len() >= BATCH_SIZE {
                    flush_buffer(&mut conn, &mut buffer, &mut stats)?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !buffer.is_empty() {
                    flush_buffer(&mut conn, &mut buffer, &mut stats)?;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                flush_buffer(&mut conn, &mut buffer, &mut stats)?;
                break;
            }
        }
    }

    Ok(stats)
}

fn flush_buffer(conn: &mut Connection, buffer: &mut Vec<BatchCommand>, stats: &mut WriteStats) -> Result<(), StorageError> {
    if buffer.is_empty() {
        return Ok(());
    }

    for cmd in buffer.drain(..) {
        match cmd {
            BatchCommand::UpsertDocument(doc) => {
                queries::documents::upsert(conn, &doc)?;
                stats.documents += 1;
            }
            BatchCommand::ReplaceChunks { document_id, chunks } => {
                queries::chunks::replace_chunks(conn, &document_id, &chunks)?;
                stats.chunk_batches += 1;
            }
            BatchCommand::InsertAssertion(assertion) => {
                queries::assertions::insert_with_closure(conn, &assertion)?;
                stats.assertions += 1;
            }
            BatchCommand::EnqueueReview(entry) => {
                queries::review::enqueue(conn, &entry)?;
                stats.review_entries += 1;
            }
            BatchCommand::Flush | BatchCommand::FlushSync(_) | BatchCommand::Shutdown => {}
        }
    }
    stats.flushes += 1;
    Ok(())
}
