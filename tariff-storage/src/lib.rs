//! SQLite persistence layer for the Temporal Tariff Store and Evidence
//! pipeline: connection management, the batch writer, schema
//! migrations, and the per-table query modules.

pub mod batch;
pub mod connection;
pub mod engine;
pub mod migrations;
pub mod queries;

pub use batch::{BatchCommand, BatchWriter, WriteStats};
pub use connection::DatabaseManager;
pub use engine::TariffStorageEngine;
