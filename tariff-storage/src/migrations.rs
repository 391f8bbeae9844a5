//! Forward-only, numbered SQL migrations, applied under a
//! `schema_migrations` tracking table. This is the crate's own embedded
//! migration runner (spec.md AMBIENT-4) — distinct from the external
//! "SQL migration tooling" spec.md §1 places out of scope.

use rusqlite::Connection;
use tariff_core::errors::StorageError;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "init",
    sql: include_str!("../migrations/0001_init.sql"),
}];

pub fn run(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
             version INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             applied_at TEXT NOT NULL DEFAULT (datetime('now'))
         );",
    )
    .map_err(|e| StorageError::MigrationFailed {
        version: 0,
        message: e.to_string(),
    })?;

    for migration in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM schema_migrations WHERE version = ?1",
                [migration.version],
                |row| row.get::<_, i64>(0),
            )
            .map(|c| c > 0)
            .map_err(|e| StorageError::MigrationFailed {
                version: migration.version,
                message: e.to_string(),
            })?;
        if already_applied {
            continue;
        }

        tracing::info!(version = migration.version, name = migration.name, "applying migration");
        conn.execute_batch(migration.sql).map_err(|e| StorageError::MigrationFailed {
            version: migration.version,
            message: e.to_string(),
        })?;
        conn.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.name],
        )
        .map_err(|e| StorageError::MigrationFailed {
            version: migration.version,
            message: e.to_string(),
        })?;
    }

    Ok(())
}
