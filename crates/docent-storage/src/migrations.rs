//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use docent_core::error::DocentError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), DocentError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| DocentError::Checkpoint(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| DocentError::Checkpoint(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: session_checkpoints");
    }

    Ok(())
}

/// Version 1: one row per session holding the serialized state.
fn apply_v1(conn: &Connection) -> Result<(), DocentError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS session_checkpoints (
            session_id  TEXT PRIMARY KEY NOT NULL,
            state       TEXT NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'session_checkpoints');
        ",
    )
    .map_err(|e| DocentError::Checkpoint(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}
