//! SQLite-backed checkpoint store.
//!
//! Session state is stored as JSON, one row per session, replaced on every
//! save.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;
use tracing::debug;

use docent_core::checkpoint::CheckpointStore;
use docent_core::error::{DocentError, Result};
use docent_core::types::SessionState;

use crate::db::Database;

#[derive(Debug, Clone)]
pub struct SqliteCheckpointStore {
    db: Arc<Database>,
}

impl SqliteCheckpointStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(Database::new(path)?)))
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        let raw: Option<String> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT state FROM session_checkpoints WHERE session_id = ?1",
                rusqlite::params![session_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DocentError::Checkpoint(format!("Failed to load checkpoint: {}", e)))
        })?;

        match raw {
            Some(json) => {
                let state = serde_json::from_str(&json).map_err(|e| {
                    DocentError::Checkpoint(format!("Corrupt checkpoint for {}: {}", session_id, e))
                })?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session_id: &str, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO session_checkpoints (session_id, state, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(session_id) DO UPDATE SET
                    state = excluded.state,
                    updated_at = excluded.updated_at",
                rusqlite::params![session_id, json, Utc::now().timestamp()],
            )
            .map_err(|e| DocentError::Checkpoint(format!("Failed to save checkpoint: {}", e)))?;
            Ok(())
        })?;
        debug!(session_id, turns = state.chat_history.len(), "Checkpoint saved");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT session_id FROM session_checkpoints ORDER BY session_id")
                .map_err(|e| DocentError::Checkpoint(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|e| DocentError::Checkpoint(e.to_string()))?;

            let mut ids = Vec::new();
            for row in rows {
                ids.push(row.map_err(|e| DocentError::Checkpoint(e.to_string()))?);
            }
            Ok(ids)
        })
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        self.db.with_conn(|conn| {
            let removed = conn
                .execute(
                    "DELETE FROM session_checkpoints WHERE session_id = ?1",
                    rusqlite::params![session_id],
                )
                .map_err(|e| DocentError::Checkpoint(format!("Failed to delete checkpoint: {}", e)))?;
            Ok(removed > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_core::types::ChatTurn;

    fn store() -> SqliteCheckpointStore {
        SqliteCheckpointStore::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn state(turns: usize) -> SessionState {
        let mut state = SessionState::default().with_input("question");
        for i in 0..turns {
            state.chat_history.push(ChatTurn::user(format!("q{i}")));
            state.chat_history.push(ChatTurn::assistant(format!("a{i}")));
        }
        state.answer = "answer".to_string();
        state.updated_at = Some(Utc::now());
        state
    }

    #[tokio::test]
    async fn test_unknown_session_is_none() {
        assert!(store().load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_preserves_state() {
        let store = store();
        let saved = state(2);
        store.save("LOCALRAG11", &saved).await.unwrap();

        let loaded = store.load("LOCALRAG11").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_checkpoint() {
        let store = store();
        store.save("s", &state(1)).await.unwrap();
        store.save("s", &state(3)).await.unwrap();

        let loaded = store.load("s").await.unwrap().unwrap();
        assert_eq!(loaded.chat_history.len(), 6);
        assert_eq!(store.list().await.unwrap(), vec!["s"]);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = store();
        store.save("b", &state(0)).await.unwrap();
        store.save("a", &state(0)).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["a", "b"]);

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_checkpoints_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docent.db");

        {
            let store = SqliteCheckpointStore::open(&path).unwrap();
            store.save("persisted", &state(1)).await.unwrap();
        }

        let reopened = SqliteCheckpointStore::open(&path).unwrap();
        let loaded = reopened.load("persisted").await.unwrap().unwrap();
        assert_eq!(loaded.chat_history.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_checkpoint_error() {
        let db = Arc::new(Database::in_memory().unwrap());
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO session_checkpoints (session_id, state, updated_at) VALUES ('bad', 'not json', 0)",
                [],
            )
            .map_err(|e| DocentError::Checkpoint(e.to_string()))?;
            Ok(())
        })
        .unwrap();

        let err = SqliteCheckpointStore::new(db).load("bad").await.unwrap_err();
        assert!(matches!(err, DocentError::Checkpoint(_)));
    }
}
