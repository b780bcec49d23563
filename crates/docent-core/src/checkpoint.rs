//! Checkpoint store boundary.
//!
//! A checkpoint is the last saved `SessionState` of a session. The session
//! state machine loads it before a transition and saves the result after.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::SessionState;

/// Persistence for per-session conversation state.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the last saved state, or `None` for an unknown session.
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>>;

    /// Save (replace) the state of a session.
    async fn save(&self, session_id: &str, state: &SessionState) -> Result<()>;

    /// All session identifiers with a saved checkpoint, sorted.
    async fn list(&self) -> Result<Vec<String>>;

    /// Remove a session's checkpoint. Returns whether one existed.
    async fn delete(&self, session_id: &str) -> Result<bool>;
}

/// Process-lifetime checkpoint store backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    states: RwLock<HashMap<String, SessionState>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        Ok(self.states.read().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, state: &SessionState) -> Result<()> {
        self.states
            .write()
            .await
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.states.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        Ok(self.states.write().await.remove(session_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatTurn;

    #[tokio::test]
    async fn test_load_unknown_session_is_none() {
        let store = InMemoryCheckpointStore::new();
        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = InMemoryCheckpointStore::new();
        let state = SessionState {
            input: "hi".to_string(),
            chat_history: vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")],
            answer: "hello".to_string(),
            ..Default::default()
        };

        store.save("s1", &state).await.unwrap();
        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryCheckpointStore::new();
        store
            .save("a", &SessionState::default().with_input("from a"))
            .await
            .unwrap();
        store
            .save("b", &SessionState::default().with_input("from b"))
            .await
            .unwrap();

        assert_eq!(store.load("a").await.unwrap().unwrap().input, "from a");
        assert_eq!(store.list().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryCheckpointStore::new();
        store.save("a", &SessionState::default()).await.unwrap();
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }
}
