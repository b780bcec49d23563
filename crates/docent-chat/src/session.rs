//! Checkpointed session state machine.
//!
//! Every invocation is a single transition: load the session's last state,
//! run contextualize -> retrieve -> compose, append the exchange to the
//! history, and save. A per-session lock is held across the whole cycle so
//! concurrent invocations on one session apply in order. A failed transition
//! saves nothing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};

use docent_core::checkpoint::CheckpointStore;
use docent_core::error::{DocentError, Result};
use docent_core::types::{ChatTurn, SessionState};

use crate::composer::AnswerComposer;
use crate::contextualizer::QueryContextualizer;
use crate::retriever::Retriever;

/// The three retrieval-augmented generation stages.
pub struct RagPipeline {
    contextualizer: QueryContextualizer,
    retriever: Retriever,
    composer: AnswerComposer,
}

impl RagPipeline {
    pub fn new(contextualizer: QueryContextualizer, retriever: Retriever, composer: AnswerComposer) -> Self {
        Self {
            contextualizer,
            retriever,
            composer,
        }
    }

    /// Apply one transition to `state`, answering `state.input`.
    pub async fn step(&self, state: SessionState) -> Result<SessionState> {
        let SessionState {
            input,
            mut chat_history,
            ..
        } = state;

        let query = self.contextualizer.contextualize(&chat_history, &input).await?;
        let context = self.retriever.retrieve(&query).await?;
        let answer = self.composer.compose(&input, &chat_history, &context).await?;

        chat_history.push(ChatTurn::user(input.clone()));
        chat_history.push(ChatTurn::assistant(answer.clone()));

        Ok(SessionState {
            input,
            chat_history,
            context,
            answer,
            updated_at: Some(Utc::now()),
        })
    }
}

type SessionLock = Arc<tokio::sync::Mutex<()>>;

/// A caller's hold on one session's lock. The table entry is removed when
/// the last holder lets go, so idle sessions cost nothing.
struct LockLease<'a> {
    table: &'a Mutex<HashMap<String, SessionLock>>,
    session_id: String,
    lock: SessionLock,
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        if let Ok(mut locks) = self.table.lock() {
            // One reference in the table, one here.
            if Arc::strong_count(&self.lock) == 2 {
                locks.remove(&self.session_id);
            }
        }
    }
}

pub struct SessionMachine {
    pipeline: RagPipeline,
    checkpoints: Arc<dyn CheckpointStore>,
    locks: Mutex<HashMap<String, SessionLock>>,
}

impl SessionMachine {
    pub fn new(pipeline: RagPipeline, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self {
            pipeline,
            checkpoints,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lease(&self, session_id: &str) -> Result<LockLease<'_>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| DocentError::Checkpoint(format!("Session lock table poisoned: {}", e)))?;
        let lock = locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        Ok(LockLease {
            table: &self.locks,
            session_id: session_id.to_string(),
            lock,
        })
    }

    /// Run one checkpointed transition for `session_id` and return the new state.
    pub async fn run(&self, session_id: &str, input: &str) -> Result<SessionState> {
        let lease = self.lease(session_id)?;
        let _guard = lease.lock.lock().await;

        let previous = self.checkpoints.load(session_id).await?.unwrap_or_default();
        debug!(
            session_id,
            history = previous.chat_history.len(),
            "Loaded session checkpoint"
        );

        let next = self.pipeline.step(previous.with_input(input)).await?;
        self.checkpoints.save(session_id, &next).await?;

        info!(
            session_id,
            history = next.chat_history.len(),
            context = next.context.len(),
            "Session advanced"
        );
        Ok(next)
    }

    /// Last saved state, if the session exists.
    pub async fn state(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.checkpoints.load(session_id).await
    }

    pub async fn sessions(&self) -> Result<Vec<String>> {
        self.checkpoints.list().await
    }
}
