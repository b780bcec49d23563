//! Conversation agent: the facade over ingestion and sessions.
//!
//! The agent is built once by the composition root and shared by reference.
//! It owns the knowledge store, the document ingestor and the session
//! machine; dropping it releases all backend handles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use docent_core::checkpoint::CheckpointStore;
use docent_core::config::DocentConfig;
use docent_core::error::{DocentError, Result};
use docent_core::types::ChatHistory;
use docent_vector::ingest::DocumentIngestor;
use docent_vector::store::KnowledgeStore;

use crate::composer::AnswerComposer;
use crate::contextualizer::QueryContextualizer;
use crate::llm::GenerationModel;
use crate::retriever::Retriever;
use crate::session::{RagPipeline, SessionMachine};

/// Outcome of a successful `update_knowledge` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub source: String,
    pub chunks: usize,
}

pub struct ConversationAgent {
    ingestor: DocumentIngestor,
    store: Arc<KnowledgeStore>,
    sessions: SessionMachine,
    max_input_chars: usize,
}

impl ConversationAgent {
    /// Wire the pipeline together and make sure the knowledge index exists.
    pub async fn new(
        config: &DocentConfig,
        store: Arc<KnowledgeStore>,
        model: Arc<dyn GenerationModel>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Result<Self> {
        let ingestor = DocumentIngestor::from_config(&config.ingest)?;
        let retriever = Retriever::new(store.clone(), config.retrieval)?;

        store.ensure_initialized().await?;

        let pipeline = RagPipeline::new(
            QueryContextualizer::new(model.clone()),
            retriever,
            AnswerComposer::new(model),
        );

        Ok(Self {
            ingestor,
            store,
            sessions: SessionMachine::new(pipeline, checkpoints),
            max_input_chars: config.session.max_input_chars,
        })
    }

    /// Load, split and index a document.
    ///
    /// Chunks are embedded one by one; a failure partway keeps the chunks
    /// already stored.
    pub async fn update_knowledge(&self, path: &Path) -> Result<IngestReport> {
        let ingestor = self.ingestor.clone();
        let owned: PathBuf = path.to_path_buf();
        let chunks = tokio::task::spawn_blocking(move || ingestor.ingest(&owned))
            .await
            .map_err(|e| DocentError::Load(format!("Ingestion task failed: {}", e)))??;

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if chunks.is_empty() {
            warn!(source = %source, "Document produced no chunks");
        }

        let added = self.store.add(&chunks).await?;
        info!(source = %source, chunks = added, "Knowledge base updated");
        Ok(IngestReport {
            source,
            chunks: added,
        })
    }

    /// Answer `question` within `session_id`, extending its history.
    pub async fn invoke(&self, session_id: &str, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(DocentError::EmptyInput);
        }
        if question.chars().count() > self.max_input_chars {
            return Err(DocentError::InputTooLong {
                limit: self.max_input_chars,
            });
        }

        let state = self.sessions.run(session_id, question).await?;
        Ok(state.answer)
    }

    /// Turns of a session, oldest first. Unknown sessions have no turns.
    pub async fn history(&self, session_id: &str) -> Result<ChatHistory> {
        Ok(self
            .sessions
            .state(session_id)
            .await?
            .map(|s| s.chat_history)
            .unwrap_or_default())
    }

    pub async fn sessions(&self) -> Result<Vec<String>> {
        self.sessions.sessions().await
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }
}
