use std::sync::Arc;

use tracing::debug;

use docent_core::config::RetrievalConfig;
use docent_core::error::Result;
use docent_core::types::Chunk;
use docent_vector::store::KnowledgeStore;

/// Fixed-bounds similarity search over the knowledge store.
pub struct Retriever {
    store: Arc<KnowledgeStore>,
    config: RetrievalConfig,
}

impl Retriever {
    /// Fails with `Config` when `k == 0` or `k > fetch_k`.
    pub fn new(store: Arc<KnowledgeStore>, config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> RetrievalConfig {
        self.config
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>> {
        let chunks = self
            .store
            .search(query, self.config.k, self.config.fetch_k)
            .await?;
        debug!(query, hits = chunks.len(), "Retrieved context");
        Ok(chunks)
    }
}
