//! Knowledge store: a vector store paired with the embedding service used to
//! both index chunks and embed queries.

use std::sync::Arc;

use tracing::{debug, info, warn};

use docent_core::error::DocentError;
use docent_core::types::Chunk;

use crate::embedding::DynEmbeddingService;
use crate::index::{ScoredChunk, VectorStore};

pub struct KnowledgeStore {
    backend: Arc<dyn VectorStore>,
    embedder: Box<dyn DynEmbeddingService>,
}

impl KnowledgeStore {
    pub fn new(backend: Arc<dyn VectorStore>, embedder: impl DynEmbeddingService + 'static) -> Self {
        Self {
            backend,
            embedder: Box::new(embedder),
        }
    }

    pub fn new_dyn(backend: Arc<dyn VectorStore>, embedder: Box<dyn DynEmbeddingService>) -> Self {
        Self { backend, embedder }
    }

    /// Create the index if it does not exist yet, seeding it with a single
    /// placeholder chunk. The placeholder is never returned by `search`.
    pub async fn ensure_initialized(&self) -> Result<(), DocentError> {
        if self.backend.index_exists().await? {
            debug!("Knowledge index already exists");
            return Ok(());
        }

        let dimensions = self.embedder.dimensions();
        self.backend.create_index(dimensions).await?;
        self.backend
            .add(&Chunk::placeholder(), vec![0.0; dimensions])
            .await?;
        info!(dimensions, "Created knowledge index with placeholder entry");
        Ok(())
    }

    /// Embed and store chunks. Returns how many were added.
    ///
    /// Chunks are added one at a time; a failure partway leaves the earlier
    /// chunks stored.
    pub async fn add(&self, chunks: &[Chunk]) -> Result<usize, DocentError> {
        let mut added = 0;
        for chunk in chunks {
            let embedding = self.embedder.embed_boxed(&chunk.content).await?;
            self.backend.add(chunk, embedding).await?;
            added += 1;
        }
        debug!(added, "Added chunks to knowledge store");
        Ok(added)
    }

    /// Up to `k` chunks most similar to `query`, with scores, best first.
    ///
    /// `fetch_k + 1` candidates are pulled from the backend so the
    /// placeholder never takes a slot; after dropping it the list is cut to
    /// `fetch_k` and then `k`.
    pub async fn search_scored(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
    ) -> Result<Vec<ScoredChunk>, DocentError> {
        if k == 0 || k > fetch_k {
            return Err(DocentError::Config(format!(
                "Invalid retrieval bounds: k={} fetch_k={}",
                k, fetch_k
            )));
        }

        let query_vector = self.embedder.embed_boxed(query).await?;
        let mut hits = self
            .backend
            .similarity_search(&query_vector, fetch_k + 1)
            .await?;

        hits.retain(|hit| !hit.chunk.is_placeholder());
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(fetch_k);
        hits.truncate(k);

        if hits.is_empty() {
            warn!("Search returned no chunks; the knowledge store may be empty");
        }
        Ok(hits)
    }

    /// Up to `k` chunks most similar to `query`, best first.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
    ) -> Result<Vec<Chunk>, DocentError> {
        Ok(self
            .search_scored(query, k, fetch_k)
            .await?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect())
    }

    /// Number of stored chunks, excluding the placeholder.
    pub async fn len(&self) -> Result<usize, DocentError> {
        self.backend.len().await
    }

    pub async fn is_empty(&self) -> Result<bool, DocentError> {
        Ok(self.len().await? == 0)
    }
}
