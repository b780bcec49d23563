//! Vector store boundary and the in-memory implementation.
//!
//! The in-memory index does brute-force cosine similarity. All operations are
//! O(n) for search, which is acceptable for a single-user knowledge base.
//! Larger corpora go to the OpenSearch backend.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use docent_core::error::DocentError;
use docent_core::types::Chunk;

/// A chunk returned from a similarity search with its score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Higher is more similar.
    pub score: f64,
}

/// A vector index holding chunks and their embeddings.
///
/// Implementations must fail `add` and `similarity_search` with
/// `StoreWrite`/`StoreRead` rather than panicking when the backend is
/// unreachable.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether the index has been created.
    async fn index_exists(&self) -> Result<bool, DocentError>;

    /// Create the index for vectors of the given dimensionality.
    /// Creating an index that already exists is not an error.
    async fn create_index(&self, dimensions: usize) -> Result<(), DocentError>;

    /// Insert a chunk with its embedding.
    async fn add(&self, chunk: &Chunk, embedding: Vec<f32>) -> Result<(), DocentError>;

    /// Return up to `limit` nearest chunks, most similar first.
    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, DocentError>;

    /// Number of stored chunks, placeholder excluded.
    async fn len(&self) -> Result<usize, DocentError>;
}

#[derive(Debug, Clone)]
struct VectorEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
    /// Insertion order; breaks score ties so results are stable.
    seq: u64,
}

#[derive(Debug, Default)]
struct IndexState {
    entries: HashMap<Uuid, VectorEntry>,
    dimensions: usize,
    next_seq: u64,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Thread-safe via interior RwLock. `None` means the index has not been
/// created yet.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorIndex {
    state: Arc<RwLock<Option<IndexState>>>,
}

impl InMemoryVectorIndex {
    /// Create a handle with no index yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored chunk in insertion order.
    pub fn chunks(&self) -> Vec<Chunk> {
        let guard = match self.state.read() {
            Ok(g) => g,
            Err(_) => return Vec::new(),
        };
        let Some(state) = guard.as_ref() else {
            return Vec::new();
        };
        let mut entries: Vec<&VectorEntry> = state.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.chunk.clone()).collect()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorIndex {
    async fn index_exists(&self) -> Result<bool, DocentError> {
        let guard = self
            .state
            .read()
            .map_err(|e| DocentError::StoreRead(format!("Lock poisoned: {}", e)))?;
        Ok(guard.is_some())
    }

    async fn create_index(&self, dimensions: usize) -> Result<(), DocentError> {
        let mut guard = self
            .state
            .write()
            .map_err(|e| DocentError::StoreWrite(format!("Lock poisoned: {}", e)))?;
        if guard.is_none() {
            *guard = Some(IndexState {
                dimensions,
                ..Default::default()
            });
        }
        Ok(())
    }

    async fn add(&self, chunk: &Chunk, embedding: Vec<f32>) -> Result<(), DocentError> {
        let mut guard = self
            .state
            .write()
            .map_err(|e| DocentError::StoreWrite(format!("Lock poisoned: {}", e)))?;
        let state = guard
            .as_mut()
            .ok_or_else(|| DocentError::StoreWrite("Index has not been created".to_string()))?;

        if embedding.len() != state.dimensions {
            return Err(DocentError::StoreWrite(format!(
                "Embedding has {} dimensions, index expects {}",
                embedding.len(),
                state.dimensions
            )));
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            chunk.id,
            VectorEntry {
                chunk: chunk.clone(),
                embedding,
                seq,
            },
        );
        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, DocentError> {
        let guard = self
            .state
            .read()
            .map_err(|e| DocentError::StoreRead(format!("Lock poisoned: {}", e)))?;
        let state = guard
            .as_ref()
            .ok_or_else(|| DocentError::StoreRead("Index has not been created".to_string()))?;

        let mut scored: Vec<(u64, ScoredChunk)> = state
            .entries
            .values()
            .map(|entry| {
                (
                    entry.seq,
                    ScoredChunk {
                        chunk: entry.chunk.clone(),
                        score: cosine_similarity(query, &entry.embedding),
                    },
                )
            })
            .collect();

        // Descending score, then insertion order.
        scored.sort_by(|(seq_a, a), (seq_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(seq_a.cmp(seq_b))
        });
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    async fn len(&self) -> Result<usize, DocentError> {
        let guard = self
            .state
            .read()
            .map_err(|e| DocentError::StoreRead(format!("Lock poisoned: {}", e)))?;
        Ok(guard
            .as_ref()
            .map(|s| s.entries.values().filter(|e| !e.chunk.is_placeholder()).count())
            .unwrap_or(0))
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
