//! Embedding service trait and implementations.
//!
//! - `OllamaEmbedding` calls the Ollama `/api/embed` endpoint. This is the
//!   production embedding backend.
//! - `MockEmbedding` provides deterministic hash-based vectors for testing.
//!
//! Indexing and querying must go through the same service instance, otherwise
//! similarity scores compare vectors from different spaces.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use docent_core::config::ModelConfig;
use docent_core::error::DocentError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;

/// Service for generating text embeddings.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, DocentError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// `EmbeddingService::embed` returns `impl Future`, which is not object-safe.
/// This trait boxes the future so `Box<dyn DynEmbeddingService>` can be stored
/// without generics. Every `EmbeddingService` implements it through the
/// blanket impl below.
pub trait DynEmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text (boxed future).
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, DocentError>> + Send + 'a>>;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, DocentError>> + Send + 'a>> {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// OllamaEmbedding - HTTP embedding endpoint
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding service backed by a running Ollama server.
#[derive(Clone, Debug)]
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedding {
    pub fn new(client: Client, base_url: &str, model: &str, dimensions: usize) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        }
    }

    /// Build from the `[model]` config section.
    pub fn from_config(config: &ModelConfig) -> Result<Self, DocentError> {
        let client = http::build_client(config.request_timeout_secs, false)?;
        Ok(Self::new(
            client,
            &config.base_url,
            &config.embedding_model,
            config.embedding_dim,
        ))
    }
}

impl EmbeddingService for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DocentError> {
        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::Embedding(format!("Ollama unreachable at {}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DocentError::Embedding(format!(
                "Ollama embed request failed with status {}: {}. Make sure Ollama is running with: ollama serve",
                status, body
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| DocentError::Embedding(format!("Malformed embed response: {}", e)))?;

        let vector = parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| DocentError::Embedding("No embedding returned".to_string()))?;

        if vector.len() != self.dimensions {
            return Err(DocentError::Embedding(format!(
                "Model {} returned {} dimensions, expected {}",
                self.model,
                vector.len(),
                self.dimensions
            )));
        }

        debug!(model = %self.model, chars = text.len(), "Embedded text");
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock embedding service that returns deterministic 384-dimensional vectors.
///
/// The output is derived from a hash of the input text, so identical inputs
/// always produce identical outputs and score 1.0 against each other.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding;

impl MockEmbedding {
    pub fn new() -> Self {
        Self
    }

    fn hash_to_vector(text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(384);
        for i in 0..384 {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        // Unit length, like the vectors Ollama returns.
        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DocentError> {
        if text.is_empty() {
            return Err(DocentError::Embedding("Cannot embed empty text".to_string()));
        }
        Ok(Self::hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        384
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedding_dimension() {
        let service = MockEmbedding::new();
        let vec = service.embed("hello world").await.unwrap();
        assert_eq!(vec.len(), 384);
        assert_eq!(EmbeddingService::dimensions(&service), 384);
    }

    #[tokio::test]
    async fn test_mock_embedding_deterministic() {
        let service = MockEmbedding::new();
        let v1 = service.embed("same text").await.unwrap();
        let v2 = service.embed("same text").await.unwrap();
        assert_eq!(v1, v2);
    }

    #[tokio::test]
    async fn test_mock_embedding_different_inputs() {
        let service = MockEmbedding::new();
        let v1 = service.embed("text one").await.unwrap();
        let v2 = service.embed("text two").await.unwrap();
        assert_ne!(v1, v2);
    }

    #[tokio::test]
    async fn test_mock_embedding_empty_text() {
        let service = MockEmbedding::new();
        let result = service.embed("").await;
        assert!(matches!(result, Err(DocentError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_mock_embedding_is_unit_length() {
        let service = MockEmbedding::new();
        let vec = service.embed("norm check").await.unwrap();
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_dyn_dispatch_matches_static() {
        let boxed: Box<dyn DynEmbeddingService> = Box::new(MockEmbedding::new());
        let via_dyn = boxed.embed_boxed("abc").await.unwrap();
        let direct = MockEmbedding::new().embed("abc").await.unwrap();
        assert_eq!(via_dyn, direct);
        assert_eq!(boxed.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_ollama_unreachable_is_embedding_error() {
        let service = OllamaEmbedding::new(Client::new(), "http://127.0.0.1:9/", "m", 8);
        let err = service.embed("hello").await.unwrap_err();
        assert!(matches!(err, DocentError::Embedding(_)));
    }

    #[test]
    fn test_ollama_trims_trailing_slash() {
        let service = OllamaEmbedding::new(Client::new(), "http://localhost:11434/", "m", 8);
        assert_eq!(service.base_url, "http://localhost:11434");
    }
}
