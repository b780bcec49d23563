//! Docent vector crate - document ingestion, embeddings, and the knowledge store.
//!
//! Provides a recursive text splitter and document loader, an embedding
//! service trait with Ollama and mock implementations, in-memory and
//! OpenSearch vector stores, and the knowledge store that ties an embedder
//! to a vector store.

pub mod embedding;
pub mod http;
pub mod index;
pub mod ingest;
pub mod opensearch;
pub mod splitter;
pub mod store;

pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding, OllamaEmbedding};
pub use index::{InMemoryVectorIndex, ScoredChunk, VectorStore};
pub use ingest::{load_document, DocumentIngestor, LoadedDocument, LoadedSection};
pub use opensearch::OpenSearchVectorStore;
pub use splitter::RecursiveTextSplitter;
pub use store::KnowledgeStore;
