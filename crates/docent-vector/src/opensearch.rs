//! OpenSearch k-NN backend.
//!
//! Documents are stored as `{vector_field, text, metadata}` in a single index
//! using the lucene HNSW engine with L2 distance. OpenSearch reports L2 hits
//! as `1 / (1 + d^2)`, so a larger `_score` still means more similar.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use docent_core::config::StoreConfig;
use docent_core::error::DocentError;
use docent_core::types::{Chunk, ChunkOffset, PLACEHOLDER_SOURCE};

use crate::http;
use crate::index::{ScoredChunk, VectorStore};

const VECTOR_FIELD: &str = "vector_field";
const TEXT_FIELD: &str = "text";
const METADATA_FIELD: &str = "metadata";

#[derive(Debug, Clone)]
pub struct OpenSearchVectorStore {
    client: Client,
    base_url: String,
    index_name: String,
    username: String,
    password: String,
}

impl OpenSearchVectorStore {
    pub fn new(client: Client, base_url: &str, index_name: &str, username: &str, password: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index_name: index_name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Build from the `[store]` config section.
    pub fn from_config(config: &StoreConfig, timeout_secs: u64) -> Result<Self, DocentError> {
        let client = http::build_client(timeout_secs, !config.verify_certs)?;
        Ok(Self::new(
            client,
            &config.opensearch_url,
            &config.index_name,
            &config.username,
            &config.password,
        ))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}{}", self.base_url, self.index_name, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        if self.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.username, Some(&self.password))
        }
    }
}

/// Index creation body: k-NN enabled, HNSW on lucene with L2 distance.
pub(crate) fn index_body(dimensions: usize) -> Value {
    json!({
        "settings": { "index": { "knn": true } },
        "mappings": {
            "properties": {
                VECTOR_FIELD: {
                    "type": "knn_vector",
                    "dimension": dimensions,
                    "method": {
                        "name": "hnsw",
                        "space_type": "l2",
                        "engine": "lucene"
                    }
                },
                TEXT_FIELD: { "type": "text" },
                METADATA_FIELD: { "type": "object" }
            }
        }
    })
}

pub(crate) fn document_body(chunk: &Chunk, embedding: &[f32]) -> Value {
    json!({
        VECTOR_FIELD: embedding,
        TEXT_FIELD: chunk.content,
        METADATA_FIELD: {
            "source": chunk.source_id,
            "page": chunk.offset.page,
            "chunk_index": chunk.offset.chunk_index,
            "char_offset": chunk.offset.char_offset,
        }
    })
}

pub(crate) fn knn_query(vector: &[f32], limit: usize) -> Value {
    json!({
        "size": limit,
        "query": {
            "knn": {
                VECTOR_FIELD: { "vector": vector, "k": limit }
            }
        }
    })
}

/// `_count` body matching every document except the placeholder.
pub(crate) fn count_query() -> Value {
    json!({
        "query": {
            "bool": {
                "must_not": [
                    { "term": { "metadata.source.keyword": PLACEHOLDER_SOURCE } }
                ]
            }
        }
    })
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Deserialize)]
struct HitSource {
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: HitMetadata,
}

#[derive(Deserialize, Default)]
struct HitMetadata {
    #[serde(default)]
    source: String,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    chunk_index: usize,
    #[serde(default)]
    char_offset: usize,
}

pub(crate) fn parse_search_response(body: &str) -> Result<Vec<ScoredChunk>, DocentError> {
    let parsed: SearchResponse = serde_json::from_str(body)
        .map_err(|e| DocentError::StoreRead(format!("Malformed search response: {}", e)))?;

    Ok(parsed
        .hits
        .hits
        .into_iter()
        .map(|hit| {
            let id = Uuid::parse_str(&hit.id).unwrap_or_else(|_| Uuid::new_v4());
            ScoredChunk {
                chunk: Chunk {
                    id,
                    source_id: hit.source.metadata.source,
                    offset: ChunkOffset {
                        page: hit.source.metadata.page,
                        chunk_index: hit.source.metadata.chunk_index,
                        char_offset: hit.source.metadata.char_offset,
                    },
                    content: hit.source.text,
                },
                score: hit.score.unwrap_or(0.0),
            }
        })
        .collect())
}

async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("status {}: {}", status, body)
}

#[async_trait]
impl VectorStore for OpenSearchVectorStore {
    async fn index_exists(&self) -> Result<bool, DocentError> {
        let response = self
            .request(reqwest::Method::HEAD, "")
            .send()
            .await
            .map_err(|e| DocentError::StoreRead(format!("OpenSearch unreachable: {}", e)))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(DocentError::StoreRead(error_body(response).await)),
        }
    }

    async fn create_index(&self, dimensions: usize) -> Result<(), DocentError> {
        let response = self
            .request(reqwest::Method::PUT, "")
            .json(&index_body(dimensions))
            .send()
            .await
            .map_err(|e| DocentError::StoreWrite(format!("OpenSearch unreachable: {}", e)))?;

        if response.status().is_success() {
            info!(index = %self.index_name, dimensions, "Created OpenSearch index");
            return Ok(());
        }

        let message = error_body(response).await;
        if message.contains("resource_already_exists_exception") {
            debug!(index = %self.index_name, "Index created concurrently");
            return Ok(());
        }
        Err(DocentError::StoreWrite(message))
    }

    async fn add(&self, chunk: &Chunk, embedding: Vec<f32>) -> Result<(), DocentError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/_doc/{}?refresh=true", chunk.id))
            .json(&document_body(chunk, &embedding))
            .send()
            .await
            .map_err(|e| DocentError::StoreWrite(format!("OpenSearch unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(DocentError::StoreWrite(error_body(response).await));
        }
        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, DocentError> {
        let response = self
            .request(reqwest::Method::POST, "/_search")
            .json(&knn_query(query, limit))
            .send()
            .await
            .map_err(|e| DocentError::StoreRead(format!("OpenSearch unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(DocentError::StoreRead(error_body(response).await));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DocentError::StoreRead(e.to_string()))?;
        parse_search_response(&body)
    }

    async fn len(&self) -> Result<usize, DocentError> {
        let response = self
            .request(reqwest::Method::POST, "/_count")
            .json(&count_query())
            .send()
            .await
            .map_err(|e| DocentError::StoreRead(format!("OpenSearch unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(DocentError::StoreRead(error_body(response).await));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DocentError::StoreRead(e.to_string()))?;
        Ok(body.get("count").and_then(Value::as_u64).unwrap_or(0) as usize)
    }
}
