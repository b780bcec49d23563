use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DocentError, Result};

/// Top-level configuration for Docent.
///
/// Loaded from `~/.docent/config.toml` by default. Every section falls back to
/// its defaults when absent, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocentConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl DocentConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DocentConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or is invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(DocentError::Config("ingest.chunk_size must be > 0".into()));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(DocentError::Config(format!(
                "ingest.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        self.retrieval.validate()?;
        if self.model.embedding_dim == 0 {
            return Err(DocentError::Config("model.embedding_dim must be > 0".into()));
        }
        StoreBackend::parse(&self.store.backend)?;
        CheckpointBackend::parse(&self.session.checkpoint)?;
        Ok(())
    }

    /// The data directory with a leading `~` expanded to the home directory.
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.general.data_dir)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite checkpoint database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Session identifier used when the caller does not supply one.
    pub default_session: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.docent/data".to_string(),
            log_level: "info".to_string(),
            default_session: "LOCALRAG11".to_string(),
        }
    }
}

/// Model runtime settings (Ollama).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub generation_model: String,
    pub embedding_model: String,
    /// Dimensionality of vectors produced by `embedding_model`.
    pub embedding_dim: usize,
    /// HTTP timeout in seconds; 0 disables it.
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            generation_model: "llama3.2:1b".to_string(),
            embedding_model: "llama3.2:1b".to_string(),
            embedding_dim: 2048,
            request_timeout_secs: 0,
        }
    }
}

/// Document splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 450,
            chunk_overlap: 0,
        }
    }
}

/// Retrieval parameters, fixed for the lifetime of a retriever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the answer composer.
    pub k: usize,
    /// Candidate pool fetched from the vector store before truncating to `k`.
    pub fetch_k: usize,
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(DocentError::Config("retrieval.k must be > 0".into()));
        }
        if self.k > self.fetch_k {
            return Err(DocentError::Config(format!(
                "retrieval.k ({}) must not exceed fetch_k ({})",
                self.k, self.fetch_k
            )));
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: 3, fetch_k: 5 }
    }
}

/// Vector store backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// "memory" or "opensearch".
    pub backend: String,
    pub opensearch_url: String,
    pub index_name: String,
    pub username: String,
    pub password: String,
    /// Verify TLS certificates when talking to OpenSearch over https.
    pub verify_certs: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            opensearch_url: "http://localhost:9200".to_string(),
            index_name: "local-rag".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            verify_certs: false,
        }
    }
}

/// Session and checkpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// "memory" or "sqlite".
    pub checkpoint: String,
    /// Longest accepted user input, in characters.
    pub max_input_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            checkpoint: "memory".to_string(),
            max_input_chars: 4000,
        }
    }
}

/// Parsed form of `store.backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    OpenSearch,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "opensearch" => Ok(StoreBackend::OpenSearch),
            other => Err(DocentError::Config(format!("unknown store backend: {other}"))),
        }
    }
}

/// Parsed form of `session.checkpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointBackend {
    Memory,
    Sqlite,
}

impl CheckpointBackend {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(CheckpointBackend::Memory),
            "sqlite" => Ok(CheckpointBackend::Sqlite),
            other => Err(DocentError::Config(format!(
                "unknown checkpoint backend: {other}"
            ))),
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = DocentConfig::default();
        assert_eq!(config.general.default_session, "LOCALRAG11");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.model.base_url, "http://localhost:11434");
        assert_eq!(config.model.generation_model, "llama3.2:1b");
        assert_eq!(config.ingest.chunk_size, 450);
        assert_eq!(config.ingest.chunk_overlap, 0);
        assert_eq!(config.retrieval, RetrievalConfig { k: 3, fetch_k: 5 });
        assert_eq!(config.store.index_name, "local-rag");
        assert_eq!(config.session.checkpoint, "memory");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config(
            r#"
[retrieval]
k = 2
fetch_k = 8

[store]
backend = "opensearch"
"#,
        );
        let config = DocentConfig::load(file.path()).unwrap();
        assert_eq!(config.retrieval.k, 2);
        assert_eq!(config.retrieval.fetch_k, 8);
        assert_eq!(StoreBackend::parse(&config.store.backend).unwrap(), StoreBackend::OpenSearch);
        assert_eq!(config.ingest.chunk_size, 450);
        assert_eq!(config.general.default_session, "LOCALRAG11");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = DocentConfig::load(file.path()).unwrap();
        assert_eq!(config.model.embedding_dim, 2048);
        assert_eq!(config.session.max_input_chars, 4000);
    }

    #[test]
    fn test_load_rejects_k_above_fetch_k() {
        let file = create_temp_config("[retrieval]\nk = 6\nfetch_k = 5\n");
        let err = DocentConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, DocentError::Config(_)));
    }

    #[test]
    fn test_load_rejects_unknown_backend() {
        let file = create_temp_config("[store]\nbackend = \"qdrant\"\n");
        let err = DocentConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("qdrant"));
    }

    #[test]
    fn test_validate_rejects_overlap_not_below_size() {
        let mut config = DocentConfig::default();
        config.ingest.chunk_overlap = 450;
        assert!(config.validate().is_err());

        config.ingest.chunk_overlap = 0;
        config.ingest.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(DocentConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = DocentConfig::load_or_default(Path::new("/does/not/exist/config.toml"));
        assert_eq!(config.general.data_dir, "~/.docent/data");
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = DocentConfig::default();
        config.session.checkpoint = "sqlite".to_string();
        config.save(&path).unwrap();

        let reloaded = DocentConfig::load(&path).unwrap();
        assert_eq!(reloaded.session.checkpoint, "sqlite");
        assert_eq!(reloaded.retrieval, config.retrieval);
    }

    #[test]
    fn test_backend_parsing_is_case_insensitive() {
        assert_eq!(StoreBackend::parse("Memory").unwrap(), StoreBackend::Memory);
        assert_eq!(
            CheckpointBackend::parse("SQLite").unwrap(),
            CheckpointBackend::Sqlite
        );
        assert!(CheckpointBackend::parse("redis").is_err());
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/var/lib/docent"), PathBuf::from("/var/lib/docent"));
        assert!(expand_home("~/data").ends_with("data"));
    }
}
