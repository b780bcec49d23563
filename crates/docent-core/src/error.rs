use thiserror::Error;

/// Top-level error type for Docent.
///
/// The variants follow the pipeline stages: loading documents, writing to and
/// reading from the knowledge store, embedding, and generation. Backend crates
/// map their own failures into the variant matching the operation that failed,
/// so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("Knowledge store write failed: {0}")]
    StoreWrite(String),

    #[error("Knowledge store read failed: {0}")]
    StoreRead(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Input cannot be empty")]
    EmptyInput,

    #[error("Input exceeds maximum length of {limit} characters")]
    InputTooLong { limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for DocentError {
    fn from(err: toml::de::Error) -> Self {
        DocentError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DocentError {
    fn from(err: toml::ser::Error) -> Self {
        DocentError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DocentError {
    fn from(err: serde_json::Error) -> Self {
        DocentError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Docent operations.
pub type Result<T> = std::result::Result<T, DocentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(DocentError, &str)> = vec![
            (
                DocentError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                DocentError::Load("not a pdf".to_string()),
                "Failed to load document: not a pdf",
            ),
            (
                DocentError::StoreWrite("connection refused".to_string()),
                "Knowledge store write failed: connection refused",
            ),
            (
                DocentError::StoreRead("index missing".to_string()),
                "Knowledge store read failed: index missing",
            ),
            (
                DocentError::Embedding("model not found".to_string()),
                "Embedding failed: model not found",
            ),
            (
                DocentError::Generation("timeout".to_string()),
                "Generation failed: timeout",
            ),
            (
                DocentError::Checkpoint("locked".to_string()),
                "Checkpoint error: locked",
            ),
            (DocentError::EmptyInput, "Input cannot be empty"),
            (
                DocentError::InputTooLong { limit: 4000 },
                "Input exceeds maximum length of 4000 characters",
            ),
            (
                DocentError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DocentError = io_err.into();
        assert!(matches!(err, DocentError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let docent_err: DocentError = err.unwrap_err().into();
        assert!(matches!(docent_err, DocentError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let docent_err: DocentError = err.unwrap_err().into();
        assert!(matches!(docent_err, DocentError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
