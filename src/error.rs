//! Error types for node comparison and validation

use thiserror::Error;

/// Result type for node checking operations
pub type Result<T> = std::result::Result<T, CheckError>;

/// Longest prefix of unparsable input kept on a parse error
const SNIPPET_LEN: usize = 200;

/// Node checking errors
///
/// Compliance findings are never reported through this type; they are
/// returned as data inside a `ValidationResult`.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Failed to parse node document: {message}")]
    Parse { message: String, snippet: String },

    #[error("Maximum nesting depth {limit} exceeded at '{path}'")]
    DepthExceeded { path: String, limit: usize },

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CheckError {
    /// Build a parse error from a serde failure, keeping a short snippet of the input
    pub fn parse(err: &serde_json::Error, input: &str) -> Self {
        CheckError::Parse {
            message: err.to_string(),
            snippet: input.chars().take(SNIPPET_LEN).collect(),
        }
    }
}

/// Parse JSON text, mapping failures to [`CheckError::Parse`]
pub fn parse_json(input: &str) -> Result<serde_json::Value> {
    serde_json::from_str(input).map_err(|e| CheckError::parse(&e, input))
}
