use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Outcome of a single failed network call.
///
/// Callers decide the fallback (cached data, skipped source, empty
/// enrichment) by matching on this instead of swallowing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unsupported endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, Error)]
pub enum PluginSearchError {
    #[error("Configuration file not found: {path} (run `plugin-search config init`)")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    #[error("Invalid marketplace name: {name} (use letters, digits, '-' and '_')")]
    InvalidMarketplaceName { name: String },

    #[error("Failed to fetch marketplace '{source_name}': {error}")]
    Fetch {
        source_name: String,
        error: FetchError,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, PluginSearchError>;

impl PluginSearchError {
    /// Process exit status; any error that reaches the CLI exits with 1
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_exit_code() {
        let err = PluginSearchError::ConfigNotFound {
            path: PathBuf::from("/nowhere/config.toml"),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("config init"));
    }

    #[test]
    fn test_fetch_error_names_source() {
        let err = PluginSearchError::Fetch {
            source_name: "official".to_string(),
            error: FetchError::Status(404),
        };
        assert!(err.to_string().contains("official"));
        assert!(err.to_string().contains("404"));
    }
}
