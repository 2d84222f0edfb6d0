use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelvaultError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load state from {path}: {reason}")]
    StateLoad { path: PathBuf, reason: String },

    #[error("Failed to save state to {path}: {reason}")]
    StateSave { path: PathBuf, reason: String },

    #[error("Authentication failed: {details}")]
    Auth { details: String },

    #[error("API rate limit exhausted{}", .retry_after_secs.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Invalid repository reference {reference}: {reason}")]
    InvalidRepository { reference: String, reason: String },

    #[error("Invalid command-line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Backup incomplete: {failed_repositories} of {total_repositories} repositories failed")]
    IncompleteBackup {
        failed_repositories: usize,
        total_repositories: usize,
    },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
