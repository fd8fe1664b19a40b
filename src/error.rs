use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the extraction pipeline. Nothing is retried; every
/// variant propagates to the caller.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No script element containing \"{marker}\" found")]
    NotFound { marker: &'static str },

    #[error("Script element has no <!-- ... --> wrapped payload")]
    MalformedPayload,

    #[error("Embedded payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unexpected document shape, missing or invalid: {path}")]
    SchemaMismatch { path: String },

    #[error("Listing is missing required field: {0}")]
    RequiredFieldMissing(String),

    #[error("Listing field {key} is not a valid {expected}")]
    InvalidField { key: String, expected: &'static str },

    #[error("Unknown listing field: {0}")]
    UnknownField(String),

    #[error("Cache file not found: {}", .0.display())]
    CacheMiss(PathBuf),

    #[error("Cache file {} could not be accessed: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache file {} is not valid JSON: {source}", .path.display())]
    CorruptCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Transport(err.to_string())
    }
}
