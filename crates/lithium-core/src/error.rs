//! Error types shared by every lithium crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LithiumError {
    #[error("Failed to parse {file_type}: {source}")]
    ParseError {
        file_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("No fetcher registered for scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("Fetching '{url}' failed with status {status}")]
    FetchFailure { url: String, status: u16 },

    #[error("HTTP request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Resolution failed: {0}")]
    Resolution(String),

    #[error("Classpath error: {0}")]
    Classpath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LithiumError>;
