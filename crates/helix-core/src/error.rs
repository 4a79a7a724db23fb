use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::Category;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No index registered for category '{0}'")]
    UnknownIndex(Category),

    #[error("Persistence failure for '{name}': {message}")]
    Persistence { name: String, message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{stage} backend failed: {source}")]
    Backend {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self { Error::Validation(message.into()) }

    pub fn persistence(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Persistence { name: name.into(), message: message.into() }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self { Error::Io { path: path.to_path_buf(), source } }

    /// Wraps an embedding or language-model failure. Never retried here.
    pub fn backend(stage: &'static str, source: anyhow::Error) -> Self {
        Error::Backend { stage, source: source.into() }
    }

    pub fn is_validation(&self) -> bool { matches!(self, Error::Validation(_)) }
}

pub type Result<T> = std::result::Result<T, Error>;
