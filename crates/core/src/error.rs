// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::types::InboxPartition;

/// Errors raised by a remote conversation source while fetching a page.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{partition} page request failed: {message}")]
    Request {
        partition: InboxPartition,
        message: String,
    },

    #[error("remote rejected credentials: {message}")]
    Unauthorized { message: String },

    #[error("remote transport error: {message}")]
    Transport { message: String },
}

impl SourceError {
    pub fn request(partition: InboxPartition, message: impl Into<String>) -> Self {
        Self::Request {
            partition,
            message: message.into(),
        }
    }
}

/// Errors that can occur while persisting or loading a state blob.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to encode state blob for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write state blob {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create state directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A refresh failed as a whole. The previously committed cache state is
/// untouched in either case.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// A partition page fetch failed; nothing from this refresh was merged.
    #[error("refresh fetch failed: {0}")]
    Fetch(#[from] SourceError),

    /// The merged state was committed in memory but could not be persisted.
    /// The next successful refresh retries persistence.
    #[error("refresh state write failed: {0}")]
    Persist(#[from] PersistError),
}
