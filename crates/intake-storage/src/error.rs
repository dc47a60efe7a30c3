//! Error types for document storage

use std::path::PathBuf;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No usable drive credentials
    #[error("drive credentials are not configured")]
    MissingCredentials,

    /// Drive API answered with an error
    #[error("drive API error: {message}")]
    Remote {
        /// HTTP status, when the server answered at all
        status: Option<u16>,
        /// Response body or description
        message: String,
    },

    /// Request never completed
    #[error("drive transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local filesystem failure
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Folder or file ID that cannot belong to this backend
    #[error("invalid storage id: {0}")]
    InvalidId(String),

    /// Folder or file does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Response body did not have the expected shape
    #[error("malformed drive response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StorageError {
    /// Create I/O error for a path
    #[inline]
    #[must_use]
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create remote error from a status and body
    #[inline]
    #[must_use]
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Whether the failure came from the remote service
    ///
    /// Remote failures are the ones answered by the local fallback.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials | Self::Remote { .. } | Self::Transport(_) | Self::Decode(_)
        )
    }

    /// Whether the target was missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
