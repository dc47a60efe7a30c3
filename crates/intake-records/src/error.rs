//! Error types for the student register

use std::path::PathBuf;

/// Student register errors
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Request failed validation (missing or malformed field)
    #[error("{0}")]
    Validation(String),

    /// No student / document matches the lookup key
    #[error("{0} not found")]
    NotFound(String),

    /// A student with the same ID already exists
    #[error("student {0} already exists")]
    Conflict(String),

    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing file is not a valid register document
    #[error("corrupt register: {0}")]
    Serde(#[from] serde_json::Error),
}

impl RecordError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if the error is caused by the caller (as opposed to storage)
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::Conflict(_)
        )
    }

    /// Check if error is a missing record
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
