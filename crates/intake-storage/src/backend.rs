//! Storage backend seam
//!
//! A [`StorageBackend`] knows four things: finding a folder by name,
//! creating one, uploading a file into one, and deleting a file. Everything
//! student-shaped lives in [`crate::service`].

use crate::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use intake_records::NewDocumentLink;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of folder and file IDs minted by the local backend
pub const LOCAL_ID_PREFIX: &str = "mock-";

/// Which backend holds an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote cloud drive
    Drive,
    /// Local directory served by this process
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drive => "drive",
            Self::Local => "local",
        })
    }
}

/// Opaque folder identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    /// Wrap a backend-issued ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw ID
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the local backend issued this ID
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        is_local_id(&self.0)
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FolderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for FolderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether a folder or file ID was issued by the local backend
#[inline]
#[must_use]
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

/// File content to store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original filename
    pub file_name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Content
    pub bytes: Bytes,
}

impl UploadFile {
    /// Create upload payload
    #[must_use]
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Content length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the content is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Backend file ID
    pub file_id: String,
    /// Original upload filename
    pub file_name: String,
    /// Link for viewing
    pub shareable_link: String,
    /// Direct download link
    pub download_link: String,
    /// Backend that stored the file
    pub backend: BackendKind,
}

impl StoredFile {
    /// Link payload for the student register
    #[must_use]
    pub fn to_link(&self) -> NewDocumentLink {
        NewDocumentLink {
            file_name: self.file_name.clone(),
            shareable_link: self.shareable_link.clone(),
            download_link: self.download_link.clone(),
            file_id: self.file_id.clone(),
        }
    }
}

/// Folder and file operations of one storage provider
#[async_trait]
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Backend kind
    fn kind(&self) -> BackendKind;

    /// Find a folder by exact name under `parent` (or the backend root)
    async fn find_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> Result<Option<FolderId>, StorageError>;

    /// Create a folder under `parent` (or the backend root)
    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> Result<FolderId, StorageError>;

    /// Store a file in `folder`
    async fn upload(&self, folder: &FolderId, file: &UploadFile) -> Result<StoredFile, StorageError>;

    /// Delete a stored file
    async fn delete(&self, file_id: &str) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_ids_are_recognised() {
        assert!(FolderId::new("mock-ST102").is_local());
        assert!(!FolderId::new("1AbCdEf").is_local());
        assert!(is_local_id("mock-ST102/Assignments/a.pdf"));
    }

    #[test]
    fn stored_file_becomes_link() {
        let stored = StoredFile {
            file_id: "abc".into(),
            file_name: "a.pdf".into(),
            shareable_link: "https://view".into(),
            download_link: "https://dl".into(),
            backend: BackendKind::Drive,
        };
        let link = stored.to_link();
        assert_eq!(link.file_id, "abc");
        assert_eq!(link.download_link, "https://dl");
    }

    #[test]
    fn backend_kind_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&BackendKind::Drive).unwrap(), "\"drive\"");
        assert_eq!(BackendKind::Local.to_string(), "local");
    }
}
