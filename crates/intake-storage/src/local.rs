//! Local-disk backend
//!
//! Folders are directories under a root; IDs are `mock-` followed by the
//! slash-separated path relative to that root. Files are served by the HTTP
//! layer under `/uploads/`.

use crate::backend::{BackendKind, FolderId, StorageBackend, StoredFile, UploadFile, LOCAL_ID_PREFIX};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use ulid::Ulid;

/// Directory-backed storage
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBackend {
    /// Create backend rooted at `root`, linking files under `public_base_url`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a local folder or file ID
    pub fn resolve(&self, id: &str) -> Result<PathBuf, StorageError> {
        let parts = parse_id(id)?;
        Ok(parts.iter().fold(self.root.clone(), |path, part| path.join(part)))
    }

    /// Relative components of the parent, or the root for foreign parents
    fn parent_parts(parent: Option<&FolderId>) -> Result<Vec<String>, StorageError> {
        match parent {
            Some(parent) if parent.is_local() => parse_id(parent.as_str()),
            Some(parent) => {
                tracing::debug!(%parent, "non-local parent, using upload root");
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    fn link(&self, parts: &[String]) -> String {
        format!("{}/uploads/{}", self.public_base_url, parts.join("/"))
    }

    fn join(&self, parts: &[String]) -> PathBuf {
        parts.iter().fold(self.root.clone(), |path, part| path.join(part))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn find_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> Result<Option<FolderId>, StorageError> {
        let mut parts = Self::parent_parts(parent)?;
        parts.push(sanitize(name));
        let path = self.join(&parts);

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(Some(FolderId::new(make_id(&parts)))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io_error(path, e)),
        }
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> Result<FolderId, StorageError> {
        let mut parts = Self::parent_parts(parent)?;
        parts.push(sanitize(name));
        let path = self.join(&parts);

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| StorageError::io_error(&path, e))?;
        let id = FolderId::new(make_id(&parts));
        tracing::debug!(folder = %id, "local folder ready");
        Ok(id)
    }

    async fn upload(&self, folder: &FolderId, file: &UploadFile) -> Result<StoredFile, StorageError> {
        if !folder.is_local() {
            return Err(StorageError::InvalidId(folder.to_string()));
        }
        let mut parts = parse_id(folder.as_str())?;
        let dir = self.join(&parts);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io_error(&dir, e))?;

        let stored = stored_name(&file.file_name);
        let path = dir.join(&stored);
        // A name collision fails instead of overwriting
        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::io_error(&path, e))?;
        out.write_all(&file.bytes)
            .await
            .map_err(|e| StorageError::io_error(&path, e))?;
        out.flush()
            .await
            .map_err(|e| StorageError::io_error(&path, e))?;
        parts.push(stored);

        let link = self.link(&parts);
        tracing::info!(path = %path.display(), bytes = file.len(), "file stored locally");
        Ok(StoredFile {
            file_id: make_id(&parts),
            file_name: file.file_name.clone(),
            shareable_link: link.clone(),
            download_link: link,
            backend: BackendKind::Local,
        })
    }

    async fn delete(&self, file_id: &str) -> Result<(), StorageError> {
        let path = self.resolve(file_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "local file deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("File {file_id}")))
            }
            Err(e) => Err(StorageError::io_error(path, e)),
        }
    }
}

/// On-disk name of an upload: timestamp, ULID, then the sanitized name
fn stored_name(file_name: &str) -> String {
    format!(
        "{}_{}_{}",
        Utc::now().format("%Y%m%d_%H%M%S%3f"),
        Ulid::new(),
        sanitize(file_name)
    )
}

/// Make a name safe as a single path component
///
/// Keeps ASCII alphanumerics, `-`, `_` and `.`; spaces become `_`, anything
/// else is dropped. Leading dots are stripped so the result is never `.`,
/// `..` or hidden.
#[must_use]
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') => Some(c),
            ' ' => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn make_id(parts: &[String]) -> String {
    format!("{LOCAL_ID_PREFIX}{}", parts.join("/"))
}

fn parse_id(id: &str) -> Result<Vec<String>, StorageError> {
    let rel = id
        .strip_prefix(LOCAL_ID_PREFIX)
        .ok_or_else(|| StorageError::InvalidId(id.to_string()))?;
    let parts: Vec<String> = rel.split('/').map(str::to_string).collect();
    if parts.iter().any(|p| p.is_empty() || *p != sanitize(p)) {
        return Err(StorageError::InvalidId(id.to_string()));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize("ID Cards"), "ID_Cards");
        assert_eq!(sanitize("ST102_Math_HW.pdf"), "ST102_Math_HW.pdf");
        assert_eq!(sanitize("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize("..."), "file");
        assert_eq!(sanitize(""), "file");
    }

    #[test]
    fn ids_cannot_escape_the_root() {
        assert!(parse_id("mock-ST102/Assignments").is_ok());
        assert!(parse_id("mock-../secret").is_err());
        assert!(parse_id("mock-ST102//x").is_err());
        assert!(parse_id("mock-").is_err());
        assert!(parse_id("1AbC").is_err());
    }

    #[test]
    fn resolve_joins_under_root() {
        let backend = LocalBackend::new("/srv/uploads", "http://host/");
        assert_eq!(
            backend.resolve("mock-ST1/Certificates").unwrap(),
            PathBuf::from("/srv/uploads/ST1/Certificates")
        );
        assert_eq!(
            backend.link(&["ST1".into(), "a.pdf".into()]),
            "http://host/uploads/ST1/a.pdf"
        );
    }
}
