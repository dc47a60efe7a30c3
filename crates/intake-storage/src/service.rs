//! Student-facing storage service
//!
//! [`DriveService`] owns the primary backend chosen at startup, a local
//! fallback and the folder memo. Every call runs on the primary first; a
//! remote failure is logged and the same call is answered by the local
//! backend. The next call tries the primary again.

use crate::backend::{is_local_id, BackendKind, FolderId, StorageBackend, StoredFile, UploadFile};
use crate::cache::FolderCache;
use crate::config::StorageConfig;
use crate::drive::DriveBackend;
use crate::error::StorageError;
use crate::layout::{subfolder_name, StudentFolders};
use crate::local::LocalBackend;
use intake_records::{DocumentType, StudentId};
use serde::Serialize;
use std::sync::Arc;

/// Local folder receiving files whose remote folder was unreachable
const UNFILED_FOLDER: &str = "Unfiled";

/// Where a document ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedDocument {
    /// Folders of the student
    pub folders: StudentFolders,
    /// The stored file
    pub file: StoredFile,
    /// Backend used
    pub backend: BackendKind,
}

/// Build the primary backend from configuration
///
/// Drive when credentials resolve, local otherwise. A credential source
/// that is configured but unusable is logged and treated as absent.
pub async fn backend_from_config(config: &StorageConfig, local: &LocalBackend) -> Arc<dyn StorageBackend> {
    if !config.drive.has_credentials() {
        tracing::info!(dir = %local.root().display(), "no drive credentials, storing files locally");
        return Arc::new(local.clone());
    }

    match DriveBackend::from_config(&config.drive).await {
        Ok(Some(drive)) => {
            tracing::info!(api = %config.drive.api_base, "using drive storage");
            Arc::new(drive)
        }
        Ok(None) => Arc::new(local.clone()),
        Err(e) => {
            tracing::warn!(error = %e, "drive credentials unusable, storing files locally");
            Arc::new(local.clone())
        }
    }
}

/// Folder and file operations with local fallback
#[derive(Debug, Clone)]
pub struct DriveService {
    primary: Arc<dyn StorageBackend>,
    local: Arc<LocalBackend>,
    root: Option<FolderId>,
    folders: FolderCache,
}

impl DriveService {
    /// Create service over a primary backend and a local fallback
    #[must_use]
    pub fn new(primary: Arc<dyn StorageBackend>, local: LocalBackend) -> Self {
        Self {
            primary,
            local: Arc::new(local),
            root: None,
            folders: FolderCache::default(),
        }
    }

    /// Create service that only stores locally
    #[must_use]
    pub fn local_only(local: LocalBackend) -> Self {
        Self::new(Arc::new(local.clone()), local)
    }

    /// Create service from configuration
    pub async fn from_config(config: &StorageConfig) -> Self {
        let local = LocalBackend::new(&config.upload_dir, &config.public_base_url);
        let primary = backend_from_config(config, &local).await;
        let mut service = Self::new(primary, local)
            .with_folder_cache(FolderCache::new(config.folder_cache_capacity));
        if let Some(root) = &config.drive.root_folder_id {
            service = service.with_root_folder(FolderId::new(root.clone()));
        }
        service
    }

    /// With remote root folder for student folders
    #[inline]
    #[must_use]
    pub fn with_root_folder(mut self, root: FolderId) -> Self {
        self.root = Some(root);
        self
    }

    /// With folder memo
    #[inline]
    #[must_use]
    pub fn with_folder_cache(mut self, cache: FolderCache) -> Self {
        self.folders = cache;
        self
    }

    /// Kind of the primary backend
    #[inline]
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.primary.kind()
    }

    /// Local fallback backend
    #[inline]
    #[must_use]
    pub fn local(&self) -> &LocalBackend {
        &self.local
    }

    /// Folder memo
    #[inline]
    #[must_use]
    pub fn folder_cache(&self) -> &FolderCache {
        &self.folders
    }

    fn can_fall_back(&self, error: &StorageError) -> bool {
        self.primary.kind() != BackendKind::Local && error.is_remote()
    }

    fn falling_back(operation: &'static str, error: &StorageError) {
        tracing::warn!(operation, error = %error, "drive call failed, using local storage");
    }

    /// Root under which a backend places student folders
    fn root_for(&self, backend: &dyn StorageBackend) -> Option<&FolderId> {
        match backend.kind() {
            BackendKind::Local => None,
            BackendKind::Drive => self.root.as_ref(),
        }
    }

    /// Create a folder under `parent` (or the root)
    pub async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> Result<FolderId, StorageError> {
        if parent.is_some_and(FolderId::is_local) {
            return self.local.create_folder(name, parent).await;
        }

        let parent = parent.or(self.root_for(self.primary.as_ref()));
        match self.primary.create_folder(name, parent).await {
            Err(e) if self.can_fall_back(&e) => {
                Self::falling_back("create_folder", &e);
                self.local.create_folder(name, None).await
            }
            result => result,
        }
    }

    /// Main folder of a student, if it exists
    pub async fn get_student_folder(
        &self,
        student_id: &StudentId,
    ) -> Result<Option<FolderId>, StorageError> {
        if let Some(folders) = self.folders.get(student_id).await {
            return Ok(Some(folders.main));
        }

        let root = self.root_for(self.primary.as_ref());
        match self.primary.find_folder(student_id.as_str(), root).await {
            Err(e) if self.can_fall_back(&e) => {
                Self::falling_back("get_student_folder", &e);
                self.local.find_folder(student_id.as_str(), None).await
            }
            result => result,
        }
    }

    /// Main folder plus the four type subfolders, creating what is missing
    pub async fn create_student_folder(
        &self,
        student_id: &StudentId,
    ) -> Result<StudentFolders, StorageError> {
        if let Some(folders) = self.folders.get(student_id).await {
            return Ok(folders);
        }

        match self.ensure_folders_on(self.primary.as_ref(), student_id, None).await {
            Ok(folders) => {
                self.folders.insert(student_id.clone(), folders.clone()).await;
                Ok(folders)
            }
            Err(e) if self.can_fall_back(&e) => {
                Self::falling_back("create_student_folder", &e);
                self.ensure_folders_on(self.local.as_ref(), student_id, None).await
            }
            Err(e) => Err(e),
        }
    }

    /// Subfolder for one document type, creating folders as needed
    pub async fn get_document_type_folder(
        &self,
        student_id: &StudentId,
        ty: DocumentType,
    ) -> Result<FolderId, StorageError> {
        let folders = self.create_student_folder(student_id).await?;
        Ok(folders.folder_for(ty).clone())
    }

    /// Upload a file into a folder
    pub async fn upload_file(
        &self,
        folder: &FolderId,
        file: &UploadFile,
    ) -> Result<StoredFile, StorageError> {
        if folder.is_local() {
            return self.local.upload(folder, file).await;
        }

        match self.primary.upload(folder, file).await {
            Err(e) if self.can_fall_back(&e) => {
                Self::falling_back("upload_file", &e);
                let unfiled = self.local.create_folder(UNFILED_FOLDER, None).await?;
                self.local.upload(&unfiled, file).await
            }
            result => result,
        }
    }

    /// Delete a stored file from the backend that issued its ID
    ///
    /// Deletes are not failed over.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), StorageError> {
        if is_local_id(file_id) {
            self.local.delete(file_id).await
        } else if self.primary.kind() == BackendKind::Local {
            Err(StorageError::InvalidId(file_id.to_string()))
        } else {
            self.primary.delete(file_id).await
        }
    }

    /// File a document for a student in one go
    ///
    /// Resolves the student's folders (memo, `known_main`, lookup or
    /// create), then uploads into the type subfolder. If any remote step
    /// fails the whole placement is redone on the local backend.
    pub async fn store_document(
        &self,
        student_id: &StudentId,
        ty: DocumentType,
        known_main: Option<&FolderId>,
        file: &UploadFile,
    ) -> Result<PlacedDocument, StorageError> {
        match self.place_on_primary(student_id, ty, known_main, file).await {
            Ok(placed) => Ok(placed),
            Err(e) if self.can_fall_back(&e) => {
                Self::falling_back("store_document", &e);
                let local_main = known_main.filter(|m| m.is_local());
                let folders = self
                    .ensure_folders_on(self.local.as_ref(), student_id, local_main)
                    .await?;
                let stored = self.local.upload(folders.folder_for(ty), file).await?;
                Ok(PlacedDocument {
                    folders,
                    file: stored,
                    backend: BackendKind::Local,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn place_on_primary(
        &self,
        student_id: &StudentId,
        ty: DocumentType,
        known_main: Option<&FolderId>,
        file: &UploadFile,
    ) -> Result<PlacedDocument, StorageError> {
        let folders = match self.folders.get(student_id).await {
            Some(folders) => folders,
            None => {
                let folders = self
                    .ensure_folders_on(self.primary.as_ref(), student_id, known_main)
                    .await?;
                self.folders.insert(student_id.clone(), folders.clone()).await;
                folders
            }
        };

        let stored = self.primary.upload(folders.folder_for(ty), file).await?;
        tracing::debug!(%student_id, %ty, file_id = %stored.file_id, "document placed");
        Ok(PlacedDocument {
            backend: self.primary.kind(),
            folders,
            file: stored,
        })
    }

    /// Resolve or create a student's folder set on one backend
    ///
    /// `known_main` is only trusted when it belongs to `backend`.
    async fn ensure_folders_on(
        &self,
        backend: &dyn StorageBackend,
        student_id: &StudentId,
        known_main: Option<&FolderId>,
    ) -> Result<StudentFolders, StorageError> {
        let on_local = backend.kind() == BackendKind::Local;
        let main = match known_main.filter(|m| m.is_local() == on_local) {
            Some(main) => main.clone(),
            None => {
                let root = self.root_for(backend);
                find_or_create(backend, student_id.as_str(), root).await?
            }
        };

        let sub = |ty| find_or_create(backend, subfolder_name(ty), Some(&main));
        let assignments = sub(DocumentType::Assignment).await?;
        let id_cards = sub(DocumentType::IdCard).await?;
        let certificates = sub(DocumentType::Certificate).await?;
        let fee_receipts = sub(DocumentType::FeeReceipt).await?;

        tracing::debug!(%student_id, main = %main, backend = %backend.kind(), "student folders ready");
        Ok(StudentFolders {
            main,
            assignments,
            id_cards,
            certificates,
            fee_receipts,
        })
    }
}

async fn find_or_create(
    backend: &dyn StorageBackend,
    name: &str,
    parent: Option<&FolderId>,
) -> Result<FolderId, StorageError> {
    match backend.find_folder(name, parent).await? {
        Some(id) => Ok(id),
        None => backend.create_folder(name, parent).await,
    }
}
