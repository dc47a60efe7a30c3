//! Upload pipeline
//!
//! validate -> classify -> place in storage -> update the student register.

use intake_classifier::{ClassificationRequest, Classifier, ClassifierResponse};
use intake_records::{DocumentLink, DocumentType, RecordError, Student, StudentId, StudentStore};
use intake_storage::{BackendKind, DriveService, FolderId, StorageError, UploadFile};
use serde::Serialize;
use std::sync::Arc;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Accepted upload MIME types
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
];

/// Upload pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// File failed validation
    #[error("{0}")]
    Rejected(String),

    /// Neither metadata nor filename named a student
    #[error("Could not determine student ID")]
    NoStudentId,

    /// Student register failure
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One uploaded file plus its form metadata
#[derive(Debug, Clone)]
pub struct Upload {
    /// The uploaded file
    pub file: UploadFile,
    /// Student ID from form metadata
    pub student_id: Option<String>,
}

/// What happened to an upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeReceipt {
    /// Human-readable summary
    pub message: String,
    /// Classifier decision in its wire grammar
    pub classification: String,
    /// Parsed action name
    pub action: &'static str,
    /// Resolved student
    pub student_id: StudentId,
    /// Resolved document type
    pub document_type: DocumentType,
    /// Backend that took the file
    pub storage: BackendKind,
    /// Main folder of the student
    pub folder_id: FolderId,
    /// Link appended to the student
    pub document: DocumentLink,
    /// Student after the update
    pub student: Student,
}

/// Best-effort MIME type from a filename extension
#[must_use]
pub fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    Some(match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        _ => return None,
    })
}

/// Check type, size and emptiness of an upload
pub fn validate_upload(file: &UploadFile) -> Result<(), IntakeError> {
    if file.file_name.trim().is_empty() {
        return Err(IntakeError::Rejected("File name is required".into()));
    }
    if file.is_empty() {
        return Err(IntakeError::Rejected("File is empty".into()));
    }
    if file.len() > MAX_UPLOAD_BYTES {
        return Err(IntakeError::Rejected("File exceeds the 50 MB limit".into()));
    }
    let mime = file.mime_type.split(';').next().unwrap_or_default().trim();
    if !ALLOWED_MIME_TYPES.iter().any(|allowed| allowed.eq_ignore_ascii_case(mime)) {
        return Err(IntakeError::Rejected(format!(
            "File type {mime} is not allowed"
        )));
    }
    Ok(())
}

/// Runs uploads through classification, storage and the register
#[derive(Debug, Clone)]
pub struct IntakeService {
    store: Arc<StudentStore>,
    storage: Arc<DriveService>,
    classifier: Arc<dyn Classifier>,
}

impl IntakeService {
    /// Wire the pipeline
    #[must_use]
    pub fn new(
        store: Arc<StudentStore>,
        storage: Arc<DriveService>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            store,
            storage,
            classifier,
        }
    }

    /// Classify and file one upload
    pub async fn ingest(&self, upload: Upload) -> Result<IntakeReceipt, IntakeError> {
        let Upload { file, student_id } = upload;
        validate_upload(&file)?;

        let mut request = ClassificationRequest::new(&file.file_name)
            .with_existing_folders(self.store.students_with_folders().await?);
        if let Some(raw) = student_id {
            request = request.with_student_id(raw);
        }

        let decision = self.classifier.classify(&request).await;
        tracing::info!(
            file = %file.file_name,
            classifier = %self.classifier.kind(),
            decision = %decision,
            "upload classified"
        );
        let (student_id, document_type) = match &decision {
            ClassifierResponse::Store {
                student_id,
                document_type,
            }
            | ClassifierResponse::CreateFolderThenStore {
                student_id,
                document_type,
            } => (student_id.clone(), *document_type),
            ClassifierResponse::Error(_) => return Err(IntakeError::NoStudentId),
        };

        let known_main = self
            .store
            .find(student_id.as_str())
            .await?
            .and_then(|s| s.drive_folder_id)
            .map(FolderId::new);
        let placed = self
            .storage
            .store_document(&student_id, document_type, known_main.as_ref(), &file)
            .await?;

        let student = self.store.ensure_student(&student_id).await?;
        let on_primary = placed.backend == self.storage.backend_kind();
        if on_primary && student.drive_folder_id.as_deref() != Some(placed.folders.main.as_str()) {
            self.store
                .set_drive_folder(student_id.as_str(), placed.folders.main.as_str())
                .await?;
        }

        let document = self
            .store
            .add_document(student_id.as_str(), document_type, placed.file.to_link())
            .await?;
        let student = self.store.get(student_id.as_str()).await?;

        tracing::info!(
            %student_id,
            %document_type,
            storage = %placed.backend,
            link = %document.shareable_link,
            "document filed"
        );

        Ok(IntakeReceipt {
            message: format!("File uploaded and filed as {document_type} for {student_id}"),
            classification: decision.to_string(),
            action: decision.action(),
            student_id,
            document_type,
            storage: placed.backend,
            folder_id: placed.folders.main,
            document,
            student,
        })
    }
}
