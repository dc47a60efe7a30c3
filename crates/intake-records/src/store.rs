//! Flat-file student store
//!
//! The whole register lives in one JSON document. Every operation reloads the
//! document from disk; mutations rewrite it through a sibling temp file and a
//! rename. An async mutex serialises read-modify-write cycles inside one
//! process; nothing guards against a second process writing the same file.

use crate::error::RecordError;
use crate::model::{
    DocumentLink, DocumentSet, DocumentType, NewDocumentLink, NewStudent, Student, StudentId,
    StudentPatch, StudentStats,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// On-disk document layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegisterFile {
    #[serde(default)]
    students: Vec<Student>,
}

/// JSON-backed student register
#[derive(Debug)]
pub struct StudentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StudentStore {
    /// Create store over a JSON file; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All students, in creation order
    pub async fn list(&self) -> Result<Vec<Student>, RecordError> {
        Ok(self.load().await?.students)
    }

    /// Number of registered students
    pub async fn count(&self) -> Result<usize, RecordError> {
        Ok(self.load().await?.students.len())
    }

    /// Find by record ID or case-insensitive student ID
    pub async fn find(&self, key: &str) -> Result<Option<Student>, RecordError> {
        Ok(self
            .load()
            .await?
            .students
            .into_iter()
            .find(|s| s.is_keyed_by(key)))
    }

    /// Like [`find`](Self::find) but a miss is an error
    pub async fn get(&self, key: &str) -> Result<Student, RecordError> {
        self.find(key).await?.ok_or_else(|| not_found(key))
    }

    /// Student IDs that already have a storage folder recorded
    pub async fn students_with_folders(&self) -> Result<Vec<StudentId>, RecordError> {
        Ok(self
            .load()
            .await?
            .students
            .into_iter()
            .filter(|s| s.drive_folder_id.is_some())
            .map(|s| s.student_id)
            .collect())
    }

    /// Register a new student
    ///
    /// Fails with [`RecordError::Conflict`] when the student ID is taken,
    /// compared case-insensitively.
    pub async fn create(&self, new: NewStudent) -> Result<Student, RecordError> {
        let student = new.into_student()?;
        self.mutate(|students| {
            if students.iter().any(|s| s.student_id == student.student_id) {
                return Err(RecordError::Conflict(student.student_id.to_string()));
            }
            students.push(student.clone());
            tracing::info!(student_id = %student.student_id, "student created");
            Ok(student)
        })
        .await
    }

    /// Get a student by natural ID, creating a minimal record if missing
    ///
    /// The created record uses the ID as its display name.
    pub async fn ensure_student(&self, student_id: &StudentId) -> Result<Student, RecordError> {
        self.mutate(|students| {
            if let Some(existing) = students.iter().find(|s| &s.student_id == student_id) {
                return Ok(existing.clone());
            }
            let student = NewStudent::new(student_id.as_str(), student_id.as_str()).into_student()?;
            students.push(student.clone());
            tracing::info!(student_id = %student_id, "student auto-registered from upload");
            Ok(student)
        })
        .await
    }

    /// Apply a partial update
    pub async fn update(&self, key: &str, patch: StudentPatch) -> Result<Student, RecordError> {
        self.mutate(|students| {
            let index = position(students, key)?;
            let mut updated = students[index].clone();
            patch.apply(&mut updated)?;

            let clash = students
                .iter()
                .enumerate()
                .any(|(i, s)| i != index && s.student_id == updated.student_id);
            if clash {
                return Err(RecordError::Conflict(updated.student_id.to_string()));
            }

            students[index] = updated.clone();
            Ok(updated)
        })
        .await
    }

    /// Remove a student together with its document links
    ///
    /// Stored files are left where they are.
    pub async fn delete(&self, key: &str) -> Result<Student, RecordError> {
        self.mutate(|students| {
            let index = position(students, key)?;
            let removed = students.remove(index);
            tracing::info!(
                student_id = %removed.student_id,
                documents = removed.documents.total(),
                "student deleted"
            );
            Ok(removed)
        })
        .await
    }

    /// Record the storage folder of a student
    pub async fn set_drive_folder(
        &self,
        key: &str,
        folder_id: impl Into<String>,
    ) -> Result<Student, RecordError> {
        let folder_id = folder_id.into();
        self.mutate(|students| {
            let index = position(students, key)?;
            let student = &mut students[index];
            student.drive_folder_id = Some(folder_id);
            student.touch();
            Ok(student.clone())
        })
        .await
    }

    /// Append a document link to a student's list for `ty`
    pub async fn add_document(
        &self,
        key: &str,
        ty: DocumentType,
        link: NewDocumentLink,
    ) -> Result<DocumentLink, RecordError> {
        self.mutate(|students| {
            let index = position(students, key)?;
            let student = &mut students[index];
            let link = link.into_link();
            student.documents.links_mut(ty).push(link.clone());
            student.touch();
            tracing::debug!(student_id = %student.student_id, %ty, link_id = %link.id, "document linked");
            Ok(link)
        })
        .await
    }

    /// Remove one document link by `(student, type, link id)`
    pub async fn remove_document(
        &self,
        key: &str,
        ty: DocumentType,
        link_id: &str,
    ) -> Result<DocumentLink, RecordError> {
        self.mutate(|students| {
            let index = position(students, key)?;
            let student = &mut students[index];
            let links = student.documents.links_mut(ty);
            let link_index = links
                .iter()
                .position(|l| l.id.to_string().eq_ignore_ascii_case(link_id.trim()))
                .ok_or_else(|| RecordError::NotFound(format!("Document {link_id}")))?;
            let removed = links.remove(link_index);
            student.touch();
            Ok(removed)
        })
        .await
    }

    /// Document lists of a student
    pub async fn documents(&self, key: &str) -> Result<DocumentSet, RecordError> {
        Ok(self.get(key).await?.documents)
    }

    /// Document statistics of a student
    pub async fn stats(&self, key: &str) -> Result<StudentStats, RecordError> {
        Ok(self.get(key).await?.stats())
    }

    /// Case-insensitive substring search over ID, name, department and email
    ///
    /// A blank query matches nothing.
    pub async fn search(&self, query: &str) -> Result<Vec<Student>, RecordError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .load()
            .await?
            .students
            .into_iter()
            .filter(|s| {
                [
                    s.student_id.as_str(),
                    s.name.as_str(),
                    s.department.as_str(),
                    s.email.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect())
    }

    /// Run a read-modify-write cycle; the file is only rewritten on success
    async fn mutate<T, F>(&self, f: F) -> Result<T, RecordError>
    where
        F: FnOnce(&mut Vec<Student>) -> Result<T, RecordError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut register = self.load().await?;
        let out = f(&mut register.students)?;
        self.save(&register).await?;
        Ok(out)
    }

    async fn load(&self) -> Result<RegisterFile, RecordError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(RegisterFile::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RegisterFile::default()),
            Err(e) => Err(RecordError::io_error(&self.path, e)),
        }
    }

    async fn save(&self, register: &RegisterFile) -> Result<(), RecordError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RecordError::io_error(parent, e))?;
        }

        let bytes = serde_json::to_vec_pretty(register)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| RecordError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RecordError::io_error(&self.path, e))
    }
}

fn position(students: &[Student], key: &str) -> Result<usize, RecordError> {
    students
        .iter()
        .position(|s| s.is_keyed_by(key))
        .ok_or_else(|| not_found(key))
}

fn not_found(key: &str) -> RecordError {
    RecordError::NotFound(format!("Student {}", key.trim()))
}
