//! Testing utilities for the intake workspace
//!
//! Shared fixtures, a throwaway workspace on disk and an in-process fake
//! of the drive REST API.

#![allow(missing_docs)]

pub mod fake_drive;

pub use fake_drive::FakeDrive;

use intake_records::{NewStudent, StudentId, StudentStore};
use intake_storage::{DriveConfig, DriveService, LocalBackend, StorageConfig, UploadFile};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PUBLIC_URL: &str = "http://localhost:3000";

pub fn student_id(raw: &str) -> StudentId {
    StudentId::new(raw).unwrap()
}

pub fn new_student(student_id: &str, name: &str) -> NewStudent {
    NewStudent::new(student_id, name)
}

pub fn full_student(student_id: &str, name: &str) -> NewStudent {
    NewStudent::new(student_id, name)
        .with_department("Computer Science")
        .with_email(format!("{}@college.test", student_id.to_lowercase()))
        .with_phone("+91 98765 43210")
}

pub fn pdf(file_name: &str) -> UploadFile {
    UploadFile::new(file_name, "application/pdf", b"%PDF-1.4\n%test\n".to_vec())
}

pub fn png(file_name: &str) -> UploadFile {
    UploadFile::new(file_name, "image/png", b"\x89PNG\r\n\x1a\n".to_vec())
}

pub fn drive_config(fake: &FakeDrive) -> DriveConfig {
    DriveConfig::new()
        .with_access_token(FakeDrive::TOKEN)
        .with_api_base(fake.url())
}

/// Temporary data file, upload directory and public directory
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_file(&self) -> PathBuf {
        self.dir.path().join("data").join("students.json")
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn public_dir(&self) -> PathBuf {
        self.dir.path().join("public")
    }

    pub fn store(&self) -> StudentStore {
        StudentStore::new(self.data_file())
    }

    pub fn local_backend(&self) -> LocalBackend {
        LocalBackend::new(self.upload_dir(), PUBLIC_URL)
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig::new()
            .with_upload_dir(self.upload_dir())
            .with_public_base_url(PUBLIC_URL)
    }

    /// Storage with no drive credentials
    pub fn local_storage(&self) -> DriveService {
        DriveService::local_only(self.local_backend())
    }

    /// Storage backed by `fake`, falling back into this workspace
    pub async fn drive_storage(&self, fake: &FakeDrive) -> DriveService {
        DriveService::from_config(&self.storage_config().with_drive(drive_config(fake))).await
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
