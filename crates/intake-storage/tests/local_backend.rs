//! Local backend behaviour on a real directory.

use intake_storage::{BackendKind, FolderId, LocalBackend, StorageBackend, StorageError, UploadFile};
use std::collections::HashSet;
use tempfile::TempDir;

fn backend(dir: &TempDir) -> LocalBackend {
    LocalBackend::new(dir.path().join("uploads"), "http://intake.test/")
}

#[tokio::test]
async fn folders_are_directories() {
    let dir = TempDir::new().unwrap();
    let local = backend(&dir);
    assert_eq!(local.kind(), BackendKind::Local);

    assert!(local.find_folder("ST1", None).await.unwrap().is_none());
    let main = local.create_folder("ST1", None).await.unwrap();
    assert_eq!(main, FolderId::new("mock-ST1"));
    assert_eq!(local.find_folder("ST1", None).await.unwrap(), Some(main.clone()));

    let sub = local.create_folder("Fee Receipts", Some(&main)).await.unwrap();
    assert_eq!(sub.as_str(), "mock-ST1/Fee_Receipts");
    assert!(dir.path().join("uploads/ST1/Fee_Receipts").is_dir());

    // creating twice is harmless
    assert_eq!(local.create_folder("ST1", None).await.unwrap(), main);
}

#[tokio::test]
async fn remote_parent_means_root() {
    let dir = TempDir::new().unwrap();
    let local = backend(&dir);
    let folder = local
        .create_folder("ST2", Some(&FolderId::new("1AbCdEf")))
        .await
        .unwrap();
    assert_eq!(folder.as_str(), "mock-ST2");
}

#[tokio::test]
async fn upload_writes_timestamped_file_and_links_it() {
    let dir = TempDir::new().unwrap();
    let local = backend(&dir);
    let folder = local.create_folder("ST3", None).await.unwrap();

    let stored = local
        .upload(&folder, &UploadFile::new("My Essay (final).pdf", "application/pdf", b"essay".to_vec()))
        .await
        .unwrap();

    assert_eq!(stored.backend, BackendKind::Local);
    assert_eq!(stored.file_name, "My Essay (final).pdf");
    assert!(stored.file_id.starts_with("mock-ST3/"));
    assert!(stored.file_id.ends_with("_My_Essay_final.pdf"));
    assert_eq!(stored.shareable_link, stored.download_link);
    let rel = stored.file_id.trim_start_matches("mock-");
    assert_eq!(stored.shareable_link, format!("http://intake.test/uploads/{rel}"));

    let on_disk = local.resolve(&stored.file_id).unwrap();
    assert_eq!(std::fs::read(on_disk).unwrap(), b"essay");
}

#[tokio::test]
async fn repeated_uploads_of_one_name_never_collide() {
    let dir = TempDir::new().unwrap();
    let local = backend(&dir);
    let folder = local.create_folder("ST4", None).await.unwrap();

    let mut stored = Vec::new();
    for i in 0..50 {
        let file = UploadFile::new("hw.pdf", "application/pdf", format!("copy {i}").into_bytes());
        stored.push(local.upload(&folder, &file).await.unwrap());
    }

    let ids: HashSet<_> = stored.iter().map(|s| s.file_id.as_str()).collect();
    assert_eq!(ids.len(), 50);
    for (i, file) in stored.iter().enumerate() {
        let on_disk = local.resolve(&file.file_id).unwrap();
        assert_eq!(std::fs::read(on_disk).unwrap(), format!("copy {i}").into_bytes());
    }

    // Deleting one copy leaves the others in place
    local.delete(&stored[0].file_id).await.unwrap();
    assert!(!local.resolve(&stored[0].file_id).unwrap().exists());
    assert!(local.resolve(&stored[1].file_id).unwrap().exists());
}

#[tokio::test]
async fn foreign_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let local = backend(&dir);

    let err = local
        .upload(&FolderId::new("1AbCdEf"), &UploadFile::new("a.txt", "text/plain", b"x".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidId(_)));

    assert!(matches!(
        local.delete("mock-../../etc/passwd").await.unwrap_err(),
        StorageError::InvalidId(_)
    ));
    assert!(local.delete("mock-ST9/missing.pdf").await.unwrap_err().is_not_found());
}
