//! Student folder memo using moka
//!
//! Resolving a student's folders takes up to five remote round trips, so
//! resolved sets are kept by student ID.

use crate::layout::StudentFolders;
use intake_records::StudentId;
use moka::future::Cache;

/// Memo of resolved student folders
#[derive(Debug, Clone)]
pub struct FolderCache {
    inner: Cache<StudentId, StudentFolders>,
}

impl FolderCache {
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Remember a student's folders
    #[inline]
    pub async fn insert(&self, student_id: StudentId, folders: StudentFolders) {
        self.inner.insert(student_id, folders).await;
    }

    /// Look up a student's folders
    #[inline]
    pub async fn get(&self, student_id: &StudentId) -> Option<StudentFolders> {
        self.inner.get(student_id).await
    }

    /// Forget a student's folders
    #[inline]
    pub async fn invalidate(&self, student_id: &StudentId) {
        self.inner.invalidate(student_id).await;
    }

    /// Forget everything
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for FolderCache {
    fn default() -> Self {
        Self::new(1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FolderId;

    fn folders(main: &str) -> StudentFolders {
        let id = |s: &str| FolderId::new(format!("{main}/{s}"));
        StudentFolders {
            main: FolderId::new(main),
            assignments: id("a"),
            id_cards: id("i"),
            certificates: id("c"),
            fee_receipts: id("f"),
        }
    }

    #[tokio::test]
    async fn insert_get_invalidate() {
        let cache = FolderCache::new(10);
        let st1 = StudentId::new("st1").unwrap();

        assert!(cache.get(&st1).await.is_none());
        cache.insert(st1.clone(), folders("one")).await;
        assert_eq!(cache.get(&st1).await.unwrap().main.as_str(), "one");

        cache.invalidate(&st1).await;
        assert!(cache.get(&st1).await.is_none());
    }
}
