//! Per-student folder layout

use crate::backend::FolderId;
use intake_records::DocumentType;
use serde::{Deserialize, Serialize};

/// Subfolder name for a document type
#[must_use]
pub fn subfolder_name(ty: DocumentType) -> &'static str {
    match ty {
        DocumentType::Assignment => "Assignments",
        DocumentType::IdCard => "ID Cards",
        DocumentType::Certificate => "Certificates",
        DocumentType::FeeReceipt => "Fee Receipts",
    }
}

/// A student's main folder and its four type subfolders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFolders {
    /// Student folder
    pub main: FolderId,
    /// `Assignments`
    pub assignments: FolderId,
    /// `ID Cards`
    pub id_cards: FolderId,
    /// `Certificates`
    pub certificates: FolderId,
    /// `Fee Receipts`
    pub fee_receipts: FolderId,
}

impl StudentFolders {
    /// Subfolder holding documents of type `ty`
    #[must_use]
    pub fn folder_for(&self, ty: DocumentType) -> &FolderId {
        match ty {
            DocumentType::Assignment => &self.assignments,
            DocumentType::IdCard => &self.id_cards,
            DocumentType::Certificate => &self.certificates,
            DocumentType::FeeReceipt => &self.fee_receipts,
        }
    }

    /// Whether the folders live on the local backend
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.main.is_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_its_own_subfolder() {
        let folders = StudentFolders {
            main: FolderId::new("m"),
            assignments: FolderId::new("a"),
            id_cards: FolderId::new("i"),
            certificates: FolderId::new("c"),
            fee_receipts: FolderId::new("f"),
        };
        let ids: Vec<_> = DocumentType::ALL.iter().map(|t| folders.folder_for(*t).as_str()).collect();
        assert_eq!(ids, ["a", "i", "c", "f"]);
        assert_eq!(subfolder_name(DocumentType::IdCard), "ID Cards");
        assert!(!folders.is_local());
    }
}
