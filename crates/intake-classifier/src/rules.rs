//! Deterministic classifier

use crate::classifier::{ClassificationRequest, Classifier, ClassifierKind};
use crate::patterns::{detect_document_type, extract_student_id};
use crate::response::{ClassifierResponse, ErrorToken};
use async_trait::async_trait;

/// Pattern-table classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl RuleClassifier {
    /// Create rule classifier
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Classify synchronously
    ///
    /// An explicit student ID wins over one found in the filename.
    #[must_use]
    pub fn decide(&self, request: &ClassificationRequest) -> ClassifierResponse {
        let document_type = detect_document_type(&request.file_name);
        let student_id = request
            .explicit_student_id()
            .or_else(|| extract_student_id(&request.file_name));

        match student_id {
            Some(student_id) => {
                let exists = request.folder_exists(&student_id);
                tracing::debug!(
                    file = %request.file_name,
                    %student_id,
                    %document_type,
                    folder_exists = exists,
                    "rule classification"
                );
                ClassifierResponse::decide(student_id, document_type, exists)
            }
            None => {
                tracing::debug!(file = %request.file_name, "no student id in metadata or filename");
                ClassifierResponse::Error(ErrorToken::NoStudentId)
            }
        }
    }
}

#[async_trait]
impl Classifier for RuleClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> ClassifierResponse {
        self.decide(request)
    }

    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_id_with_existing_folder_stores() {
        let request = ClassificationRequest::new("ST102_Math_HW.pdf").with_existing_folder("ST102");
        assert_eq!(
            RuleClassifier::new().decide(&request).to_string(),
            "STORE: ST102 → assignment"
        );
    }

    #[test]
    fn metadata_id_with_missing_folder_creates() {
        let request = ClassificationRequest::new("Fee_Receipt_Jan.pdf").with_student_id("ST105");
        assert_eq!(
            RuleClassifier::new().decide(&request).to_string(),
            "CREATE_FOLDER: ST105\nTHEN_STORE: feeReceipt"
        );
    }

    #[test]
    fn no_id_anywhere_is_an_error() {
        let request = ClassificationRequest::new("scan.pdf");
        assert_eq!(
            RuleClassifier::new().decide(&request).to_string(),
            "ERROR: NO_STUDENT_ID"
        );
    }

    #[test]
    fn metadata_id_overrides_filename_and_is_uppercased() {
        let request = ClassificationRequest::new("ST102_cert.pdf")
            .with_student_id("st200")
            .with_existing_folder("ST200");
        assert_eq!(
            RuleClassifier::new().decide(&request).to_string(),
            "STORE: ST200 → certificate"
        );
    }

    #[test]
    fn invalid_metadata_id_falls_back_to_filename() {
        let request = ClassificationRequest::new("ST102_essay.pdf").with_student_id("no spaces!");
        let response = RuleClassifier::new().decide(&request);
        assert_eq!(response.student_id().unwrap().as_str(), "ST102");
    }
}
