//! Classifier seam
//!
//! [`Classifier`] is implemented by the deterministic [`RuleClassifier`] and
//! the hosted [`LlmClassifier`]; [`classifier_from_config`] picks one.

use crate::config::LlmConfig;
use crate::llm::{ChatCompletion, LlmClassifier};
use crate::response::ClassifierResponse;
use crate::rules::RuleClassifier;
use async_trait::async_trait;
use intake_records::StudentId;
use serde::Serialize;
use std::sync::Arc;

/// Which implementation answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Pattern tables only
    Rules,
    /// Hosted language model with rule fallback
    Llm,
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Rules => "rules",
            Self::Llm => "llm",
        })
    }
}

/// Input to a classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationRequest {
    /// Original upload filename
    pub file_name: String,
    /// Student ID supplied with the upload, if any
    pub student_id: Option<String>,
    /// Students known to already have a storage folder
    pub existing_folders: Vec<StudentId>,
}

impl ClassificationRequest {
    /// Create request for a filename
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    /// With explicit student ID; blank values are ignored
    #[must_use]
    pub fn with_student_id(mut self, student_id: impl Into<String>) -> Self {
        let raw = student_id.into();
        self.student_id = (!raw.trim().is_empty()).then_some(raw);
        self
    }

    /// With existing folder list
    #[must_use]
    pub fn with_existing_folders(mut self, folders: Vec<StudentId>) -> Self {
        self.existing_folders = folders;
        self
    }

    /// Add one existing folder; invalid IDs are skipped
    #[must_use]
    pub fn with_existing_folder(mut self, student_id: &str) -> Self {
        if let Ok(id) = StudentId::new(student_id) {
            self.existing_folders.push(id);
        }
        self
    }

    /// Explicit student ID, normalised; invalid values count as absent
    #[must_use]
    pub fn explicit_student_id(&self) -> Option<StudentId> {
        self.student_id
            .as_deref()
            .and_then(|raw| StudentId::new(raw).ok())
    }

    /// Whether a folder is known for the student
    #[must_use]
    pub fn folder_exists(&self, student_id: &StudentId) -> bool {
        self.existing_folders.contains(student_id)
    }
}

/// Turns an upload description into a [`ClassifierResponse`]
///
/// Implementations never fail: every problem ends in a decision, possibly
/// an `ERROR:` one.
#[async_trait]
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Classify one upload
    async fn classify(&self, request: &ClassificationRequest) -> ClassifierResponse;

    /// Implementation kind
    fn kind(&self) -> ClassifierKind;
}

/// Build the configured classifier
///
/// A missing key, or a client that cannot be built, yields the rule
/// classifier.
#[must_use]
pub fn classifier_from_config(config: &LlmConfig) -> Arc<dyn Classifier> {
    if !config.is_enabled() {
        tracing::info!("no LLM API key configured, using rule classifier");
        return Arc::new(RuleClassifier::new());
    }

    match ChatCompletion::new(config) {
        Ok(completion) => {
            tracing::info!(model = %config.model, endpoint = %config.endpoint, "using hosted LLM classifier");
            Arc::new(LlmClassifier::new(completion))
        }
        Err(e) => {
            tracing::warn!(error = %e, "hosted classifier unavailable, using rule classifier");
            Arc::new(RuleClassifier::new())
        }
    }
}
