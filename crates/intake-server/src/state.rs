//! Shared application state

use crate::config::AppConfig;
use crate::intake::IntakeService;
use intake_classifier::{classifier_from_config, Classifier};
use intake_records::StudentStore;
use intake_storage::DriveService;
use std::path::PathBuf;
use std::sync::Arc;

/// Services handed to every request
#[derive(Debug, Clone)]
pub struct AppState {
    /// Student register
    pub store: Arc<StudentStore>,
    /// Document storage
    pub storage: Arc<DriveService>,
    /// Upload classifier
    pub classifier: Arc<dyn Classifier>,
    /// Upload pipeline
    pub intake: Arc<IntakeService>,
    /// Bearer token; `None` leaves routes open
    pub api_token: Option<Arc<str>>,
    /// Served under `/uploads`
    pub upload_dir: PathBuf,
    /// Served at `/`
    pub public_dir: PathBuf,
}

impl AppState {
    /// Wire services together
    #[must_use]
    pub fn new(store: StudentStore, storage: DriveService, classifier: Arc<dyn Classifier>) -> Self {
        let store = Arc::new(store);
        let upload_dir = storage.local().root().to_path_buf();
        let storage = Arc::new(storage);
        let intake = Arc::new(IntakeService::new(
            store.clone(),
            storage.clone(),
            classifier.clone(),
        ));

        Self {
            store,
            storage,
            classifier,
            intake,
            api_token: None,
            upload_dir,
            public_dir: PathBuf::from("public"),
        }
    }

    /// Build every service from configuration
    pub async fn from_config(config: &AppConfig) -> Self {
        let store = StudentStore::new(&config.data_file);
        let storage = DriveService::from_config(&config.storage).await;
        let classifier = classifier_from_config(&config.llm);

        let mut state = Self::new(store, storage, classifier).with_public_dir(&config.public_dir);
        if let Some(token) = &config.api_token {
            state = state.with_api_token(token);
        }
        state
    }

    /// Require this bearer token on protected routes
    #[must_use]
    pub fn with_api_token(mut self, token: impl AsRef<str>) -> Self {
        self.api_token = Some(Arc::from(token.as_ref()));
        self
    }

    /// Serve the frontend from `dir`
    #[must_use]
    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }
}
