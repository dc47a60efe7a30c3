//! Storage configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default Google APIs base
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Default OAuth token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Remote drive settings
///
/// The drive backend is used when either `access_token` or
/// `credentials_file` resolves to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveConfig {
    /// Pre-issued bearer token
    pub access_token: Option<String>,
    /// OAuth refresh-token credential file
    pub credentials_file: Option<PathBuf>,
    /// Folder under which student folders are created
    pub root_folder_id: Option<String>,
    /// API base URL (`/drive/v3` and `/upload/drive/v3` hang off it)
    pub api_base: String,
    /// Token exchange endpoint
    pub token_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl DriveConfig {
    /// Create default configuration (no credentials)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With static access token; blank tokens count as absent
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.access_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    /// With credential file
    #[inline]
    #[must_use]
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// With root folder; blank IDs count as absent
    #[must_use]
    pub fn with_root_folder(mut self, folder_id: impl Into<String>) -> Self {
        let folder_id = folder_id.into();
        self.root_folder_id = (!folder_id.trim().is_empty()).then_some(folder_id);
        self
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// With token endpoint
    #[inline]
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Whether any credential source is configured
    #[inline]
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.access_token.is_some() || self.credentials_file.is_some()
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            credentials_file: None,
            root_folder_id: None,
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory used by the local backend
    pub upload_dir: PathBuf,
    /// Public URL the server is reachable at, for local links
    pub public_base_url: String,
    /// Remote drive settings
    pub drive: DriveConfig,
    /// Maximum number of memoised student folder sets
    pub folder_cache_capacity: u64,
}

impl StorageConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With local upload directory
    #[inline]
    #[must_use]
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    /// With public base URL
    #[inline]
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// With drive settings
    #[inline]
    #[must_use]
    pub fn with_drive(mut self, drive: DriveConfig) -> Self {
        self.drive = drive;
        self
    }

    /// With folder cache capacity
    #[inline]
    #[must_use]
    pub fn with_folder_cache_capacity(mut self, capacity: u64) -> Self {
        self.folder_cache_capacity = capacity;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            public_base_url: "http://localhost:3000".to_string(),
            drive: DriveConfig::default(),
            folder_cache_capacity: 1_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_credentials() {
        let config = StorageConfig::default();
        assert!(!config.drive.has_credentials());
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.drive.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn blank_values_are_ignored() {
        let drive = DriveConfig::new()
            .with_access_token("  ")
            .with_root_folder("");
        assert!(!drive.has_credentials());
        assert!(drive.root_folder_id.is_none());

        assert!(DriveConfig::new().with_access_token("ya29.token").has_credentials());
    }
}
