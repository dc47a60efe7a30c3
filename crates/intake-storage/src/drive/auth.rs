//! Drive credential bootstrap
//!
//! Either a pre-issued access token, or an OAuth refresh token exchanged at
//! the token endpoint and reused until shortly before it expires.

use crate::config::DriveConfig;
use crate::error::StorageError;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Tokens are refreshed this long before their stated expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// OAuth refresh-token credential file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriveCredentials {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// Overrides the configured token endpoint
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl DriveCredentials {
    /// Load credentials from a JSON file
    pub async fn from_file(path: &Path) -> Result<Self, StorageError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::io_error(path, e))?;
        let credentials: Self = serde_json::from_str(&raw)?;
        if credentials.refresh_token.trim().is_empty() {
            return Err(StorageError::MissingCredentials);
        }
        Ok(credentials)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug)]
enum Source {
    Static(String),
    Refresh {
        credentials: DriveCredentials,
        token_url: String,
        cached: Mutex<Option<CachedToken>>,
    },
}

/// Supplies bearer tokens for drive requests
#[derive(Debug)]
pub struct TokenSource {
    source: Source,
}

impl TokenSource {
    /// Fixed token
    #[must_use]
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: Source::Static(token.into()),
        }
    }

    /// Refresh-token exchange against `token_url`
    #[must_use]
    pub fn refreshing(credentials: DriveCredentials, token_url: impl Into<String>) -> Self {
        let token_url = credentials
            .token_uri
            .clone()
            .unwrap_or_else(|| token_url.into());
        Self {
            source: Source::Refresh {
                credentials,
                token_url,
                cached: Mutex::new(None),
            },
        }
    }

    /// Resolve the configured credential source
    ///
    /// `Ok(None)` when nothing is configured. A static token wins over a
    /// credential file.
    pub async fn from_config(config: &DriveConfig) -> Result<Option<Self>, StorageError> {
        if let Some(token) = config.access_token.as_deref().filter(|t| !t.trim().is_empty()) {
            return Ok(Some(Self::fixed(token.trim())));
        }
        match &config.credentials_file {
            Some(path) => {
                let credentials = DriveCredentials::from_file(path).await?;
                Ok(Some(Self::refreshing(credentials, config.token_url.clone())))
            }
            None => Ok(None),
        }
    }

    /// Current access token, exchanging the refresh token when needed
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, StorageError> {
        let (credentials, token_url, cached) = match &self.source {
            Source::Static(token) => return Ok(token.clone()),
            Source::Refresh {
                credentials,
                token_url,
                cached,
            } => (credentials, token_url, cached),
        };

        let mut guard = cached.lock().await;
        if let Some(token) = guard.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        let response = client
            .post(token_url)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::remote(
                Some(status.as_u16()),
                format!("token exchange failed: {body}"),
            ));
        }

        let token: TokenResponse = serde_json::from_slice(&response.bytes().await?)?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        let expires_at = Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN);
        tracing::debug!(expires_in = lifetime.as_secs(), "drive access token refreshed");

        *guard = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn static_token_wins() {
        let config = DriveConfig::new()
            .with_access_token("ya29.static")
            .with_credentials_file("/does/not/exist.json");
        let source = TokenSource::from_config(&config).await.unwrap().unwrap();
        let token = source.access_token(&reqwest::Client::new()).await.unwrap();
        assert_eq!(token, "ya29.static");
    }

    #[tokio::test]
    async fn nothing_configured_is_none() {
        assert!(TokenSource::from_config(&DriveConfig::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn credential_file_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"client_id":"id","client_secret":"secret","refresh_token":"rt","token_uri":"http://127.0.0.1:1/token"}}"#
        )
        .unwrap();

        let credentials = DriveCredentials::from_file(file.path()).await.unwrap();
        assert_eq!(credentials.refresh_token, "rt");
        assert_eq!(credentials.token_uri.as_deref(), Some("http://127.0.0.1:1/token"));
    }

    #[tokio::test]
    async fn blank_refresh_token_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"client_id":"id","client_secret":"s","refresh_token":" "}}"#).unwrap();
        let err = DriveCredentials::from_file(file.path()).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingCredentials));
    }
}
