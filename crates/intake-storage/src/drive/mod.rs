//! Google Drive v3 backend over REST

pub mod auth;

pub use auth::{DriveCredentials, TokenSource};

use crate::backend::{BackendKind, FolderId, StorageBackend, StoredFile, UploadFile};
use crate::config::DriveConfig;
use crate::error::StorageError;
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Drive-hosted storage
#[derive(Debug)]
pub struct DriveBackend {
    client: reqwest::Client,
    api_base: String,
    tokens: TokenSource,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    web_view_link: Option<String>,
}

impl DriveBackend {
    /// Create backend with a token source
    pub fn new(config: &DriveConfig, tokens: TokenSource) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Create backend when the configuration carries credentials
    pub async fn from_config(config: &DriveConfig) -> Result<Option<Self>, StorageError> {
        match TokenSource::from_config(config).await? {
            Some(tokens) => Ok(Some(Self::new(config, tokens)?)),
            None => Ok(None),
        }
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.api_base)
    }

    async fn token(&self) -> Result<String, StorageError> {
        self.tokens.access_token(&self.client).await
    }

    /// Grant anyone-with-link read access; failures only log
    async fn share(&self, token: &str, file_id: &str) {
        let result = self
            .client
            .post(format!("{}/{file_id}/permissions", self.files_url()))
            .bearer_auth(token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(file_id, status = %response.status(), "could not share drive file");
            }
            Err(e) => tracing::warn!(file_id, error = %e, "could not share drive file"),
        }
    }
}

/// Fail non-2xx responses with their body
async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::remote(Some(status.as_u16()), format!("{status}: {body}")))
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, StorageError> {
    Ok(serde_json::from_slice(&response.bytes().await?)?)
}

/// Drive query string for a folder named `name`
#[must_use]
pub fn folder_query(name: &str, parent: Option<&FolderId>) -> String {
    let mut query = format!(
        "name = '{}' and mimeType = '{FOLDER_MIME_TYPE}' and trashed = false",
        escape(name)
    );
    if let Some(parent) = parent {
        query.push_str(&format!(" and '{}' in parents", escape(parent.as_str())));
    }
    query
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Direct-download URL for a file
#[must_use]
pub fn download_link(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={file_id}")
}

/// `multipart/related` body holding JSON metadata then the content
fn related_body(boundary: &str, metadata: &serde_json::Value, file: &UploadFile) -> bytes::Bytes {
    let mut body = BytesMut::with_capacity(file.len() + 512);
    body.put_slice(format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n").as_bytes());
    body.put_slice(metadata.to_string().as_bytes());
    body.put_slice(format!("\r\n--{boundary}\r\nContent-Type: {}\r\n\r\n", file.mime_type).as_bytes());
    body.put_slice(&file.bytes);
    body.put_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body.freeze()
}

#[async_trait]
impl StorageBackend for DriveBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Drive
    }

    async fn find_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> Result<Option<FolderId>, StorageError> {
        let token = self.token().await?;
        let query = folder_query(name, parent);
        let response = self
            .client
            .get(self.files_url())
            .bearer_auth(&token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "1"),
            ])
            .send()
            .await?;
        let list: FileList = decode(check(response).await?).await?;
        Ok(list.files.into_iter().next().map(|f| FolderId::new(f.id)))
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> Result<FolderId, StorageError> {
        let token = self.token().await?;
        let mut metadata = json!({ "name": name, "mimeType": FOLDER_MIME_TYPE });
        if let Some(parent) = parent {
            metadata["parents"] = json!([parent.as_str()]);
        }

        let response = self
            .client
            .post(self.files_url())
            .bearer_auth(&token)
            .query(&[("fields", "id")])
            .json(&metadata)
            .send()
            .await?;
        let created: FileRef = decode(check(response).await?).await?;
        tracing::info!(name, folder_id = %created.id, "drive folder created");
        Ok(FolderId::new(created.id))
    }

    async fn upload(&self, folder: &FolderId, file: &UploadFile) -> Result<StoredFile, StorageError> {
        let token = self.token().await?;
        let boundary = format!("intake-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
        let metadata = json!({ "name": file.file_name, "parents": [folder.as_str()] });

        let response = self
            .client
            .post(format!("{}/upload/drive/v3/files", self.api_base))
            .bearer_auth(&token)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id,name,webViewLink,webContentLink"),
            ])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(related_body(&boundary, &metadata, file))
            .send()
            .await?;
        let uploaded: DriveFile = decode(check(response).await?).await?;

        self.share(&token, &uploaded.id).await;
        tracing::info!(file_id = %uploaded.id, folder = %folder, bytes = file.len(), "file uploaded to drive");

        let shareable_link = uploaded
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", uploaded.id));
        Ok(StoredFile {
            download_link: download_link(&uploaded.id),
            file_name: uploaded.name.unwrap_or_else(|| file.file_name.clone()),
            file_id: uploaded.id,
            shareable_link,
            backend: BackendKind::Drive,
        })
    }

    async fn delete(&self, file_id: &str) -> Result<(), StorageError> {
        let token = self.token().await?;
        let response = self
            .client
            .delete(format!("{}/{file_id}", self.files_url()))
            .bearer_auth(&token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(format!("File {file_id}")));
        }
        check(response).await?;
        tracing::info!(file_id, "drive file deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_escapes_quotes_and_scopes_parent() {
        let query = folder_query("O'Brien", Some(&FolderId::new("root123")));
        assert_eq!(
            query,
            "name = 'O\\'Brien' and mimeType = 'application/vnd.google-apps.folder' \
             and trashed = false and 'root123' in parents"
        );
        assert!(!folder_query("ST1", None).contains("in parents"));
    }

    #[test]
    fn related_body_layout() {
        let file = UploadFile::new("a.txt", "text/plain", &b"hello"[..]);
        let body = related_body("b", &json!({"name": "a.txt"}), &file);
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("--b\r\nContent-Type: application/json"));
        assert!(text.contains("\r\nContent-Type: text/plain\r\n\r\nhello\r\n--b--\r\n"));
    }

    #[test]
    fn download_link_format() {
        assert_eq!(
            download_link("abc"),
            "https://drive.google.com/uc?export=download&id=abc"
        );
    }
}
