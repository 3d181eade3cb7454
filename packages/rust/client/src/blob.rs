//! HTTP client for the remote blob store.
//!
//! Files are written with a single `PUT {endpoint}/{storage_name}`; the store
//! answers with the public URL and the pathname it recorded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use paperdesk_shared::{BlobConfig, BlobUpload, PaperdeskError, Result, UploadFile};

use crate::BlobStore;
use crate::http::{build_client, check_status, decode, endpoint, transport};

/// Uploads can be large; give them more room than metadata calls.
const UPLOAD_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Deserialize)]
struct PutBlobResponse {
    url: String,
    pathname: String,
}

/// Blob store client.
pub struct HttpBlobStore {
    client: Client,
    endpoint: String,
}

impl HttpBlobStore {
    /// Create a client for the store at `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    /// Create a client from the `[blob]` config section.
    pub fn from_config(config: &BlobConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(UPLOAD_TIMEOUT_SECS),
        )
    }
}

/// A fresh, collision-free name for the stored object, keeping the extension.
fn storage_name(file: &UploadFile) -> String {
    let id = Uuid::now_v7();
    match file.extension() {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Prefix every failure so the stored message reads as an upload failure.
fn upload_failed(err: PaperdeskError) -> PaperdeskError {
    match err {
        PaperdeskError::Service { status, message } => {
            PaperdeskError::service(status, format!("Upload failed: {message}"))
        }
        PaperdeskError::Transport(reason) => {
            PaperdeskError::Transport(format!("Upload failed: {reason}"))
        }
        other => other,
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    #[instrument(skip_all, fields(file_name = %file.file_name, size = file.size()))]
    async fn upload(&self, file: &UploadFile, token: &str) -> Result<BlobUpload> {
        let name = storage_name(file);
        let url = endpoint(&self.endpoint, &name);
        debug!(%url, "uploading blob");

        let result = async {
            let response = self
                .client
                .put(&url)
                .bearer_auth(token)
                .header("x-content-type", &file.media_type)
                .body(file.bytes.clone())
                .send()
                .await
                .map_err(|e| transport(&url, e))?;
            let response = check_status(response).await?;
            decode::<PutBlobResponse>(&url, response).await
        }
        .await
        .map_err(upload_failed)?;

        info!(url = %result.url, pathname = %result.pathname, "blob stored");

        Ok(BlobUpload {
            url: result.url,
            storage_name: result.pathname,
            file_name: file.file_name.clone(),
            file_size: file.size(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperdesk_shared::PDF_MEDIA_TYPE;
    use wiremock::matchers::{header, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pdf() -> UploadFile {
        UploadFile::new("lecture-notes.pdf", PDF_MEDIA_TYPE, b"%PDF-1.7 test".to_vec())
    }

    #[test]
    fn storage_name_keeps_extension() {
        let name = storage_name(&pdf());
        assert!(name.ends_with(".pdf"));
        assert_ne!(name, storage_name(&pdf()));
    }

    #[tokio::test]
    async fn upload_puts_bytes_under_generated_name() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path_regex(r"^/[0-9a-f-]{36}\.pdf$"))
            .and(header("authorization", "Bearer blob-token"))
            .and(header("x-content-type", PDF_MEDIA_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://store.example.com/0190-abc.pdf",
                "pathname": "0190-abc.pdf",
                "contentType": "application/pdf",
                "contentDisposition": "inline"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpBlobStore::new(server.uri(), Duration::from_secs(5)).unwrap();
        let uploaded = store.upload(&pdf(), "blob-token").await.expect("upload");

        assert_eq!(uploaded.url, "https://store.example.com/0190-abc.pdf");
        assert_eq!(uploaded.storage_name, "0190-abc.pdf");
        assert_eq!(uploaded.file_name, "lecture-notes.pdf");
        assert_eq!(uploaded.file_size, 13);
    }

    #[tokio::test]
    async fn rejected_upload_is_reported_as_upload_failure() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({ "error": "Access denied" })),
            )
            .mount(&server)
            .await;

        let store = HttpBlobStore::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = store.upload(&pdf(), "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Upload failed: Access denied");
    }
}
