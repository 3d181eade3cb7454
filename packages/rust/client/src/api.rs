//! HTTP client for the document metadata and search endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use paperdesk_shared::{
    ApiConfig, Document, NewDocument, PaperdeskError, Result, SearchQuery, SearchResult,
};

use crate::http::{build_client, check_status, decode, endpoint, transport};
use crate::{DocumentApi, SearchApi};

const DOCUMENTS_PATH: &str = "/api/documents";
const SEARCH_PATH: &str = "/api/documents/search";

#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

/// Backend API client authenticated with a bearer token.
pub struct HttpDocumentApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpDocumentApi {
    /// Create a client for `base_url`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    /// Create a client from the `[api]` config section.
    pub fn from_config(config: &ApiConfig, token: impl Into<String>) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            token,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    /// URL of one document, with `id` percent-encoded as a single path segment.
    fn document_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url(DOCUMENTS_PATH)).map_err(|e| {
            PaperdeskError::config(format!("invalid API base URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                PaperdeskError::config(format!("API base URL cannot hold a path: {}", self.base_url))
            })?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    #[instrument(skip_all, fields(title = %document.title, file_size = document.file_size))]
    async fn create(&self, document: &NewDocument) -> Result<Document> {
        let url = self.url(DOCUMENTS_PATH);
        debug!(%url, "registering document");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(document)
            .send()
            .await
            .map_err(|e| transport(&url, e))?;

        let response = check_status(response).await?;
        decode(&url, response).await
    }

    #[instrument(skip_all)]
    async fn list(&self) -> Result<Vec<Document>> {
        let url = self.url(DOCUMENTS_PATH);
        debug!(%url, "listing documents");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| transport(&url, e))?;

        let response = check_status(response).await?;
        let list: DocumentList = decode(&url, response).await?;
        Ok(list.documents)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.document_url(id)?;
        debug!(%url, "deleting document");

        let response = self
            .client
            .delete(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| transport(url.as_str(), e))?;

        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl SearchApi for HttpDocumentApi {
    #[instrument(skip_all, fields(limit = query.limit, document_id = ?query.document_id))]
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let url = self.url(SEARCH_PATH);
        debug!(%url, "searching documents");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(query)
            .send()
            .await
            .map_err(|e| transport(&url, e))?;

        let response = check_status(response).await?;
        let body: SearchResponse = decode(&url, response).await?;
        Ok(body.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperdesk_shared::PaperdeskError;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn document_json(id: &str, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "file_name": format!("{title}.pdf"),
            "file_url": format!("https://blob.example.com/{id}.pdf"),
            "file_size": 4096,
            "page_count": null,
            "processing_status": "pending",
            "created_at": "2024-03-01T10:00:00Z"
        })
    }

    fn api_for(server: &MockServer) -> HttpDocumentApi {
        HttpDocumentApi::new(server.uri(), "secret-token", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn create_posts_metadata_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/documents"))
            .and(header("authorization", "Bearer secret-token"))
            .and(body_json(serde_json::json!({
                "title": "Cell Biology",
                "file_url": "https://blob.example.com/x.pdf",
                "file_name": "cells.pdf",
                "file_size": 4096
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(document_json("d1", "Cell Biology")))
            .expect(1)
            .mount(&server)
            .await;

        let created = api_for(&server)
            .create(&NewDocument {
                title: "Cell Biology".into(),
                file_url: "https://blob.example.com/x.pdf".into(),
                file_name: "cells.pdf".into(),
                file_size: 4096,
            })
            .await
            .expect("create");

        assert_eq!(created.id, "d1");
        assert_eq!(created.title, "Cell Biology");
    }

    #[tokio::test]
    async fn list_unwraps_documents_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "documents": [document_json("d1", "A"), document_json("d2", "B")]
            })))
            .mount(&server)
            .await;

        let docs = api_for(&server).list().await.expect("list");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].id, "d2");
    }

    #[tokio::test]
    async fn delete_surfaces_server_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/documents/d9"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "error": "Document not found" })),
            )
            .mount(&server)
            .await;

        let err = api_for(&server).delete("d9").await.unwrap_err();
        match err {
            PaperdeskError::Service { status, message } => {
                assert_eq!(status, Some(404));
                assert_eq!(message, "Document not found");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_encodes_id_as_one_path_segment() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/documents/a%3Fb"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/documents/x%2Fy%23z"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/documents/a"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let api = api_for(&server);
        api.delete("a?b").await.expect("delete a?b");
        api.delete("x/y#z").await.expect("delete x/y#z");
    }

    #[test]
    fn document_url_keeps_base_path() {
        let api = HttpDocumentApi::new(
            "https://api.example.com/v1/",
            "t",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            api.document_url("doc 1").unwrap().as_str(),
            "https://api.example.com/v1/api/documents/doc%201"
        );
    }

    #[tokio::test]
    async fn search_sends_query_and_parses_results() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/documents/search"))
            .and(body_json(serde_json::json!({ "query": "mitosis", "limit": 5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{
                    "document_id": "d1",
                    "chunk_id": "c7",
                    "content": "Mitosis is a part of the cell cycle.",
                    "score": 0.91
                }]
            })))
            .mount(&server)
            .await;

        let results = api_for(&server)
            .search(&SearchQuery::new("mitosis", None, 5))
            .await
            .expect("search");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk_id, "c7");
        assert!((results[0].score - 0.91).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/documents/search"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .search(&SearchQuery::new("mitosis", None, 5))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let api = HttpDocumentApi::new("http://127.0.0.1:1", "t", Duration::from_secs(2)).unwrap();
        let err = api.list().await.unwrap_err();
        assert!(matches!(err, PaperdeskError::Transport(_)));
    }
}
