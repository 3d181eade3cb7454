//! Remote capabilities consumed by Paperdesk.
//!
//! The core never talks HTTP directly. It is written against three traits:
//! - [`BlobStore`] — durable storage for the uploaded file bytes
//! - [`DocumentApi`] — document metadata registration, listing, deletion
//! - [`SearchApi`] — ranked semantic search over ingested documents
//!
//! [`HttpBlobStore`] and [`HttpDocumentApi`] are the production implementations.

mod api;
mod blob;
mod http;

use async_trait::async_trait;
use paperdesk_shared::{BlobUpload, Document, NewDocument, Result, SearchQuery, SearchResult, UploadFile};

pub use api::HttpDocumentApi;
pub use blob::HttpBlobStore;
pub use http::USER_AGENT;

/// Durable object storage for file bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `file` and return where it landed.
    async fn upload(&self, file: &UploadFile, token: &str) -> Result<BlobUpload>;
}

/// Document metadata registry on the backend.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Register a stored file as a document.
    async fn create(&self, document: &NewDocument) -> Result<Document>;

    /// All documents visible to the caller.
    async fn list(&self) -> Result<Vec<Document>>;

    /// Remove a document by id.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Ranked search over document chunks.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>>;
}
