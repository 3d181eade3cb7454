//! Composition root owning every state container.

use std::sync::Arc;

use paperdesk_client::{BlobStore, DocumentApi, HttpBlobStore, HttpDocumentApi, SearchApi};
use paperdesk_shared::{AppConfig, Document, Result, UploadFile, resolve_blob_token};
use tracing::{debug, instrument};

use crate::registry::DocumentRegistry;
use crate::search::{SearchController, SearchOverrides, SearchState, SearchStatus};
use crate::upload::{UploadOrchestrator, UploadProgressReporter};

/// One registry, one upload orchestrator, one search controller, built
/// together and torn down together.
pub struct Workspace {
    config: AppConfig,
    registry: Arc<DocumentRegistry>,
    uploads: UploadOrchestrator,
    search: SearchController,
}

impl Workspace {
    pub fn new(
        config: AppConfig,
        blob: Arc<dyn BlobStore>,
        documents: Arc<dyn DocumentApi>,
        search: Arc<dyn SearchApi>,
    ) -> Self {
        let registry = Arc::new(DocumentRegistry::new(Arc::clone(&documents)));
        let uploads = UploadOrchestrator::new(
            blob,
            documents,
            Arc::clone(&registry),
            config.upload.reset_delay(),
        );
        let search = SearchController::new(search, config.search.effective_limit());
        Self {
            config,
            registry,
            uploads,
            search,
        }
    }

    /// Wire the HTTP capabilities described by `config`.
    pub fn from_config(config: AppConfig, api_token: &str) -> Result<Self> {
        let api = Arc::new(HttpDocumentApi::from_config(&config.api, api_token)?);
        let blob = Arc::new(HttpBlobStore::from_config(&config.blob)?);
        Ok(Self::new(config, blob, api.clone(), api))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn uploads(&self) -> &UploadOrchestrator {
        &self.uploads
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    /// Search, then refresh the registry so results can show document titles.
    ///
    /// The listing is skipped when the search failed or found nothing.
    pub async fn search_with_titles(&self, overrides: SearchOverrides) -> SearchState {
        self.search.search(overrides).await;
        let state = self.search.snapshot();
        if state.status == SearchStatus::HasResults && !state.results.is_empty() {
            self.registry.fetch().await;
        }
        state
    }

    /// Upload with the blob token named in the config.
    ///
    /// A missing token is recorded as an upload failure without any call.
    #[instrument(skip_all, fields(file = %file.file_name))]
    pub async fn upload(
        &self,
        file: &UploadFile,
        title: Option<&str>,
        progress: &dyn UploadProgressReporter,
    ) -> Result<Document> {
        let token = match resolve_blob_token(&self.config) {
            Ok(token) => token,
            Err(e) => {
                self.uploads.reject(&e, progress);
                return Err(e);
            }
        };
        self.uploads.upload(file, title, &token, progress).await
    }

    /// Clear all state. Responses still in flight are discarded on arrival.
    pub fn shutdown(&self) {
        debug!("shutting down workspace");
        self.uploads.reset();
        self.search.reset();
        self.registry.clear();
    }
}
