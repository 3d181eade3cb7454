//! Client-side cache of registered documents.
//!
//! The list only changes on confirmed server outcomes: a successful list
//! replaces it, a successful create prepends to it, a successful delete
//! removes from it. A failed list empties it rather than keeping stale data.

use std::collections::HashSet;
use std::sync::Arc;

use paperdesk_client::DocumentApi;
use paperdesk_shared::{Document, Result};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::generation::Generation;

const FETCH_FAILED: &str = "Failed to fetch documents";
const DELETE_FAILED: &str = "Failed to delete document";

/// Observable registry state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryState {
    /// Most recent first.
    pub documents: Vec<Document>,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct DocumentRegistry {
    api: Arc<dyn DocumentApi>,
    state: watch::Sender<RegistryState>,
    fetches: Generation,
}

impl DocumentRegistry {
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        let (state, _) = watch::channel(RegistryState::default());
        Self {
            api,
            state,
            fetches: Generation::new(),
        }
    }

    /// Replace the local list with the server's.
    ///
    /// Failures are recorded in the error slot and leave the list empty.
    #[instrument(skip_all)]
    pub async fn fetch(&self) {
        let token = self.fetches.issue();
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let outcome = self.api.list().await;
        if !self.fetches.is_current(token) {
            debug!(token, "discarding stale document list");
            return;
        }

        match outcome {
            Ok(documents) => {
                let documents = dedupe(documents);
                info!(count = documents.len(), "documents fetched");
                self.state.send_modify(|s| {
                    s.documents = documents;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!(error = %e, "document fetch failed, clearing list");
                let message = e.user_message(FETCH_FAILED);
                self.state.send_modify(|s| {
                    s.documents.clear();
                    s.is_loading = false;
                    s.error = Some(message);
                });
            }
        }
    }

    /// Delete remotely, then drop `id` from the list once the server confirms.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.state.send_modify(|s| s.error = None);

        match self.api.delete(id).await {
            Ok(()) => {
                self.state.send_modify(|s| s.documents.retain(|d| d.id != id));
                info!("document deleted");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "document delete failed");
                let message = e.user_message(DELETE_FAILED);
                self.state.send_modify(|s| s.error = Some(message));
                Err(e)
            }
        }
    }

    /// Put a freshly registered document at the front, replacing any copy.
    pub(crate) fn insert_front(&self, document: Document) {
        self.state.send_modify(|s| {
            s.documents.retain(|d| d.id != document.id);
            s.documents.insert(0, document);
        });
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.state
            .borrow()
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    /// Forget everything locally. Does not fetch.
    pub fn clear(&self) {
        self.fetches.invalidate();
        self.state.send_replace(RegistryState::default());
    }

    pub fn snapshot(&self) -> RegistryState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RegistryState> {
        self.state.subscribe()
    }
}

/// Keep the first occurrence of every id.
fn dedupe(documents: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter(|d| seen.insert(d.id.clone()))
        .collect()
}
