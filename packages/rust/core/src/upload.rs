//! Upload orchestration: validate, store the bytes, register the document.
//!
//! Progress is reported as discrete milestones rather than a timer-driven
//! estimate. Each upload takes a generation token; once a newer upload has
//! started, the older one stops writing the session state.

use std::sync::Arc;
use std::time::Duration;

use paperdesk_client::{BlobStore, DocumentApi};
use paperdesk_shared::{Document, NewDocument, PaperdeskError, Result, UploadFile};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::generation::Generation;
use crate::registry::DocumentRegistry;
use crate::validator;

const UPLOAD_FAILED: &str = "Upload failed";

/// Named checkpoints of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadMilestone {
    Validated,
    RemoteUploadComplete,
    RegistrationPending,
    RegistrationComplete,
}

impl UploadMilestone {
    /// Displayed percentage once this milestone is reached.
    pub fn percent(self) -> u8 {
        match self {
            Self::Validated => 10,
            Self::RemoteUploadComplete => 60,
            Self::RegistrationPending => 75,
            Self::RegistrationComplete => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Validated => "Validated",
            Self::RemoteUploadComplete => "Stored file",
            Self::RegistrationPending => "Registering document",
            Self::RegistrationComplete => "Registered",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

/// Observable state of the current upload session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    pub status: UploadStatus,
    /// 0 to 100, non-decreasing while uploading.
    pub progress: u8,
    pub milestone: Option<UploadMilestone>,
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub error: Option<String>,
}

/// Callback for reporting upload progress to the user.
pub trait UploadProgressReporter: Send + Sync {
    /// Called when a milestone is reached.
    fn milestone(&self, milestone: UploadMilestone);
    /// Called once when the upload fails.
    fn failed(&self, message: &str);
    /// Called once when the document is registered.
    fn done(&self, document: &Document);
}

/// A no-op progress reporter.
pub struct SilentProgress;

impl UploadProgressReporter for SilentProgress {
    fn milestone(&self, _milestone: UploadMilestone) {}
    fn failed(&self, _message: &str) {}
    fn done(&self, _document: &Document) {}
}

pub struct UploadOrchestrator {
    blob: Arc<dyn BlobStore>,
    api: Arc<dyn DocumentApi>,
    registry: Arc<DocumentRegistry>,
    state: Arc<watch::Sender<UploadState>>,
    uploads: Arc<Generation>,
    reset_delay: Duration,
}

impl UploadOrchestrator {
    pub fn new(
        blob: Arc<dyn BlobStore>,
        api: Arc<dyn DocumentApi>,
        registry: Arc<DocumentRegistry>,
        reset_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(UploadState::default());
        Self {
            blob,
            api,
            registry,
            state: Arc::new(state),
            uploads: Arc::new(Generation::new()),
            reset_delay,
        }
    }

    /// Upload `file` and register it as a document titled `title`.
    ///
    /// A blank title falls back to the file name without its extension. On
    /// failure the error is recorded in the session state and returned. A
    /// registration failure leaves the stored bytes in place.
    #[instrument(skip_all, fields(file = %file.file_name, size = file.size()))]
    pub async fn upload(
        &self,
        file: &UploadFile,
        title: Option<&str>,
        blob_token: &str,
        progress: &dyn UploadProgressReporter,
    ) -> Result<Document> {
        let token = self.uploads.issue();
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| file.default_title());

        if let Err(rejection) = validator::validate(file) {
            let err = PaperdeskError::from(rejection);
            warn!(reason = %err, "upload rejected");
            let message = err.user_message(UPLOAD_FAILED);
            self.state.send_replace(UploadState {
                status: UploadStatus::Failed,
                title: Some(title),
                file_name: Some(file.file_name.clone()),
                error: Some(message.clone()),
                ..UploadState::default()
            });
            progress.failed(&message);
            return Err(err);
        }

        self.state.send_replace(UploadState {
            status: UploadStatus::Uploading,
            title: Some(title.clone()),
            file_name: Some(file.file_name.clone()),
            ..UploadState::default()
        });
        self.advance(token, UploadMilestone::Validated, progress);

        let stored = match self.blob.upload(file, blob_token).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "remote store upload failed");
                self.fail(token, &e, progress);
                return Err(e);
            }
        };
        info!(url = %stored.url, storage_name = %stored.storage_name, "file stored");
        self.advance(token, UploadMilestone::RemoteUploadComplete, progress);

        let request = NewDocument {
            title,
            file_url: stored.url,
            file_name: stored.file_name,
            file_size: stored.file_size,
        };
        self.advance(token, UploadMilestone::RegistrationPending, progress);

        let document = match self.api.create(&request).await {
            Ok(document) => document,
            Err(e) => {
                warn!(
                    error = %e,
                    file_url = %request.file_url,
                    "registration failed, stored file has no document"
                );
                self.fail(token, &e, progress);
                return Err(e);
            }
        };

        // The server has the document either way; only the session is fenced.
        self.registry.insert_front(document.clone());
        info!(id = %document.id, "document registered");

        if self.uploads.is_current(token) {
            self.advance(token, UploadMilestone::RegistrationComplete, progress);
            self.state.send_modify(|s| s.status = UploadStatus::Succeeded);
            self.schedule_reset(token);
        } else {
            debug!(token, "upload superseded, leaving session state alone");
        }
        progress.done(&document);
        Ok(document)
    }

    /// Record a failure that happened before the upload could start.
    pub(crate) fn reject(&self, err: &PaperdeskError, progress: &dyn UploadProgressReporter) {
        self.uploads.invalidate();
        let message = err.user_message(UPLOAD_FAILED);
        self.state.send_replace(UploadState {
            status: UploadStatus::Failed,
            error: Some(message.clone()),
            ..UploadState::default()
        });
        progress.failed(&message);
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    /// Back to idle. A pending delayed reset or in-flight upload no longer
    /// writes the session state.
    pub fn reset(&self) {
        self.uploads.invalidate();
        self.state.send_replace(UploadState::default());
    }

    pub fn snapshot(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    fn advance(&self, token: u64, milestone: UploadMilestone, progress: &dyn UploadProgressReporter) {
        if !self.uploads.is_current(token) {
            return;
        }
        self.state.send_modify(|s| {
            s.progress = s.progress.max(milestone.percent());
            s.milestone = Some(milestone);
        });
        debug!(?milestone, percent = milestone.percent(), "upload milestone");
        progress.milestone(milestone);
    }

    fn fail(&self, token: u64, err: &PaperdeskError, progress: &dyn UploadProgressReporter) {
        let message = err.user_message(UPLOAD_FAILED);
        if self.uploads.is_current(token) {
            self.state.send_modify(|s| {
                s.status = UploadStatus::Failed;
                s.progress = 0;
                s.milestone = None;
                s.error = Some(message.clone());
            });
        } else {
            debug!(token, "superseded upload failed, leaving session state alone");
        }
        progress.failed(&message);
    }

    fn schedule_reset(&self, token: u64) {
        let state = Arc::clone(&self.state);
        let uploads = Arc::clone(&self.uploads);
        let delay = self.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if uploads.is_current(token) {
                state.send_modify(|s| {
                    s.progress = 0;
                    s.milestone = None;
                });
            }
        });
    }
}
