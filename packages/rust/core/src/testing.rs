//! In-memory capability fakes for core tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use paperdesk_client::{BlobStore, DocumentApi, SearchApi};
use paperdesk_shared::{
    BlobUpload, Document, NewDocument, PDF_MEDIA_TYPE, PaperdeskError, Result, SearchQuery,
    SearchResult, UploadFile,
};
use tokio::sync::Notify;

use crate::upload::{UploadMilestone, UploadProgressReporter};

/// Scripted failure for a fake call.
#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Service(String),
    Transport,
}

impl Failure {
    fn into_error(self) -> PaperdeskError {
        match self {
            Self::Service(msg) => PaperdeskError::service(Some(500), msg),
            Self::Transport => PaperdeskError::Transport("connection refused".into()),
        }
    }
}

/// Holds the first call of a fake until the test releases it.
#[derive(Debug, Default)]
pub(crate) struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

pub(crate) fn document(id: &str, title: &str) -> Document {
    Document {
        id: id.to_string(),
        title: title.to_string(),
        file_name: format!("{title}.pdf"),
        file_url: format!("https://store.test/{id}.pdf"),
        file_size: 1024,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        user_id: Some("user-1".into()),
        page_count: None,
        processing_status: None,
    }
}

pub(crate) fn result(document_id: &str, content: &str, score: f64) -> SearchResult {
    SearchResult {
        document_id: document_id.to_string(),
        chunk_id: format!("{document_id}-chunk"),
        content: content.to_string(),
        score,
    }
}

pub(crate) fn pdf(name: &str) -> UploadFile {
    UploadFile::new(name, PDF_MEDIA_TYPE, b"%PDF-1.7".to_vec())
}

// ---------------------------------------------------------------------------
// Blob store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub(crate) struct FakeBlobStore {
    pub failure: Mutex<Option<Failure>>,
    pub uploads: Mutex<Vec<(String, String)>>,
}

impl FakeBlobStore {
    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Mutex::new(Some(failure)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn upload(&self, file: &UploadFile, token: &str) -> Result<BlobUpload> {
        self.uploads
            .lock()
            .unwrap()
            .push((file.file_name.clone(), token.to_string()));
        if let Some(failure) = self.failure.lock().unwrap().clone() {
            return Err(failure.into_error());
        }
        Ok(BlobUpload {
            url: format!("https://store.test/{}", file.file_name),
            storage_name: file.file_name.clone(),
            file_name: file.file_name.clone(),
            file_size: file.size(),
        })
    }
}

// ---------------------------------------------------------------------------
// Document metadata API
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub(crate) struct FakeDocumentApi {
    pub documents: Mutex<Vec<Document>>,
    pub list_failure: Mutex<Option<Failure>>,
    pub create_failure: Mutex<Option<Failure>>,
    pub delete_failure: Mutex<Option<Failure>>,
    pub created: Mutex<Vec<NewDocument>>,
    pub deleted: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
    /// When set, the next `list` waits on it.
    pub list_gate: Mutex<Option<Arc<Gate>>>,
    /// When set, the next `create` waits on it.
    pub create_gate: Mutex<Option<Arc<Gate>>>,
    /// When set, the next `delete` waits on it.
    pub delete_gate: Mutex<Option<Arc<Gate>>>,
    next_id: AtomicUsize,
}

impl FakeDocumentApi {
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Mutex::new(documents),
            ..Self::default()
        }
    }

    pub fn fail_list(&self, failure: Failure) {
        *self.list_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_create(&self, failure: Failure) {
        *self.create_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_delete(&self, failure: Failure) {
        *self.delete_failure.lock().unwrap() = Some(failure);
    }

    pub fn gate_list(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.list_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn gate_create(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.create_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn gate_delete(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.delete_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn delete_calls(&self) -> usize {
        self.deleted.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentApi for FakeDocumentApi {
    async fn create(&self, request: &NewDocument) -> Result<Document> {
        self.created.lock().unwrap().push(request.clone());
        let gate = self.create_gate.lock().unwrap().take();
        let failure = self.create_failure.lock().unwrap().clone();
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }
        let mut created = document(&format!("doc-new-{n}"), &request.title);
        created.file_name = request.file_name.clone();
        created.file_url = request.file_url.clone();
        created.file_size = request.file_size;
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Document>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.list_gate.lock().unwrap().take();
        let failure = self.list_failure.lock().unwrap().clone();
        let documents = self.documents.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        match failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(documents),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(id.to_string());
        let gate = self.delete_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        let failure = self.delete_failure.lock().unwrap().clone();
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }
        self.documents.lock().unwrap().retain(|d| d.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Search API
// ---------------------------------------------------------------------------

type Reply = std::result::Result<Vec<SearchResult>, Failure>;

#[derive(Debug, Default)]
pub(crate) struct FakeSearchApi {
    /// Replies handed out in order; an empty queue answers with no results.
    pub replies: Mutex<VecDeque<Reply>>,
    pub calls: Mutex<Vec<SearchQuery>>,
    /// When set, the next `search` waits on it.
    pub gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeSearchApi {
    pub fn replying(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn gate_next(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<SearchQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchApi for FakeSearchApi {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.calls.lock().unwrap().push(query.clone());
        let gate = self.gate.lock().unwrap().take();
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        if let Some(gate) = gate {
            gate.pass().await;
        }
        reply.map_err(Failure::into_error)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Records every progress callback in order.
#[derive(Debug, Default)]
pub(crate) struct RecordingProgress {
    pub milestones: Mutex<Vec<UploadMilestone>>,
    pub failures: Mutex<Vec<String>>,
    pub completed: Mutex<Vec<String>>,
}

impl UploadProgressReporter for RecordingProgress {
    fn milestone(&self, milestone: UploadMilestone) {
        self.milestones.lock().unwrap().push(milestone);
    }

    fn failed(&self, message: &str) {
        self.failures.lock().unwrap().push(message.to_string());
    }

    fn done(&self, document: &Document) {
        self.completed.lock().unwrap().push(document.id.clone());
    }
}
