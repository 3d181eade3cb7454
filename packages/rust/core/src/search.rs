//! Search request assembly and result state.

use std::sync::Arc;

use paperdesk_client::SearchApi;
use paperdesk_shared::{PaperdeskError, Result, SearchQuery, SearchResult, clamp_limit};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::generation::Generation;

const EMPTY_QUERY: &str = "Please enter a search query";
const SEARCH_FAILED: &str = "Search failed. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchStatus {
    #[default]
    Idle,
    Searching,
    HasResults,
    Errored,
}

/// Observable search state.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub status: SearchStatus,
    /// The query last searched, or the one set by the caller since.
    pub query: String,
    pub document_id: Option<String>,
    /// Always within `[1, 20]`.
    pub limit: u32,
    pub results: Vec<SearchResult>,
    pub error: Option<String>,
}

impl SearchState {
    fn with_limit(limit: u32) -> Self {
        Self {
            status: SearchStatus::Idle,
            query: String::new(),
            document_id: None,
            limit: clamp_limit(limit),
            results: Vec::new(),
            error: None,
        }
    }
}

/// Per-call values that take precedence over the stored state.
///
/// An empty query or document id, or a zero limit, counts as not given.
#[derive(Debug, Clone, Default)]
pub struct SearchOverrides {
    pub query: Option<String>,
    pub document_id: Option<String>,
    pub limit: Option<u32>,
}

impl SearchOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

pub struct SearchController {
    api: Arc<dyn SearchApi>,
    state: watch::Sender<SearchState>,
    searches: Generation,
    default_limit: u32,
}

impl SearchController {
    pub fn new(api: Arc<dyn SearchApi>, default_limit: u32) -> Self {
        let (state, _) = watch::channel(SearchState::with_limit(default_limit));
        Self {
            api,
            state,
            searches: Generation::new(),
            default_limit,
        }
    }

    /// Merge `overrides` with the stored state into the request to send.
    ///
    /// The query is trimmed; an empty result is a state error.
    pub fn assemble(&self, overrides: &SearchOverrides) -> Result<SearchQuery> {
        let state = self.state.borrow();

        let query = overrides
            .query
            .as_deref()
            .filter(|q| !q.is_empty())
            .unwrap_or(state.query.as_str())
            .trim();
        if query.is_empty() {
            return Err(PaperdeskError::state(EMPTY_QUERY));
        }

        let document_id = overrides
            .document_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| state.document_id.clone());

        let limit = match overrides.limit {
            Some(n) if n > 0 => n,
            _ => state.limit,
        };

        Ok(SearchQuery::new(query, document_id, limit))
    }

    /// Run a search and record the outcome. Errors only land in state.
    #[instrument(skip_all)]
    pub async fn search(&self, overrides: SearchOverrides) {
        let request = match self.assemble(&overrides) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "search not sent");
                let message = e.to_string();
                self.state.send_modify(|s| {
                    s.status = SearchStatus::Errored;
                    s.error = Some(message);
                });
                return;
            }
        };

        let token = self.searches.issue();
        self.state.send_modify(|s| {
            s.status = SearchStatus::Searching;
            s.error = None;
        });
        debug!(
            query = %request.query,
            document_id = ?request.document_id,
            limit = request.limit,
            "sending search"
        );

        let outcome = self.api.search(&request).await;
        if !self.searches.is_current(token) {
            debug!(token, "discarding stale search response");
            return;
        }

        match outcome {
            Ok(results) => {
                info!(count = results.len(), "search complete");
                self.state.send_modify(|s| {
                    s.results = results;
                    s.query = request.query;
                    s.status = SearchStatus::HasResults;
                    s.error = None;
                });
            }
            Err(e) => {
                warn!(error = %e, "search failed");
                let message = e.user_message(SEARCH_FAILED);
                self.state.send_modify(|s| {
                    s.results.clear();
                    s.status = SearchStatus::Errored;
                    s.error = Some(message);
                });
            }
        }
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.state.send_modify(|s| s.query = query);
    }

    /// Restrict searches to one document, or lift the restriction.
    pub fn set_document_filter(&self, document_id: Option<String>) {
        let document_id = document_id.filter(|id| !id.is_empty());
        self.state.send_modify(|s| s.document_id = document_id);
    }

    /// Store `limit` clamped into `[1, 20]`.
    pub fn set_limit(&self, limit: u32) {
        self.state.send_modify(|s| s.limit = clamp_limit(limit));
    }

    /// Drop the results together with the query that produced them.
    /// Forget the results and the query. An error stays until `clear_error`.
    pub fn clear_results(&self) {
        self.searches.invalidate();
        self.state.send_modify(|s| {
            s.results.clear();
            s.query.clear();
            s.status = if s.error.is_some() {
                SearchStatus::Errored
            } else {
                SearchStatus::Idle
            };
        });
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    /// Back to the initial state with the configured default limit.
    pub fn reset(&self) {
        self.searches.invalidate();
        self.state
            .send_replace(SearchState::with_limit(self.default_limit));
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }
}
