//! Upload orchestration, document registry, and search state for Paperdesk.
//!
//! This crate drives the two client workflows on top of the capability traits
//! from `paperdesk-client`:
//! - uploading a PDF (validate, store, register) with milestone progress
//! - searching ingested documents, then scoring and highlighting the results
//!
//! [`Workspace`] owns one instance of each state container.

pub mod generation;
pub mod highlight;
pub mod registry;
pub mod scoring;
pub mod search;
pub mod upload;
pub mod validator;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use generation::Generation;
pub use highlight::{Segment, highlight, highlight_pattern, render_highlight};
pub use registry::{DocumentRegistry, RegistryState};
pub use scoring::{ScoreBucket, format_file_size, format_score};
pub use search::{SearchController, SearchOverrides, SearchState, SearchStatus};
pub use upload::{
    SilentProgress, UploadMilestone, UploadOrchestrator, UploadProgressReporter, UploadState,
    UploadStatus,
};
pub use validator::{FileRejection, validate};
pub use workspace::Workspace;
