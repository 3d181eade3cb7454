//! Shared types, error model, and configuration for Paperdesk.
//!
//! This crate is the foundation depended on by all other Paperdesk crates.
//! It provides:
//! - [`PaperdeskError`] — the unified error type
//! - Domain types ([`Document`], [`UploadFile`], [`SearchQuery`], [`SearchResult`])
//! - Configuration ([`AppConfig`], config loading, token resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, BlobConfig, SearchConfig, UploadConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_blob_token, resolve_token,
};
pub use error::{PaperdeskError, Result};
pub use types::{
    BlobUpload, Document, MAX_FILE_SIZE, MAX_SEARCH_LIMIT, MIN_SEARCH_LIMIT, NewDocument,
    OCTET_STREAM_MEDIA_TYPE, PDF_MEDIA_TYPE, ProcessingStatus, SearchQuery, SearchResult,
    UploadFile, clamp_limit, media_type_for, parse_timestamp,
};
