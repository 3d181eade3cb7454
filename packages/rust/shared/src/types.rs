//! Core domain types for Paperdesk documents and search.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PaperdeskError, Result};

/// Largest accepted upload: 50 MiB.
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// The only media type accepted for upload.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Declared media type for anything that is not recognizably a PDF.
pub const OCTET_STREAM_MEDIA_TYPE: &str = "application/octet-stream";

/// Bounds applied to every search result limit.
pub const MIN_SEARCH_LIMIT: u32 = 1;
pub const MAX_SEARCH_LIMIT: u32 = 20;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Server-side processing state of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Any status string this client does not know about.
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Processing => f.write_str("processing"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// A registered document, as returned by the metadata API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Server-assigned unique identifier.
    pub id: String,
    pub title: String,
    /// Original file name on the uploader's machine.
    pub file_name: String,
    /// Remote store URL holding the file bytes.
    pub file_url: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Accepts RFC 3339 or the backend's zone-less `YYYY-MM-DD HH:MM:SS.ffffff` (UTC).
    #[serde(alias = "uploaded_at", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Owner identifier. The list endpoint may omit it.
    #[serde(default, alias = "owner_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_status: Option<ProcessingStatus>,
}

/// Parse a server timestamp, with or without an offset.
///
/// Zone-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Body of a metadata registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub file_url: String,
    pub file_name: String,
    pub file_size: u64,
}

// ---------------------------------------------------------------------------
// Upload inputs and blob results
// ---------------------------------------------------------------------------

/// A candidate file handed to the upload orchestrator.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original file name (no directories).
    pub file_name: String,
    /// Declared media type.
    pub media_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Build a candidate from in-memory bytes.
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a candidate from disk, declaring its media type from the extension
    /// unless `media_type` is given.
    ///
    /// Files over [`MAX_FILE_SIZE`] are rejected from their metadata without
    /// being read.
    pub fn from_path(path: &Path, media_type: Option<&str>) -> Result<Self> {
        let size = std::fs::metadata(path)
            .map_err(|e| PaperdeskError::io(path, e))?
            .len();
        if size > MAX_FILE_SIZE {
            return Err(PaperdeskError::validation(format!(
                "File size exceeds {}MB limit",
                MAX_FILE_SIZE / (1024 * 1024)
            )));
        }
        let bytes = std::fs::read(path).map_err(|e| PaperdeskError::io(path, e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PaperdeskError::validation(format!("not a file path: {}", path.display()))
            })?;
        let media_type = match media_type {
            Some(m) => m.to_string(),
            None => media_type_for(&file_name).to_string(),
        };
        Ok(Self {
            file_name,
            media_type,
            bytes,
        })
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File extension without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        match self.file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }

    /// Title suggested for this file: its name with the extension removed.
    pub fn default_title(&self) -> String {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => self.file_name.clone(),
        }
    }
}

/// Media type declared for a file name.
pub fn media_type_for(file_name: &str) -> &'static str {
    let is_pdf = file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        PDF_MEDIA_TYPE
    } else {
        OCTET_STREAM_MEDIA_TYPE
    }
}

/// What the remote store hands back after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobUpload {
    /// Public URL of the stored bytes.
    pub url: String,
    /// Name assigned by this client in the remote store.
    pub storage_name: String,
    /// Original file name.
    pub file_name: String,
    pub file_size: u64,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Clamp a requested result count into the accepted range.
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(MIN_SEARCH_LIMIT, MAX_SEARCH_LIMIT)
}

/// A fully assembled search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub limit: u32,
}

impl SearchQuery {
    /// Build a query with the limit clamped into range.
    pub fn new(query: impl Into<String>, document_id: Option<String>, limit: u32) -> Self {
        Self {
            query: query.into(),
            document_id,
            limit: clamp_limit(limit),
        }
    }
}

/// One ranked chunk returned by the search capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_id: String,
    /// Opaque chunk identifier.
    pub chunk_id: String,
    pub content: String,
    /// Relevance in `[0, 1]`.
    pub score: f64,
}
