//! Upload preconditions, checked before any network interaction.

use paperdesk_shared::{MAX_FILE_SIZE, PDF_MEDIA_TYPE, PaperdeskError, UploadFile};

/// Why a candidate file cannot be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRejection {
    /// Larger than [`MAX_FILE_SIZE`].
    TooLarge { size: u64 },
    /// Declared media type is not exactly `application/pdf`.
    UnsupportedType { media_type: String },
}

impl std::fmt::Display for FileRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLarge { .. } => write!(
                f,
                "File size exceeds {}MB limit",
                MAX_FILE_SIZE / (1024 * 1024)
            ),
            Self::UnsupportedType { .. } => f.write_str("Only PDF files are allowed"),
        }
    }
}

impl From<FileRejection> for PaperdeskError {
    fn from(rejection: FileRejection) -> Self {
        PaperdeskError::validation(rejection.to_string())
    }
}

/// Check size first, then media type.
pub fn validate(file: &UploadFile) -> Result<(), FileRejection> {
    let size = file.size();
    if size > MAX_FILE_SIZE {
        return Err(FileRejection::TooLarge { size });
    }
    if file.media_type != PDF_MEDIA_TYPE {
        return Err(FileRejection::UnsupportedType {
            media_type: file.media_type.clone(),
        });
    }
    Ok(())
}
