//! Storage for deployment documentation files
//!
//! Uploads are streamed chunk by chunk into the configured directory under a
//! generated name. A rejected or aborted upload never leaves a file behind.

pub mod local;

pub use local::{LocalFileStore, PendingUpload, StoredFile};

use thiserror::Error;

/// Extensions accepted for deployment documentation (lowercase, no dot).
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid file type. Only PDF, Word, Excel, and PowerPoint files are allowed.")]
    InvalidType,
    #[error("File too large (limit {limit} bytes)")]
    TooLarge { limit: u64 },
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lowercase extension of `file_name` if it is one of [`ALLOWED_EXTENSIONS`].
pub fn check_extension(file_name: &str) -> Result<String, StorageError> {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or(StorageError::InvalidType)?;
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(StorageError::InvalidType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn office_and_pdf_extensions_accepted_case_insensitively() {
        assert_eq!(check_extension("release-notes.PDF").unwrap(), "pdf");
        assert_eq!(check_extension("plan.v2.docx").unwrap(), "docx");
        assert_eq!(check_extension("budget.Xlsx").unwrap(), "xlsx");
        assert_eq!(check_extension("deck.ppt").unwrap(), "ppt");
    }

    #[test]
    fn other_extensions_rejected() {
        assert!(matches!(check_extension("script.sh"), Err(StorageError::InvalidType)));
        assert!(matches!(check_extension("noext"), Err(StorageError::InvalidType)));
        assert!(matches!(check_extension("archive.pdf.zip"), Err(StorageError::InvalidType)));
    }
}
