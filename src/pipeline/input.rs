//! Input validation and transient staging.
//!
//! ## Why stage to a temp file?
//!
//! pdfium requires a file-system path — it cannot stream from a byte buffer.
//! Uploaded bytes are written to a [`tempfile::NamedTempFile`] whose `Drop`
//! deletes the file on **every** exit path of the orchestrator, success or
//! failure. That drop guarantee is the scoped-resource obligation from the
//! concurrency model: staged uploads must never outlive their pipeline run.
//!
//! Validation fails fast, before any OCR is attempted: missing files,
//! zero-byte files, and files without the `%PDF` magic are rejected here.

use crate::error::PipelineError;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A document staged on disk for the duration of one pipeline run.
///
/// Holds the temp file open so the backing file survives exactly as long as
/// this value does.
#[derive(Debug)]
pub struct StagedDocument {
    path: PathBuf,
    _file: NamedTempFile,
}

impl StagedDocument {
    /// Stage raw uploaded bytes and validate them as a document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let mut file = NamedTempFile::new()
            .map_err(|e| PipelineError::Internal(format!("staging file: {e}")))?;
        file.write_all(bytes)
            .map_err(|e| PipelineError::Internal(format!("staging write: {e}")))?;
        file.flush()
            .map_err(|e| PipelineError::Internal(format!("staging flush: {e}")))?;

        let path = file.path().to_path_buf();
        validate_document(&path)?;
        debug!("staged {} bytes at {}", bytes.len(), path.display());

        Ok(Self { path, _file: file })
    }

    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reject inputs the pipeline cannot process, before any rendering.
///
/// Checks, in order: the file exists and is readable, is not zero bytes,
/// and starts with the `%PDF` magic.
pub fn validate_document(path: &Path) -> Result<(), PipelineError> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => PipelineError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => PipelineError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    if metadata.len() == 0 {
        return Err(PipelineError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }

    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => PipelineError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => PipelineError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
        return Err(PipelineError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    Ok(())
}
