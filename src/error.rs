//! Error types for the filingscan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PipelineError`] — **Fatal**: the run cannot proceed or produce
//!   entities (unreadable input, no text at all, extraction service missing
//!   or exhausted). Internally these travel as `Err(PipelineError)`; the
//!   top-level entry points fold them into a failure-shaped
//!   [`crate::output::PipelineResult`] so callers always get a result object.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (render glitch,
//!   one bad OCR invocation) but the remaining pages are fine. Collected in
//!   [`crate::pipeline::ocr::ExtractedText`] so callers can inspect partial
//!   success rather than losing the whole document to one bad page.
//!
//! The separation encodes the propagation policy: page-local failures are
//! swallowed and downgraded, pipeline-level failures surface as a structured
//! error result.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors produced by the filingscan pipeline.
///
/// Page-level failures use [`PageError`] and are stored alongside the
/// extracted text rather than propagated here.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists but is zero bytes long.
    #[error("document '{path}' is empty (zero bytes)")]
    EmptyDocument { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("file is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("document '{path}' is structurally unreadable: {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// OCR ran across every page and produced no text at all.
    ///
    /// Recoverable: with `dev_mode` enabled the orchestrator downgrades this
    /// to a `completed_with_warnings` result with zero entities.
    #[error("no text was extracted from the document")]
    NoTextExtracted,

    // ── Extraction-service errors ─────────────────────────────────────────
    /// The structured-extraction service has no credentials/endpoint
    /// configured. Fatal, never retried.
    #[error("extraction service is not configured.\n{hint}")]
    ServiceUnconfigured { hint: String },

    /// Every attempt against the extraction service failed.
    #[error("extraction service call failed after {attempts} attempts: {detail}")]
    ServiceCallFailed { attempts: u32, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// True for the branch the orchestrator may downgrade under dev mode.
    pub fn is_no_text(&self) -> bool {
        matches!(self, PipelineError::NoTextExtracted)
    }
}

/// A non-fatal error for a single page.
///
/// Recorded in [`crate::pipeline::ocr::ExtractedText::faults`] when a page
/// fails. The overall extraction continues with the remaining pages.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The OCR engine failed on this page.
    #[error("page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-based number of the page this fault belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. } | PageError::OcrFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_call_failed_display() {
        let e = PipelineError::ServiceCallFailed {
            attempts: 3,
            detail: "HTTP 503".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("3 attempts"), "got: {msg}");
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn page_error_carries_page_number() {
        let e = PageError::OcrFailed {
            page: 4,
            detail: "engine crashed".into(),
        };
        assert_eq!(e.page(), 4);
        assert!(e.to_string().contains("page 4"));
    }

    #[test]
    fn no_text_is_downgradable() {
        assert!(PipelineError::NoTextExtracted.is_no_text());
        assert!(!PipelineError::InvalidConfig("x".into()).is_no_text());
    }
}
