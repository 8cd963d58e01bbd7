//! # filingscan
//!
//! Extract people and companies — with verified national identifiers — from
//! scanned Bulgarian regulatory filings.
//!
//! ## Why this crate?
//!
//! Regulatory filings arrive as image-only PDF scans: no text layer, pages
//! sometimes sideways or upside down, quality all over the map. Naive text
//! extraction gets nothing, and OCR alone gets an unstructured wall of
//! Cyrillic. This crate runs the full chain — rasterise, straighten, OCR,
//! LLM-extract — and then refuses to trust the model about the one thing
//! that matters: every EGN and EIK checksum is recomputed locally before an
//! entity is reported as valid.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate %PDF magic, stage uploads in a temp file
//!  ├─ 2. Render   rasterise pages at 2x via pdfium (spawn_blocking)
//!  ├─ 3. Orient   OSD, geometric confirmation, brute-force OCR probe
//!  ├─ 4. OCR      Tesseract per page (bul+eng), per-page fault capture
//!  ├─ 5. Extract  one JSON-mode LLM call, 3 attempts with backoff
//!  └─ 6. Verify   recompute EGN/EIK checksums, assemble PipelineResult
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filingscan::{process_document, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Azure OpenAI settings are read from AZURE_OPENAI_* variables.
//!     let config = PipelineConfig::from_env();
//!     let result = process_document("filing.pdf", &config).await;
//!     println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! }
//! ```
//!
//! `process_document` never fails: every outcome, including fatal errors,
//! arrives as a [`PipelineResult`] whose `status` and `error` fields say
//! what happened.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `filingscan` binary (clap + anyhow + tracing-subscriber + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! filingscan = { version = "0.3", default-features = false }
//! ```
//!
//! ## External tools
//!
//! OCR shells out to the `tesseract` binary (set `TESSERACT_PATH` if it is
//! not on `PATH`) and needs the `bul` traineddata installed. Rendering uses
//! the pdfium dynamic library via `pdfium-render`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod provider;
pub mod validate;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AzureConfig, PipelineConfig, PipelineConfigBuilder};
pub use engine::{OcrEngine, TesseractEngine};
pub use error::{PageError, PipelineError};
pub use output::{
    Entity, EntityType, IdentificationType, PipelineResult, PipelineStatus, Validity,
};
pub use process::{process_bytes, process_document, process_document_sync};
pub use provider::{AzureOpenAiProvider, CompletionProvider};
pub use validate::{validate_company_id, validate_person_id};
pub use workflow::{FilingWorkflow, Workflow};
