//! Pipeline stages for filing-to-entities processing.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. a different OCR engine) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ orient ──▶ ocr ──▶ extract
//! (bytes/   (pdfium)   (OSD +    (text + (LLM +
//!  path)               fallbacks) conf)   checksum)
//! ```
//!
//! 1. [`input`]   — validate the document and stage uploaded bytes on disk
//! 2. [`render`]  — rasterise every page at 2x scale; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`orient`]  — per page, detect and apply the 0/90/180/270 rotation
//!    that makes the scan upright
//! 4. [`ocr`]     — drive the OCR engine page by page, in index order, with
//!    per-page fault accumulation
//! 5. [`extract`] — one retry-disciplined extraction-service call, then the
//!    unconditional checksum recompute

pub mod extract;
pub mod input;
pub mod ocr;
pub mod orient;
pub mod render;
