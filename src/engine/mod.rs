//! OCR engine abstraction.
//!
//! The pipeline talks to OCR through the [`OcrEngine`] trait rather than a
//! concrete binding so that:
//!
//! * tests can inject deterministic mock engines (no Tesseract install, no
//!   image fixtures, no flaky confidence numbers), and
//! * the engine can be swapped without touching orientation or page-loop
//!   logic.
//!
//! The only shipped implementation is [`TesseractEngine`], which shells out
//! to the `tesseract` binary.

pub mod tesseract;

pub use tesseract::TesseractEngine;

use async_trait::async_trait;
use image::DynamicImage;
use thiserror::Error;

/// Errors raised by an OCR engine invocation.
///
/// These never escape the pipeline as-is: a failing page becomes a
/// [`crate::error::PageError`] and a failing orientation probe degrades to
/// the next fallback.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be started at all.
    #[error("failed to launch OCR engine '{cmd}': {detail}")]
    Launch { cmd: String, detail: String },

    /// The engine ran but exited unsuccessfully.
    #[error("OCR engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The engine's output could not be interpreted.
    #[error("could not parse OCR engine output: {detail}")]
    Parse { detail: String },

    /// Staging the image for the engine failed.
    #[error("image staging failed: {0}")]
    Io(String),
}

/// Raw output of one OCR pass over one image.
#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    /// Recognised text, in the engine's reading order.
    pub text: String,
    /// Per-token confidence values (0–100). Sentinel "no confidence"
    /// tokens are already filtered out.
    pub confidences: Vec<f32>,
}

impl OcrOutput {
    /// Mean per-token confidence, or `None` when the engine produced no
    /// scored tokens (blank page, for instance).
    pub fn mean_confidence(&self) -> Option<f32> {
        if self.confidences.is_empty() {
            return None;
        }
        Some(self.confidences.iter().sum::<f32>() / self.confidences.len() as f32)
    }
}

/// A character-recognition engine the pipeline can drive.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognise text in `image` using the given language model(s).
    async fn recognize(&self, image: &DynamicImage, language: &str)
        -> Result<OcrOutput, EngineError>;

    /// Detect the clockwise rotation (0/90/180/270 degrees) needed to make
    /// the page upright, via the engine's orientation-and-script detector.
    async fn detect_orientation(&self, image: &DynamicImage) -> Result<u32, EngineError>;
}
