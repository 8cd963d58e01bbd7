//! Per-page OCR extraction.
//!
//! Pages are processed **strictly in index order** — the concatenated
//! output's correctness depends on page markers appearing in ascending
//! order, so no concurrency is used inside a single document. Each page is
//! handled independently: orientation-correct, recognise, score. A page
//! whose OCR call fails is recorded as a [`PageError`] and skipped; a single
//! bad page must never abort the document. Zero recovered text is a valid
//! result from this stage — the orchestrator decides what emptiness means.

use crate::config::PipelineConfig;
use crate::engine::OcrEngine;
use crate::error::PageError;
use crate::pipeline::orient::{self, Rotation};
use image::DynamicImage;
use tracing::{debug, info, warn};

/// Literal marker inserted before each page's text in the concatenation.
pub fn page_marker(page_num: usize) -> String {
    format!("\n\n--- PAGE {page_num} ---\n\n")
}

/// Text recovered from one page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number.
    pub page_num: usize,
    pub text: String,
    /// Mean token confidence (0–100), when the engine scored any tokens.
    pub confidence: Option<f32>,
    /// Rotation that was applied before recognition.
    pub rotation: Rotation,
    /// Advisory flag: mean confidence fell below the configured threshold.
    pub low_confidence: bool,
}

/// Ordered per-page text plus the faults of pages that failed.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    /// Successfully OCR'd pages, ascending by `page_num`.
    pub pages: Vec<PageText>,
    /// Pages that were skipped, with the reason.
    pub faults: Vec<PageError>,
}

impl ExtractedText {
    /// Concatenate page texts in page order, each introduced by its marker.
    pub fn concatenated(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            out.push_str(&page_marker(page.page_num));
            out.push_str(&page.text);
        }
        out
    }

    /// True when no page yielded any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }
}

/// OCR every rendered page, in index order.
///
/// The fold is per-page try/continue: failures become `faults`, successes
/// become `pages`, and the loop always runs to the end of the document.
pub async fn extract_pages(
    engine: &dyn OcrEngine,
    mut rendered: Vec<(usize, DynamicImage)>,
    config: &PipelineConfig,
) -> ExtractedText {
    // Render order is already ascending, but the marker invariant is cheap
    // to enforce and callers may hand us pages from elsewhere.
    rendered.sort_by_key(|(idx, _)| *idx);

    let total = rendered.len();
    let mut result = ExtractedText::default();

    for (idx, image) in rendered {
        let page_num = idx + 1;
        info!("processing page {page_num} of {total}");

        let (corrected, rotation) =
            orient::detect_and_correct(engine, &image, &config.language).await;
        if rotation != Rotation::None {
            debug!("page {page_num}: rotated {}°", rotation.degrees());
        }

        let output = match engine.recognize(&corrected, &config.language).await {
            Ok(output) => output,
            Err(e) => {
                warn!("OCR failed on page {page_num}: {e}");
                result.faults.push(PageError::OcrFailed {
                    page: page_num,
                    detail: e.to_string(),
                });
                continue;
            }
        };

        let confidence = output.mean_confidence();
        let low_confidence = match confidence {
            Some(c) => {
                debug!("page {page_num}: mean confidence {c:.1}");
                c < config.low_confidence_threshold
            }
            None => false,
        };
        if low_confidence {
            warn!(
                "OCR confidence is low for page {page_num}; text may be unreliable"
            );
        }

        if output.text.trim().is_empty() {
            warn!("no text extracted from page {page_num}");
        } else {
            debug!(
                "page {page_num}: {} characters extracted",
                output.text.len()
            );
        }

        result.pages.push(PageText {
            page_num,
            text: output.text,
            confidence,
            rotation,
            low_confidence,
        });
    }

    result
}
