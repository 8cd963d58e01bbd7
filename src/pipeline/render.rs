//! Page rasterisation: render every document page to a `DynamicImage` via
//! pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto the blocking
//! thread pool so Tokio worker threads do not stall during CPU-heavy
//! rendering.
//!
//! ## Why a fixed 2x scale?
//!
//! Scanned filings embed their raster at the scanner's native resolution;
//! rendering the page at twice its nominal point size gives Tesseract more
//! pixels per glyph and measurably better recognition, while keeping memory
//! bounded (filing pages are A4, not posters).

use crate::error::{PageError, PipelineError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rasterise every page of the document at `scale` times its nominal size.
///
/// Returns `(page_index_0based, image)` pairs in ascending index order plus
/// any per-page render faults. A page that fails to render is skipped and
/// recorded — a single bad page must never abort the document — while a
/// document that cannot be opened at all is a fatal `CorruptDocument`.
pub async fn render_pages(
    pdf_path: &Path,
    scale: f32,
) -> Result<(Vec<(usize, DynamicImage)>, Vec<PageError>), PipelineError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || render_pages_blocking(&path, scale))
        .await
        .map_err(|e| PipelineError::Internal(format!("render task panicked: {e}")))?
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    scale: f32,
) -> Result<(Vec<(usize, DynamicImage)>, Vec<PageError>), PipelineError> {
    let pdfium = Pdfium::default();

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| PipelineError::CorruptDocument {
                path: pdf_path.to_path_buf(),
                detail: format!("{e:?}"),
            })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("document opened: {} pages", total_pages);

    let mut rendered = Vec::with_capacity(total_pages);
    let mut faults = Vec::new();

    for idx in 0..total_pages {
        match render_single_page(&pages, idx, scale) {
            Ok(image) => {
                debug!(
                    "rendered page {} → {}x{} px",
                    idx + 1,
                    image.width(),
                    image.height()
                );
                rendered.push((idx, image));
            }
            Err(detail) => {
                warn!("skipping page {}: render failed: {}", idx + 1, detail);
                faults.push(PageError::RenderFailed {
                    page: idx + 1,
                    detail,
                });
            }
        }
    }

    Ok((rendered, faults))
}

fn render_single_page(
    pages: &PdfPages<'_>,
    idx: usize,
    scale: f32,
) -> Result<DynamicImage, String> {
    let page = pages.get(idx as u16).map_err(|e| format!("{e:?}"))?;

    // Target width in pixels = nominal page width in points, upscaled.
    let target_width = (page.width().value * scale).round().max(1.0) as i32;
    let render_config = PdfRenderConfig::new().set_target_width(target_width);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| format!("{e:?}"))?;

    Ok(bitmap.as_image())
}
