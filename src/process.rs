//! Pipeline orchestration: the top-level entry points.
//!
//! The orchestrator's contract is that it **always returns a
//! [`PipelineResult`]** — internal stages fail with `Err(PipelineError)`,
//! and the entry points fold every such error into a failure-shaped result
//! with the wall-clock time attached. Callers never see a panic or a bare
//! error; the distinction they care about is carried in `status` and
//! `error`.
//!
//! Stage order is fixed: validate → render → orient+OCR → (persist) →
//! extract. The one conditional branch is the empty-text exit, where
//! `dev_mode` chooses between a degraded `completed_with_warnings` result
//! and a `NoTextExtracted` failure.

use crate::config::PipelineConfig;
use crate::engine::{OcrEngine, TesseractEngine};
use crate::error::PipelineError;
use crate::output::PipelineResult;
use crate::pipeline::{extract, input, ocr, render};
use crate::provider::{AzureOpenAiProvider, CompletionProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Number of characters kept in the result's text preview.
const PREVIEW_CHARS: usize = 200;

/// Process a document already on disk.
///
/// Never returns an error: fatal failures are folded into a
/// failure-status [`PipelineResult`].
pub async fn process_document(path: impl AsRef<Path>, config: &PipelineConfig) -> PipelineResult {
    let started = Instant::now();
    let path = path.as_ref();
    info!("processing document: {}", path.display());

    match run_pipeline(path, config, started).await {
        Ok(result) => result,
        Err(e) => {
            warn!("pipeline failed: {e}");
            PipelineResult::failure(&e, started.elapsed())
        }
    }
}

/// Process an uploaded document from raw bytes.
///
/// The bytes are staged in a temp file that is deleted when this function
/// returns, on every exit path.
pub async fn process_bytes(bytes: &[u8], config: &PipelineConfig) -> PipelineResult {
    let started = Instant::now();

    let staged = match input::StagedDocument::from_bytes(bytes) {
        Ok(staged) => staged,
        Err(e) => {
            warn!("rejecting upload: {e}");
            return PipelineResult::failure(&e, started.elapsed());
        }
    };

    match run_pipeline(staged.path(), config, started).await {
        Ok(result) => result,
        Err(e) => {
            warn!("pipeline failed: {e}");
            PipelineResult::failure(&e, started.elapsed())
        }
    }
}

/// Blocking convenience wrapper around [`process_document`].
///
/// Spins up a current-thread runtime; must not be called from inside an
/// async context.
pub fn process_document_sync(path: impl AsRef<Path>, config: &PipelineConfig) -> PipelineResult {
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(process_document(path, config)),
        Err(e) => PipelineResult::failure(
            &PipelineError::Internal(format!("failed to start runtime: {e}")),
            std::time::Duration::ZERO,
        ),
    }
}

/// The fallible pipeline body. Errors returned here are folded into
/// failure results by the public entry points.
async fn run_pipeline(
    path: &Path,
    config: &PipelineConfig,
    started: Instant,
) -> Result<PipelineResult, PipelineError> {
    input::validate_document(path)?;

    let engine: Arc<dyn OcrEngine> = match &config.engine {
        Some(engine) => Arc::clone(engine),
        None => Arc::new(TesseractEngine::new(config.tesseract_cmd.clone())),
    };

    let (rendered, render_faults) = render::render_pages(path, config.render_scale).await?;
    if !render_faults.is_empty() {
        warn!("{} page(s) failed to render", render_faults.len());
    }

    let mut extracted = ocr::extract_pages(engine.as_ref(), rendered, config).await;
    let mut faults = render_faults;
    faults.append(&mut extracted.faults);
    extracted.faults = faults;

    let text = extracted.concatenated();

    if config.save_text {
        persist_text(&text, config);
    }

    if extracted.is_blank() {
        return blank_text_outcome(config, started.elapsed());
    }

    info!(
        pages = extracted.pages.len(),
        faults = extracted.faults.len(),
        chars = text.len(),
        "text extraction complete"
    );

    // From here on the OCR text exists, so every failure keeps the text
    // stats in the result (partial success).
    let outcome = match resolve_provider(config) {
        Ok(provider) => extract::extract_entities(provider.as_ref(), &text, config).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(extraction) => Ok(PipelineResult::completed(
            extraction.entities,
            extraction.overall_extraction_quality,
            text.len(),
            preview(&text),
            started.elapsed(),
        )),
        Err(e) => {
            warn!("entity extraction failed: {e}");
            Ok(PipelineResult::extraction_failure(
                &e,
                text.len(),
                preview(&text),
                started.elapsed(),
            ))
        }
    }
}

/// Pick the injected provider or build the Azure client; no credentials is
/// a `ServiceUnconfigured` exit, never an attempted call.
fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn CompletionProvider>, PipelineError> {
    if let Some(provider) = &config.provider {
        return Ok(Arc::clone(provider));
    }
    let azure = config
        .azure
        .as_ref()
        .ok_or_else(|| PipelineError::ServiceUnconfigured {
            hint: "Set AZURE_OPENAI_API_KEY, AZURE_OPENAI_ENDPOINT, \
                   AZURE_OPENAI_API_VERSION and AZURE_OPENAI_DEPLOYMENT_NAME."
                .into(),
        })?;
    let provider =
        AzureOpenAiProvider::new(azure, config.proxy.as_deref(), config.api_timeout_secs)
            .map_err(|e| PipelineError::Internal(format!("provider setup: {e}")))?;
    Ok(Arc::new(provider))
}

/// The empty-OCR exit: dev mode downgrades to a warning-carrying success so
/// downstream consumers can be exercised without OCR infrastructure;
/// production keeps the hard error.
fn blank_text_outcome(
    config: &PipelineConfig,
    elapsed: std::time::Duration,
) -> Result<PipelineResult, PipelineError> {
    if config.dev_mode {
        warn!("no text extracted; dev mode returns a degraded result");
        return Ok(PipelineResult::degraded(
            "No text could be extracted from the document; returning empty entity list",
            elapsed,
        ));
    }
    Err(PipelineError::NoTextExtracted)
}

/// First [`PREVIEW_CHARS`] characters with newlines flattened to spaces.
fn preview(text: &str) -> String {
    text.chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

/// Best-effort audit persistence of the OCR text. A failure here is logged
/// and never affects the run.
fn persist_text(text: &str, config: &PipelineConfig) {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let file_name = format!("extracted_text_{stamp}.txt");
    let path = match &config.text_output_dir {
        Some(dir) => dir.join(file_name),
        None => file_name.into(),
    };

    match std::fs::write(&path, text) {
        Ok(()) => info!("saved extracted text to {}", path.display()),
        Err(e) => warn!("could not save extracted text to {}: {e}", path.display()),
    }
}
