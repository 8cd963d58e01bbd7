//! Configuration types for the filing-extraction pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across requests, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! Environment-derived service settings (Tesseract binary, Azure OpenAI
//! credentials, proxy, dev-mode flag) are gathered **once** at process start
//! by [`PipelineConfig::from_env`] / [`AzureConfig::from_env`] and passed by
//! reference into the components — nothing deeper in the call chain reads the
//! process environment.

use crate::engine::OcrEngine;
use crate::error::PipelineError;
use crate::provider::CompletionProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Credentials and routing for the Azure OpenAI extraction service.
#[derive(Clone)]
pub struct AzureConfig {
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
    pub deployment: String,
}

impl AzureConfig {
    /// Read the four required settings from the environment.
    ///
    /// Returns `None` when any of them is missing or empty; the pipeline
    /// then fails extraction with a `ServiceUnconfigured` result instead of
    /// attempting a call.
    pub fn from_env() -> Option<Self> {
        let get = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Some(Self {
            api_key: get("AZURE_OPENAI_API_KEY")?,
            endpoint: get("AZURE_OPENAI_ENDPOINT")?,
            api_version: get("AZURE_OPENAI_API_VERSION")?,
            deployment: get("AZURE_OPENAI_DEPLOYMENT_NAME")?,
        })
    }
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .finish()
    }
}

/// Configuration for one document-processing pipeline.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use filingscan::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .language("bul+eng")
///     .retry_delay_secs(30)
///     .dev_mode(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Tesseract language model(s). Default: `"bul+eng"`.
    ///
    /// Filings mix Bulgarian body text with Latin-script names and headers.
    /// A single pass with combined traineddata covers both scripts without
    /// the merge heuristics a two-pass approach would need.
    pub language: String,

    /// Linear upscaling factor applied when rasterising each page.
    /// Default: 2.0.
    ///
    /// Rendering at twice the page's native resolution measurably improves
    /// Tesseract accuracy on scanned filings; beyond 2x the gains flatten
    /// while memory and OCR time keep growing.
    pub render_scale: f32,

    /// Mean-token-confidence threshold below which a page is flagged as
    /// low-confidence. Default: 70.0. Advisory only — never blocks the run.
    pub low_confidence_threshold: f32,

    /// Total attempts against the extraction service. Default: 3.
    pub max_retries: u32,

    /// Base backoff in seconds between extraction attempts; doubles after
    /// each failure (60 s → 120 s with the defaults). Default: 60.
    pub retry_delay_secs: u64,

    /// Persist the concatenated OCR text for audit. Default: false.
    ///
    /// Best-effort: a write failure is logged and the run continues.
    pub save_text: bool,

    /// Directory for persisted text. Default: current directory.
    pub text_output_dir: Option<PathBuf>,

    /// Degrade an empty-OCR run into a `completed_with_warnings` result
    /// instead of a `NoTextExtracted` error. Default: false.
    ///
    /// Exists so downstream consumers can be exercised without OCR
    /// infrastructure; leave off in production so real OCR failures stay
    /// visible.
    pub dev_mode: bool,

    /// Path to the `tesseract` binary. Default: `$TESSERACT_PATH`, falling
    /// back to `tesseract` on `$PATH`.
    pub tesseract_cmd: Option<String>,

    /// Azure OpenAI settings. `None` means the extraction step fails with a
    /// `ServiceUnconfigured` result.
    pub azure: Option<AzureConfig>,

    /// HTTPS proxy URL for the extraction-service call.
    pub proxy: Option<String>,

    /// Per-extraction-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Pre-constructed OCR engine. Takes precedence over `tesseract_cmd`.
    /// Used by tests to inject a mock.
    pub engine: Option<Arc<dyn OcrEngine>>,

    /// Pre-constructed extraction provider. Takes precedence over `azure`.
    /// Used by tests to inject a mock.
    pub provider: Option<Arc<dyn CompletionProvider>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "bul+eng".to_string(),
            render_scale: 2.0,
            low_confidence_threshold: 70.0,
            max_retries: 3,
            retry_delay_secs: 60,
            save_text: false,
            text_output_dir: None,
            dev_mode: false,
            tesseract_cmd: None,
            azure: None,
            proxy: None,
            api_timeout_secs: 120,
            engine: None,
            provider: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("language", &self.language)
            .field("render_scale", &self.render_scale)
            .field("low_confidence_threshold", &self.low_confidence_threshold)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("save_text", &self.save_text)
            .field("text_output_dir", &self.text_output_dir)
            .field("dev_mode", &self.dev_mode)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("azure", &self.azure)
            .field("proxy", &self.proxy)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("engine", &self.engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field(
                "provider",
                &self.provider.as_ref().map(|_| "<dyn CompletionProvider>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from the process environment.
    ///
    /// Reads `AZURE_OPENAI_*`, `TESSERACT_PATH`, `HTTPS_PROXY`, and
    /// `FILINGSCAN_DEV_MODE` exactly once, at construction time.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.azure = AzureConfig::from_env();
        config.tesseract_cmd = std::env::var("TESSERACT_PATH").ok().filter(|v| !v.is_empty());
        config.proxy = std::env::var("HTTPS_PROXY").ok().filter(|v| !v.is_empty());
        config.dev_mode = std::env::var("FILINGSCAN_DEV_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        config
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(1.0, 4.0);
        self
    }

    pub fn low_confidence_threshold(mut self, threshold: f32) -> Self {
        self.config.low_confidence_threshold = threshold.clamp(0.0, 100.0);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.max(1);
        self
    }

    pub fn retry_delay_secs(mut self, secs: u64) -> Self {
        self.config.retry_delay_secs = secs;
        self
    }

    pub fn save_text(mut self, v: bool) -> Self {
        self.config.save_text = v;
        self
    }

    pub fn text_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.text_output_dir = Some(dir.into());
        self
    }

    pub fn dev_mode(mut self, v: bool) -> Self {
        self.config.dev_mode = v;
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = Some(cmd.into());
        self
    }

    pub fn azure(mut self, azure: AzureConfig) -> Self {
        self.config.azure = Some(azure);
        self
    }

    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy = Some(url.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.language.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.max_retries == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_retries must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = PipelineConfig::default();
        assert_eq!(c.language, "bul+eng");
        assert_eq!(c.render_scale, 2.0);
        assert_eq!(c.low_confidence_threshold, 70.0);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.retry_delay_secs, 60);
        assert!(!c.dev_mode);
    }

    #[test]
    fn builder_clamps_scale() {
        let c = PipelineConfig::builder().render_scale(10.0).build().unwrap();
        assert_eq!(c.render_scale, 4.0);
    }

    #[test]
    fn builder_rejects_empty_language() {
        let err = PipelineConfig::builder().language("  ").build().unwrap_err();
        assert!(err.to_string().contains("language"));
    }

    #[test]
    fn azure_debug_redacts_key() {
        let a = AzureConfig {
            api_key: "secret".into(),
            endpoint: "https://example.openai.azure.com".into(),
            api_version: "2024-02-01".into(),
            deployment: "gpt-4o".into(),
        };
        let dbg = format!("{a:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
