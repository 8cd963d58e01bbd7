//! CLI binary for filingscan.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` and prints the result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use filingscan::{process_document, PipelineConfig, PipelineStatus};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process a filing, pretty JSON on stdout
  filingscan filing.pdf

  # Keep the OCR text for audit
  filingscan --save-text --text-dir ./audit filing.pdf

  # Faster feedback while debugging a bad scan
  filingscan -v --retry-delay 5 filing.pdf

ENVIRONMENT VARIABLES:
  AZURE_OPENAI_API_KEY          Extraction-service key (required)
  AZURE_OPENAI_ENDPOINT         e.g. https://myresource.openai.azure.com
  AZURE_OPENAI_API_VERSION      e.g. 2024-02-01
  AZURE_OPENAI_DEPLOYMENT_NAME  Deployment to call
  HTTPS_PROXY                   Proxy for the extraction call
  TESSERACT_PATH                Path to the tesseract binary
  FILINGSCAN_DEV_MODE           true/1: empty OCR degrades instead of failing

SETUP:
  1. Install tesseract with the Bulgarian traineddata (bul).
  2. Make libpdfium available (see pdfium-render docs).
  3. Put the AZURE_OPENAI_* variables in the environment or a .env file.
  4. filingscan filing.pdf
"#;

/// Extract people and companies from scanned Bulgarian regulatory filings.
#[derive(Parser, Debug)]
#[command(
    name = "filingscan",
    version,
    about = "Extract people and companies from scanned Bulgarian regulatory filings",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the scanned PDF filing.
    input: PathBuf,

    /// Tesseract language model(s).
    #[arg(long, env = "FILINGSCAN_LANGUAGE", default_value = "bul+eng")]
    language: String,

    /// Page render scale (1.0–4.0).
    #[arg(long, env = "FILINGSCAN_RENDER_SCALE", default_value_t = 2.0)]
    render_scale: f32,

    /// Mean-confidence threshold below which a page is flagged.
    #[arg(long, env = "FILINGSCAN_CONFIDENCE_THRESHOLD", default_value_t = 70.0)]
    confidence_threshold: f32,

    /// Total attempts against the extraction service.
    #[arg(long, env = "FILINGSCAN_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Base backoff in seconds between extraction attempts.
    #[arg(long, env = "FILINGSCAN_RETRY_DELAY", default_value_t = 60)]
    retry_delay: u64,

    /// Per-extraction-call timeout in seconds.
    #[arg(long, env = "FILINGSCAN_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Save the concatenated OCR text next to the result.
    #[arg(long, env = "FILINGSCAN_SAVE_TEXT")]
    save_text: bool,

    /// Directory for saved OCR text (default: current directory).
    #[arg(long, env = "FILINGSCAN_TEXT_DIR")]
    text_dir: Option<PathBuf>,

    /// Compact single-line JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is a convenience for local runs; absence is not an error.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let result = process_document(&cli.input, &config).await;

    let json = if cli.compact {
        serde_json::to_string(&result).context("serialising result")?
    } else {
        serde_json::to_string_pretty(&result).context("serialising result")?
    };
    println!("{json}");

    if result.status == PipelineStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args onto the environment-seeded `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    // Start from the environment so AZURE_OPENAI_*, HTTPS_PROXY,
    // TESSERACT_PATH and the dev-mode flag are picked up, then let flags
    // override the tunables.
    let env = PipelineConfig::from_env();

    let mut builder = PipelineConfig::builder()
        .language(cli.language.clone())
        .render_scale(cli.render_scale)
        .low_confidence_threshold(cli.confidence_threshold)
        .max_retries(cli.max_retries)
        .retry_delay_secs(cli.retry_delay)
        .api_timeout_secs(cli.api_timeout)
        .save_text(cli.save_text)
        .dev_mode(env.dev_mode);

    if let Some(ref dir) = cli.text_dir {
        builder = builder.text_output_dir(dir.clone());
    }
    if let Some(azure) = env.azure {
        builder = builder.azure(azure);
    }
    if let Some(proxy) = env.proxy {
        builder = builder.proxy(proxy);
    }
    if let Some(cmd) = env.tesseract_cmd {
        builder = builder.tesseract_cmd(cmd);
    }

    builder.build().context("invalid configuration")
}
