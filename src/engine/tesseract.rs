//! Tesseract CLI engine.
//!
//! ## Why shell out instead of binding libtesseract?
//!
//! The C API needs matching system headers at build time and is easy to get
//! wrong across distros; the CLI is the stable, universally packaged surface
//! and its TSV/OSD outputs carry everything the pipeline needs (text,
//! per-token confidences, orientation). Each invocation stages the image as
//! a PNG in its own `TempDir`, which is removed when the call returns —
//! success or failure.
//!
//! Three invocation shapes are used:
//!
//! * `tesseract <img> stdout -l <lang>` — plain text
//! * `tesseract <img> stdout -l <lang> tsv` — word-level confidences
//! * `tesseract <img> stdout --psm 0` — orientation/script detection (OSD),
//!   emitting a `Rotate: <deg>` line

use super::{EngineError, OcrEngine, OcrOutput};
use async_trait::async_trait;
use image::DynamicImage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

/// `Rotate: <degrees>` in OSD output.
static OSD_ROTATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Rotate:\s*(\d+)").expect("static regex"));

/// Column count of Tesseract's TSV output; confidence lives in column 11,
/// the token text in column 12.
const TSV_COLUMNS: usize = 12;
const TSV_CONF_COLUMN: usize = 10;

/// OCR engine backed by the `tesseract` command-line binary.
pub struct TesseractEngine {
    cmd: String,
}

impl TesseractEngine {
    /// Use `cmd` as the Tesseract binary, falling back to `$TESSERACT_PATH`
    /// and then plain `tesseract` on `$PATH`.
    pub fn new(cmd: Option<String>) -> Self {
        let cmd = cmd
            .or_else(|| std::env::var("TESSERACT_PATH").ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "tesseract".to_string());
        Self { cmd }
    }

    /// Stage `image` as a PNG the binary can read.
    ///
    /// The returned `TempDir` owns the file; dropping it deletes the
    /// staging directory on every exit path.
    async fn stage_image(image: &DynamicImage) -> Result<(TempDir, PathBuf), EngineError> {
        let dir = TempDir::new().map_err(|e| EngineError::Io(e.to_string()))?;
        let path = dir.path().join("page.png");
        let img = image.clone();
        let out = path.clone();
        tokio::task::spawn_blocking(move || img.save(&out))
            .await
            .map_err(|e| EngineError::Io(format!("staging task panicked: {e}")))?
            .map_err(|e| EngineError::Io(e.to_string()))?;
        Ok((dir, path))
    }

    /// Run the binary with `args` against the staged image, returning stdout.
    async fn run(&self, image_path: &Path, args: &[&str]) -> Result<String, EngineError> {
        let output = Command::new(&self.cmd)
            .arg(image_path)
            .arg("stdout")
            .args(args)
            .output()
            .await
            .map_err(|e| EngineError::Launch {
                cmd: self.cmd.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
    ) -> Result<OcrOutput, EngineError> {
        let (_dir, path) = Self::stage_image(image).await?;

        let text = self.run(&path, &["-l", language]).await?;
        let tsv = self.run(&path, &["-l", language, "tsv"]).await?;
        let confidences = parse_tsv_confidences(&tsv);

        debug!(
            tokens = confidences.len(),
            chars = text.len(),
            "tesseract pass complete"
        );

        Ok(OcrOutput { text, confidences })
    }

    async fn detect_orientation(&self, image: &DynamicImage) -> Result<u32, EngineError> {
        let (_dir, path) = Self::stage_image(image).await?;
        let osd = self.run(&path, &["--psm", "0"]).await?;
        parse_osd_rotation(&osd)
    }
}

/// Pull word-level confidence values out of TSV output, dropping the `-1`
/// sentinel rows (structural rows and unscored tokens).
fn parse_tsv_confidences(tsv: &str) -> Vec<f32> {
    tsv.lines()
        .skip(1) // header row
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < TSV_COLUMNS {
                return None;
            }
            cols[TSV_CONF_COLUMN].trim().parse::<f32>().ok()
        })
        .filter(|conf| *conf >= 0.0)
        .collect()
}

/// Extract the `Rotate:` angle from OSD output.
fn parse_osd_rotation(osd: &str) -> Result<u32, EngineError> {
    let caps = OSD_ROTATE.captures(osd).ok_or_else(|| EngineError::Parse {
        detail: "OSD output contained no 'Rotate:' line".into(),
    })?;
    caps[1].parse::<u32>().map_err(|e| EngineError::Parse {
        detail: format!("bad OSD rotation value: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t\n\
5\t1\t1\t1\t1\t1\t10\t10\t40\t12\t96.5\tДоговор\n\
5\t1\t1\t1\t1\t2\t55\t10\t40\t12\t88.0\tза\n\
5\t1\t1\t1\t1\t3\t99\t10\t40\t12\t-1\t \n";

    #[test]
    fn tsv_confidences_skip_sentinels() {
        let confs = parse_tsv_confidences(SAMPLE_TSV);
        assert_eq!(confs, vec![96.5, 88.0]);
    }

    #[test]
    fn tsv_tolerates_short_lines() {
        assert!(parse_tsv_confidences("garbage\nshort\tline\n").is_empty());
    }

    #[test]
    fn osd_rotation_parses() {
        let osd = "Page number: 0\nOrientation in degrees: 270\nRotate: 90\nOrientation confidence: 10.5\n";
        assert_eq!(parse_osd_rotation(osd).unwrap(), 90);
    }

    #[test]
    fn osd_without_rotate_line_is_parse_error() {
        let err = parse_osd_rotation("Script: Cyrillic\n").unwrap_err();
        assert!(err.to_string().contains("Rotate"));
    }

    #[test]
    fn engine_falls_back_to_path_binary() {
        let engine = TesseractEngine::new(None);
        // Either the env override or the bare binary name; never empty.
        assert!(!engine.cmd.is_empty());
    }
}
