//! Page-orientation detection and correction.
//!
//! Scanned filings routinely arrive sideways or upside down — feeding a
//! rotated page to the OCR engine yields garbage with high confidence on
//! nothing. Detection runs three strategies in priority order:
//!
//! 1. **Primary** — the engine's orientation-and-script detector (OSD).
//!    A non-zero answer is accepted as-is.
//! 2. **Geometric confirmation** — only when OSD reports 0°. The page is
//!    Otsu-binarised and the minimal bounding rectangle of the ink pixels is
//!    measured; a tilt beyond 5° is taken as evidence of a 90° rotation.
//! 3. **Brute force** — only when OSD *fails*. OCR the page at each of
//!    0/90/180/270 and keep the angle with the highest mean token
//!    confidence; ties keep 0°.
//!
//! Failures never propagate: an OSD error degrades to brute force, and if
//! every brute-force angle fails the page is left unrotated. The input image
//! is never mutated — correction returns a new buffer.

use crate::engine::OcrEngine;
use image::{imageops, DynamicImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use tracing::{debug, warn};

/// Tilt magnitude (degrees) below which the geometric check stays quiet.
const TILT_THRESHOLD_DEG: f32 = 5.0;

/// Clockwise rotation applied to make a page upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// All candidate rotations, in brute-force probe order.
    pub const ALL: [Rotation; 4] = [
        Rotation::None,
        Rotation::Cw90,
        Rotation::Cw180,
        Rotation::Cw270,
    ];

    /// Interpret an OSD `Rotate:` value; anything but the four right angles
    /// maps to `None`.
    pub fn from_degrees(degrees: u32) -> Rotation {
        match degrees % 360 {
            90 => Rotation::Cw90,
            180 => Rotation::Cw180,
            270 => Rotation::Cw270,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    /// Apply this rotation, returning a new buffer.
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Rotation::None => image.clone(),
            Rotation::Cw90 => DynamicImage::ImageRgba8(imageops::rotate90(&image.to_rgba8())),
            Rotation::Cw180 => DynamicImage::ImageRgba8(imageops::rotate180(&image.to_rgba8())),
            Rotation::Cw270 => DynamicImage::ImageRgba8(imageops::rotate270(&image.to_rgba8())),
        }
    }
}

/// Detect the rotation that makes `image` upright and apply it.
///
/// Never fails; the worst case is an unrotated copy of the input.
pub async fn detect_and_correct(
    engine: &dyn OcrEngine,
    image: &DynamicImage,
    language: &str,
) -> (DynamicImage, Rotation) {
    let rotation = match engine.detect_orientation(image).await {
        Ok(0) => {
            // OSD can miss sideways pages of sparse tabular filings; a
            // zero answer gets a second opinion from page geometry.
            match geometric_hint(image) {
                Some(rotation) => {
                    debug!("geometric check overrides OSD 0° → {}°", rotation.degrees());
                    rotation
                }
                None => Rotation::None,
            }
        }
        Ok(degrees) => {
            debug!("OSD detected rotation: {degrees}°");
            Rotation::from_degrees(degrees)
        }
        Err(e) => {
            warn!("orientation detection failed ({e}), probing all angles");
            brute_force(engine, image, language).await
        }
    };

    (rotation.apply(image), rotation)
}

/// Geometric fallback: measure the tilt of the ink's minimal bounding
/// rectangle on the binarised page.
///
/// An upright (or cleanly inverted) page yields an axis-aligned rectangle
/// with near-zero tilt; a page scanned on its side leaves the rectangle
/// visibly skewed. Tilt beyond the threshold is treated as evidence of a
/// 90° rotation.
fn geometric_hint(image: &DynamicImage) -> Option<Rotation> {
    let gray = image.to_luma8();
    let level = otsu_level(&gray);
    // Inverted so ink becomes foreground on scans with light backgrounds.
    let binary = threshold(&gray, level, ThresholdType::BinaryInverted);

    let points: Vec<Point<i32>> = binary
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, y, _)| Point::new(x as i32, y as i32))
        .collect();
    if points.len() < 2 {
        return None;
    }

    let corners = min_area_rect(&points);
    let tilt = rect_tilt(&corners);
    debug!("ink bounding rectangle tilt: {tilt:.2}°");

    if tilt.abs() > TILT_THRESHOLD_DEG {
        Some(Rotation::Cw90)
    } else {
        None
    }
}

/// Deviation of the rectangle's first edge from the nearest image axis,
/// folded into `[-45, 45]` degrees.
fn rect_tilt(corners: &[Point<i32>; 4]) -> f32 {
    let dx = (corners[1].x - corners[0].x) as f32;
    let dy = (corners[1].y - corners[0].y) as f32;
    let folded = dy.atan2(dx).to_degrees().rem_euclid(90.0);
    if folded > 45.0 {
        folded - 90.0
    } else {
        folded
    }
}

/// Probe every right-angle rotation with a confidence-scored OCR pass and
/// keep the best. Ties keep 0° because `ALL` starts there and replacement is
/// strictly-greater.
async fn brute_force(engine: &dyn OcrEngine, image: &DynamicImage, language: &str) -> Rotation {
    let mut best = Rotation::None;
    let mut best_confidence = f32::MIN;

    for rotation in Rotation::ALL {
        let candidate = rotation.apply(image);
        match engine.recognize(&candidate, language).await {
            Ok(output) => {
                let confidence = output.mean_confidence().unwrap_or(0.0);
                debug!("angle {}° — mean confidence {confidence:.1}", rotation.degrees());
                if confidence > best_confidence {
                    best_confidence = confidence;
                    best = rotation;
                }
            }
            Err(e) => {
                warn!("probe at {}° failed: {e}", rotation.degrees());
            }
        }
    }

    if best_confidence == f32::MIN {
        warn!("every orientation probe failed, keeping 0°");
        return Rotation::None;
    }

    debug!("selected rotation {}°", best.degrees());
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, OcrOutput};
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn blank_page(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        ))
    }

    /// Engine whose OSD always fails and whose recognition returns the next
    /// confidence from a fixed script, in call order.
    struct ProbeEngine {
        confidences: Vec<f32>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OcrEngine for ProbeEngine {
        async fn recognize(
            &self,
            _image: &DynamicImage,
            _language: &str,
        ) -> Result<OcrOutput, EngineError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OcrOutput {
                text: "probe".into(),
                confidences: vec![self.confidences[i % self.confidences.len()]],
            })
        }

        async fn detect_orientation(&self, _image: &DynamicImage) -> Result<u32, EngineError> {
            Err(EngineError::Parse {
                detail: "no OSD".into(),
            })
        }
    }

    /// Engine that reports a fixed OSD answer.
    struct OsdEngine(u32);

    #[async_trait]
    impl OcrEngine for OsdEngine {
        async fn recognize(
            &self,
            _image: &DynamicImage,
            _language: &str,
        ) -> Result<OcrOutput, EngineError> {
            Ok(OcrOutput::default())
        }

        async fn detect_orientation(&self, _image: &DynamicImage) -> Result<u32, EngineError> {
            Ok(self.0)
        }
    }

    #[test]
    fn rotation_apply_swaps_dimensions() {
        let img = blank_page(10, 20);
        let rotated = Rotation::Cw90.apply(&img);
        assert_eq!((rotated.width(), rotated.height()), (20, 10));
        let upside_down = Rotation::Cw180.apply(&img);
        assert_eq!((upside_down.width(), upside_down.height()), (10, 20));
    }

    #[test]
    fn rotation_from_degrees_rejects_odd_angles() {
        assert_eq!(Rotation::from_degrees(90), Rotation::Cw90);
        assert_eq!(Rotation::from_degrees(450), Rotation::Cw90);
        assert_eq!(Rotation::from_degrees(45), Rotation::None);
    }

    #[test]
    fn blank_page_has_no_geometric_hint() {
        assert_eq!(geometric_hint(&blank_page(40, 60)), None);
    }

    #[tokio::test]
    async fn osd_answer_is_accepted() {
        let engine = OsdEngine(180);
        let (corrected, rotation) =
            detect_and_correct(&engine, &blank_page(10, 20), "bul+eng").await;
        assert_eq!(rotation, Rotation::Cw180);
        assert_eq!((corrected.width(), corrected.height()), (10, 20));
    }

    #[tokio::test]
    async fn brute_force_picks_highest_confidence_angle() {
        // Probe order 0/90/180/270 — the second probe (90°) wins.
        let engine = ProbeEngine {
            confidences: vec![41.0, 88.0, 52.0, 12.0],
            calls: AtomicUsize::new(0),
        };
        let (corrected, rotation) =
            detect_and_correct(&engine, &blank_page(10, 20), "bul+eng").await;
        assert_eq!(rotation, Rotation::Cw90);
        assert_eq!((corrected.width(), corrected.height()), (20, 10));
    }

    #[tokio::test]
    async fn brute_force_tie_keeps_zero() {
        let engine = ProbeEngine {
            confidences: vec![70.0, 70.0, 70.0, 70.0],
            calls: AtomicUsize::new(0),
        };
        let (_, rotation) = detect_and_correct(&engine, &blank_page(8, 8), "bul+eng").await;
        assert_eq!(rotation, Rotation::None);
    }

    /// Engine where both OSD and recognition fail — correction must still
    /// return an unrotated copy rather than an error.
    struct DeadEngine;

    #[async_trait]
    impl OcrEngine for DeadEngine {
        async fn recognize(
            &self,
            _image: &DynamicImage,
            _language: &str,
        ) -> Result<OcrOutput, EngineError> {
            Err(EngineError::Io("dead".into()))
        }

        async fn detect_orientation(&self, _image: &DynamicImage) -> Result<u32, EngineError> {
            Err(EngineError::Io("dead".into()))
        }
    }

    #[tokio::test]
    async fn total_engine_failure_defaults_to_zero() {
        let (_, rotation) = detect_and_correct(&DeadEngine, &blank_page(8, 8), "bul+eng").await;
        assert_eq!(rotation, Rotation::None);
    }
}
