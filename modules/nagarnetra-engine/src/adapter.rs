//! Detector adapter: turns raw model output into canonical detections.
//!
//! The vision model is a black box behind [`ObjectDetector`]. The adapter
//! owns everything downstream of it: the hard confidence floor, scaling
//! normalized boxes to pixels, per-label severity, and collapsing repeated
//! labels to the highest-confidence instance.

use std::io::Cursor;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use detector_client::{DetectorClient, RawDetection};
use nagarnetra_common::{BoundingBox, Detection};

/// Free-text prompt listing the recognized civic-issue categories.
pub const CIVIC_PROMPT: &str = "pothole on road, garbage pile on street, trash dumping, \
     broken streetlight pole, open drainage, water logging on road";

/// Hard floor applied here regardless of the service-side threshold knobs.
pub const CONFIDENCE_FLOOR: f32 = 0.4;

/// Boundary trait for the vision model call.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, image: &[u8], prompt: &str) -> Result<Vec<RawDetection>>;
}

#[async_trait]
impl ObjectDetector for DetectorClient {
    async fn detect(&self, image: &[u8], prompt: &str) -> Result<Vec<RawDetection>> {
        Ok(DetectorClient::detect(self, image, prompt).await?)
    }
}

/// Per-label base weight for severity scoring. Unrecognized labels weigh 4.
fn base_weight(label: &str) -> u8 {
    match label {
        "pothole" => 8,
        "open drain" => 9,
        "water logging" => 7,
        "damaged road" => 7,
        "garbage pile" => 6,
        "broken streetlight" => 5,
        _ => 4,
    }
}

/// `min(10, round(weight * confidence))` on the 0-10 scale.
fn severity_score(label: &str, confidence: f32) -> u8 {
    let raw = (base_weight(label) as f32 * confidence).round() as u32;
    raw.min(10) as u8
}

fn scale_box(b: [f32; 4], width: u32, height: u32) -> BoundingBox {
    let px = |norm: f32, dim: u32| (norm * dim as f32).round().max(0.0) as u32;
    BoundingBox {
        x1: px(b[0], width),
        y1: px(b[1], height),
        x2: px(b[2], width),
        y2: px(b[3], height),
    }
}

/// Run detection on an image and produce canonical detections:
/// confidence-filtered, pixel-scaled, severity-scored, one per label.
///
/// Zero surviving detections means "no issue found" and is `Ok(vec![])`,
/// not an error. Label order follows first encounter in the raw output.
pub async fn analyze(detector: &dyn ObjectDetector, image: &[u8]) -> Result<Vec<Detection>> {
    let (width, height) = image::io::Reader::new(Cursor::new(image))
        .with_guessed_format()
        .context("reading image header")?
        .into_dimensions()
        .context("decoding image dimensions")?;

    let raw = detector.detect(image, CIVIC_PROMPT).await?;
    debug!(raw = raw.len(), width, height, "Detector returned");

    let mut detections: Vec<Detection> = Vec::new();
    for r in raw {
        if r.confidence < CONFIDENCE_FLOOR {
            continue;
        }
        let candidate = Detection {
            severity: severity_score(&r.label, r.confidence),
            bbox: scale_box(r.box_normalized, width, height),
            confidence: r.confidence,
            label: r.label,
        };
        // One Detection per distinct label: the highest-confidence instance
        // wins, but the label keeps its first-encounter position.
        match detections.iter_mut().find(|d| d.label == candidate.label) {
            Some(existing) => {
                if candidate.confidence > existing.confidence {
                    *existing = candidate;
                }
            }
            None => detections.push(candidate),
        }
    }

    Ok(detections)
}

/// The highest-severity detection in a batch. Ties are broken by original
/// order: the first detection with the maximum severity wins. Severity is
/// an integer in 0-10, so collisions are common and the tie-break is part
/// of the contract. (`Iterator::max_by_key` keeps the *last* maximum and
/// would silently change behavior here.)
pub fn primary_issue(detections: &[Detection]) -> Option<&Detection> {
    let mut best: Option<&Detection> = None;
    for d in detections {
        match best {
            Some(b) if d.severity > b.severity => best = Some(d),
            None => best = Some(d),
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_image, MockDetector};

    fn raw(label: &str, confidence: f32) -> RawDetection {
        RawDetection {
            label: label.to_string(),
            confidence,
            box_normalized: [0.1, 0.2, 0.5, 0.6],
        }
    }

    #[test]
    fn severity_uses_label_weights() {
        assert_eq!(severity_score("pothole", 1.0), 8);
        assert_eq!(severity_score("open drain", 1.0), 9);
        assert_eq!(severity_score("broken streetlight", 1.0), 5);
        // Unrecognized labels fall back to weight 4.
        assert_eq!(severity_score("fallen tree", 1.0), 4);
    }

    #[test]
    fn severity_rounds_and_caps_at_ten() {
        // 8 * 0.82 = 6.56 -> 7
        assert_eq!(severity_score("pothole", 0.82), 7);
        // 9 * 0.5 = 4.5 -> 5 (round half up)
        assert_eq!(severity_score("open drain", 0.5), 5);
        assert_eq!(severity_score("open drain", 2.0), 10);
    }

    #[test]
    fn boxes_scale_to_pixels_with_rounding() {
        let b = scale_box([0.1, 0.25, 0.504, 0.999], 200, 100);
        assert_eq!(b, BoundingBox { x1: 20, y1: 25, x2: 101, y2: 100 });
    }

    #[tokio::test]
    async fn low_confidence_is_dropped() {
        let detector = MockDetector::new(vec![raw("pothole", 0.39), raw("garbage pile", 0.41)]);
        let out = analyze(&detector, &test_image(200, 100)).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "garbage pile");
    }

    #[tokio::test]
    async fn floor_is_exclusive_at_exactly_point_four() {
        let detector = MockDetector::new(vec![raw("pothole", 0.4)]);
        let out = analyze(&detector, &test_image(200, 100)).await.unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_labels_keep_highest_confidence() {
        let detector = MockDetector::new(vec![
            raw("pothole", 0.55),
            raw("garbage pile", 0.61),
            raw("pothole", 0.83),
        ]);
        let out = analyze(&detector, &test_image(200, 100)).await.unwrap();
        assert_eq!(out.len(), 2);
        // First-encounter order, survivor confidence is the max.
        assert_eq!(out[0].label, "pothole");
        assert!((out[0].confidence - 0.83).abs() < 1e-6);
        assert_eq!(out[0].severity, severity_score("pothole", 0.83));
        assert_eq!(out[1].label, "garbage pile");
    }

    #[tokio::test]
    async fn zero_detections_is_not_an_error() {
        let detector = MockDetector::new(vec![]);
        let out = analyze(&detector, &test_image(64, 64)).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn unreadable_image_is_an_error() {
        let detector = MockDetector::new(vec![raw("pothole", 0.9)]);
        let result = analyze(&detector, b"not an image").await;
        assert!(result.is_err());
    }

    #[test]
    fn primary_takes_first_of_equal_severities() {
        let mk = |label: &str, severity: u8| Detection {
            label: label.to_string(),
            confidence: 0.9,
            severity,
            bbox: BoundingBox { x1: 0, y1: 0, x2: 1, y2: 1 },
        };
        let detections = vec![mk("a", 6), mk("b", 9), mk("c", 9)];
        let primary = primary_issue(&detections).unwrap();
        assert_eq!(primary.label, "b");
    }

    #[test]
    fn primary_of_empty_batch_is_none() {
        assert!(primary_issue(&[]).is_none());
    }
}
