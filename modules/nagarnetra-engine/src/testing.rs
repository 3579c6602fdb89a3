//! Test doubles for the engine's trait boundaries.
//!
//! - `MockDetector` (ObjectDetector) — fixed raw detections
//! - `ScriptedInsightModel` / `FailingInsightModel` (InsightModel)
//! - `test_image` — a real encodable PNG so the adapter can read dimensions

use std::io::Cursor;

use anyhow::{bail, Result};
use async_trait::async_trait;

use detector_client::RawDetection;

use crate::adapter::ObjectDetector;
use crate::insight::InsightModel;

/// Connaught Place, Delhi.
pub const CONNAUGHT_PLACE: (f64, f64) = (28.6315, 77.2167);
/// India Gate, Delhi — ~2.4 km from Connaught Place.
pub const INDIA_GATE: (f64, f64) = (28.6129, 77.2295);

/// Offset a latitude north by roughly `meters` (1 deg latitude ~ 111.32 km).
pub fn north_of(lat: f64, meters: f64) -> f64 {
    lat + meters / 111_320.0
}

/// A solid PNG with known dimensions.
pub fn test_image(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .expect("encoding test image");
    buf
}

/// Detector returning a fixed batch regardless of input.
pub struct MockDetector {
    detections: Vec<RawDetection>,
}

impl MockDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self { detections }
    }
}

#[async_trait]
impl ObjectDetector for MockDetector {
    async fn detect(&self, _image: &[u8], _prompt: &str) -> Result<Vec<RawDetection>> {
        Ok(self.detections.clone())
    }
}

/// Detector whose call always fails, for error-path tests.
pub struct FailingDetector;

#[async_trait]
impl ObjectDetector for FailingDetector {
    async fn detect(&self, _image: &[u8], _prompt: &str) -> Result<Vec<RawDetection>> {
        bail!("inference service unavailable")
    }
}

/// Insight model returning a fixed text response.
pub struct ScriptedInsightModel {
    response: String,
}

impl ScriptedInsightModel {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

#[async_trait]
impl InsightModel for ScriptedInsightModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}

/// Insight model whose call always fails.
pub struct FailingInsightModel;

#[async_trait]
impl InsightModel for FailingInsightModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("upstream text service unavailable")
    }
}
