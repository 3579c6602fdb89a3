pub mod error;

pub use error::{DetectorError, Result};

use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

// Service-side thresholds for the open-vocabulary detector. The adapter
// applies its own hard confidence floor on top of these.
const BOX_THRESHOLD: f32 = 0.45;
const TEXT_THRESHOLD: f32 = 0.35;

/// One detection as returned by the inference service: a phrase from the
/// prompt, a confidence score, and a normalized `[x1, y1, x2, y2]` box
/// with coordinates in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub label: String,
    pub confidence: f32,
    pub box_normalized: [f32; 4],
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    image: String,
    prompt: &'a str,
    box_threshold: f32,
    text_threshold: f32,
}

#[derive(Deserialize)]
struct DetectResponse {
    detections: Vec<RawDetection>,
}

/// Client for a GroundingDINO-style model served over HTTP. The model is a
/// black box here: free-text prompt in, labeled normalized boxes out.
pub struct DetectorClient {
    client: reqwest::Client,
    base_url: String,
}

impl DetectorClient {
    pub fn new(base_url: &str) -> Self {
        // Inference on CPU can take seconds per image.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Run detection on raw image bytes with a free-text category prompt.
    /// Zero detections is a normal outcome, not an error.
    pub async fn detect(&self, image: &[u8], prompt: &str) -> Result<Vec<RawDetection>> {
        let endpoint = format!("{}/detect", self.base_url);

        let body = DetectRequest {
            image: base64::engine::general_purpose::STANDARD.encode(image),
            prompt,
            box_threshold: BOX_THRESHOLD,
            text_threshold: TEXT_THRESHOLD,
        };

        debug!(bytes = image.len(), "Detector request");

        let resp = self.client.post(&endpoint).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(DetectorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: DetectResponse = resp.json().await?;
        Ok(parsed.detections)
    }
}
