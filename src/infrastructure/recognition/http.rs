//! HTTP client for the plate recognition service
//!
//! Wire format: `POST {endpoint}` with `{"image": "data:image/jpeg;base64,..."}`,
//! answered by `{"success": bool, "bike_number": string}` where `-` means
//! nothing was read.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ports::{GatewayError, ImageStore, PlateRecognizer};
use crate::domain::NO_BIKE_NUMBER;

#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionConfig {
    /// e.g. `http://localhost:5001/detect-bike-number`
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

#[derive(Serialize)]
struct DetectRequest {
    image: String,
}

#[derive(Deserialize)]
struct DetectResponse {
    success: bool,
    #[serde(default)]
    bike_number: Option<String>,
}

impl DetectResponse {
    fn plate(self) -> Option<String> {
        if !self.success {
            return None;
        }
        self.bike_number
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && p != NO_BIKE_NUMBER)
    }
}

pub struct HttpPlateRecognizer {
    client: reqwest::Client,
    endpoint: String,
    images: Arc<dyn ImageStore>,
}

impl HttpPlateRecognizer {
    pub fn new(config: &RecognitionConfig, images: Arc<dyn ImageStore>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::InvalidInput(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            images,
        })
    }
}

fn data_url(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
}

#[async_trait]
impl PlateRecognizer for HttpPlateRecognizer {
    async fn detect(&self, image_ref: &str) -> Result<Option<String>, GatewayError> {
        let bytes = self.images.load(image_ref).await?;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&DetectRequest {
                image: data_url(&bytes),
            })
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let body: DetectResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let plate = body.plate();
        debug!(image_ref, plate = ?plate, "Plate recognition finished");
        Ok(plate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> Option<String> {
        serde_json::from_str::<DetectResponse>(json).unwrap().plate()
    }

    #[test]
    fn sentinel_and_failure_mean_nothing_detected() {
        assert_eq!(response(r#"{"success":true,"bike_number":"MH12AB1234"}"#), Some("MH12AB1234".into()));
        assert_eq!(response(r#"{"success":true,"bike_number":"-"}"#), None);
        assert_eq!(response(r#"{"success":false,"bike_number":"MH12"}"#), None);
        assert_eq!(response(r#"{"success":false,"error":"no model"}"#), None);
    }

    #[test]
    fn image_is_sent_as_jpeg_data_url() {
        assert_eq!(data_url(b"abc"), "data:image/jpeg;base64,YWJj");
    }
}
