use crate::models::VerificationResult;
use crate::services::{FaceVerifier, VerifyError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

/// Client for a DeepFace-compatible verification service
///
/// Sends both images inline as base64 data URIs to `POST {base_url}/verify`
/// and reads `verified` / `distance` from the reply.
pub struct DeepFaceClient {
    base_url: String,
    detector_backend: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct VerifyReply {
    verified: bool,
    distance: f64,
}

impl DeepFaceClient {
    pub fn new(
        base_url: String,
        detector_backend: String,
        timeout: Duration,
    ) -> Result<Self, VerifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            detector_backend,
            client,
        })
    }

    fn verify_url(&self) -> String {
        format!("{}/verify", self.base_url.trim_end_matches('/'))
    }
}

/// Read an image file into a `data:` URI
///
/// The service only decodes JPEG and PNG, so the MIME type follows the file content.
async fn data_uri(path: &Path) -> Result<String, VerifyError> {
    let bytes = tokio::fs::read(path).await?;
    let mime = match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => "image/png",
        _ => "image/jpeg",
    };
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Pull the service's own error message out of a failed reply, if it sent one
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("Verification service returned {}", status))
}

#[async_trait]
impl FaceVerifier for DeepFaceClient {
    async fn verify(
        &self,
        first: &Path,
        second: &Path,
        model: &str,
    ) -> Result<VerificationResult, VerifyError> {
        let payload = json!({
            "img1": data_uri(first).await?,
            "img2": data_uri(second).await?,
            "model_name": model,
            "detector_backend": self.detector_backend,
        });

        let url = self.verify_url();
        tracing::debug!("Calling verification service at {} (model {})", url, model);

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("Verification service error {}: {}", status, body);
            return Err(VerifyError::ApiError(error_message(status, &body)));
        }

        let reply: VerifyReply = serde_json::from_str(&body)
            .map_err(|e| VerifyError::InvalidResponse(format!("Failed to parse verify reply: {}", e)))?;

        Ok(VerificationResult::new(reply.verified, reply.distance))
    }

    fn backend(&self) -> &'static str {
        "deepface"
    }
}
