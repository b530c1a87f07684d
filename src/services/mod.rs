// Face verification backends
#[cfg(feature = "onnx")]
pub mod arcface;
pub mod deepface;

#[cfg(feature = "onnx")]
pub use arcface::ArcFaceVerifier;
pub use deepface::DeepFaceClient;

use crate::config::{VerifierBackend, VerifierSettings};
use crate::models::VerificationResult;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Model identifier passed on every verification; not selectable per request
pub const MODEL_NAME: &str = "ArcFace";

/// Errors raised by a verification backend
///
/// Deliberately coarse: "no face found", "corrupt image" and "model failure"
/// all end up here and are reported by message only.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("{0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("model file not found: {0}")]
    ModelNotFound(String),

    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("Failed to read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "onnx")]
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),

    #[error("verifier backend unavailable: {0}")]
    Unavailable(String),
}

/// Opaque face-verification capability: two images and a model name in,
/// `{verified, distance}` out
#[async_trait]
pub trait FaceVerifier: Send + Sync {
    async fn verify(
        &self,
        first: &Path,
        second: &Path,
        model: &str,
    ) -> Result<VerificationResult, VerifyError>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}

/// Build the backend selected in configuration
pub fn build_verifier(settings: &VerifierSettings) -> Result<Arc<dyn FaceVerifier>, VerifyError> {
    match settings.backend {
        VerifierBackend::Deepface => {
            let client = DeepFaceClient::new(
                settings.endpoint.clone(),
                settings.detector_backend.clone(),
                Duration::from_secs(settings.timeout_secs),
            )?;
            Ok(Arc::new(client))
        }
        #[cfg(feature = "onnx")]
        VerifierBackend::Arcface => {
            let verifier = ArcFaceVerifier::load(&settings.model_path, settings.threshold)?;
            Ok(Arc::new(verifier))
        }
        #[cfg(not(feature = "onnx"))]
        VerifierBackend::Arcface => Err(VerifyError::Unavailable(
            "the arcface backend needs the `onnx` cargo feature".to_string(),
        )),
    }
}
