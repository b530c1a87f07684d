//! In-process ArcFace verification via ONNX Runtime.
//!
//! Embeds each normalized image with the w600k_r50 ArcFace model and compares
//! the L2-normalized embeddings by cosine distance.

use crate::models::VerificationResult;
use crate::services::{FaceVerifier, VerifyError};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const ARCFACE_INPUT_SIZE: u32 = 112;
const ARCFACE_MEAN: f32 = 127.5;
const ARCFACE_STD: f32 = 127.5; // symmetric, unlike SCRFD's 128.0
const ARCFACE_EMBEDDING_DIM: usize = 512;

/// ArcFace-based verifier. The session is shared behind a mutex since `run` needs `&mut`.
pub struct ArcFaceVerifier {
    session: Arc<Mutex<Session>>,
    threshold: f64,
}

impl ArcFaceVerifier {
    /// Load the ArcFace ONNX model from the given path.
    pub fn load(model_path: &str, threshold: f64) -> Result<Self, VerifyError> {
        if !Path::new(model_path).exists() {
            return Err(VerifyError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            threshold,
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded ArcFace model"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            threshold,
        })
    }
}

/// Preprocess an RGB face crop into a 1×3×112×112 float tensor.
fn preprocess(face: &RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(face, ARCFACE_INPUT_SIZE, ARCFACE_INPUT_SIZE, FilterType::Triangle);
    let size = ARCFACE_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - ARCFACE_MEAN) / ARCFACE_STD;
        }
    }

    tensor
}

fn l2_normalize(raw: Vec<f32>) -> Vec<f32> {
    let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        raw.iter().map(|x| x / norm).collect()
    } else {
        raw
    }
}

/// `1 - cos(a, b)`, in [0, 2]
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += (*x as f64) * (*y as f64);
        norm_a += (*x as f64).powi(2);
        norm_b += (*y as f64).powi(2);
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom > 0.0 { 1.0 - dot / denom } else { 1.0 }
}

fn embed(session: &mut Session, path: &Path) -> Result<Vec<f32>, VerifyError> {
    let face = image::ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgb8();
    let input = preprocess(&face);

    let outputs = session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

    let (_, raw) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| VerifyError::InferenceFailed(format!("embedding extraction: {e}")))?;

    if raw.len() != ARCFACE_EMBEDDING_DIM {
        return Err(VerifyError::InferenceFailed(format!(
            "expected {ARCFACE_EMBEDDING_DIM}-dim embedding, got {}",
            raw.len()
        )));
    }

    Ok(l2_normalize(raw.to_vec()))
}

#[async_trait]
impl FaceVerifier for ArcFaceVerifier {
    async fn verify(
        &self,
        first: &Path,
        second: &Path,
        model: &str,
    ) -> Result<VerificationResult, VerifyError> {
        let session = Arc::clone(&self.session);
        let (first, second): (PathBuf, PathBuf) = (first.to_path_buf(), second.to_path_buf());
        tracing::debug!("Running {} on {} and {}", model, first.display(), second.display());

        let distance = tokio::task::spawn_blocking(move || -> Result<f64, VerifyError> {
            let mut session = session
                .lock()
                .map_err(|_| VerifyError::InferenceFailed("session lock poisoned".to_string()))?;
            let a = embed(&mut session, &first)?;
            let b = embed(&mut session, &second)?;
            Ok(cosine_distance(&a, &b))
        })
        .await
        .map_err(|e| VerifyError::InferenceFailed(e.to_string()))??;

        Ok(VerificationResult::new(distance <= self.threshold, distance))
    }

    fn backend(&self) -> &'static str {
        "arcface"
    }
}
