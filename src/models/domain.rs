use serde::{Deserialize, Serialize};

/// Outcome of one face verification, as reported by the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    /// Model-specific distance, lower = more similar
    pub distance: f64,
}

impl VerificationResult {
    pub fn new(verified: bool, distance: f64) -> Self {
        Self { verified, distance }
    }

    /// `1 - distance`, unclamped
    #[inline]
    pub fn similarity(&self) -> f64 {
        1.0 - self.distance
    }
}

/// An image file received in a multipart upload, held in memory until it is stored
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Client-supplied filename. Only used for logging.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filename.trim().is_empty() || self.bytes.is_empty()
    }
}

/// How `percentageMatch` treats similarities outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PercentagePolicy {
    /// Report the rounded value as-is, negative or above 100 included
    #[default]
    Raw,
    /// Clamp to [0, 100]
    Clamped,
}

impl PercentagePolicy {
    pub fn from_clamp_flag(clamp: bool) -> Self {
        if clamp { Self::Clamped } else { Self::Raw }
    }
}
