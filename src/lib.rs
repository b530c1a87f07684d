//! Face Compare - HTTP face verification service
//!
//! Accepts two face images (two URLs, or a URL plus an upload), normalizes them
//! to 224×224 RGB and asks a face-verification backend whether they show the
//! same person.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Comparator, CompareError, ImageAcquirer, ImageNormalizer, format_result, percentage_match};
pub use crate::models::{VerificationResult, ComparisonResponse, CompareFacesRequest, UploadedImage, PercentagePolicy};
pub use crate::services::{FaceVerifier, VerifyError, MODEL_NAME};
