use crate::config::Settings;
use crate::core::acquire::{AcquireError, ImageAcquirer};
use crate::core::format::format_result;
use crate::core::normalize::{ImageNormalizer, NormalizeError, NormalizedImage};
use crate::models::{ComparisonResponse, PercentagePolicy, UploadedImage};
use crate::services::{FaceVerifier, VerifyError, MODEL_NAME};
use std::sync::Arc;
use thiserror::Error;

/// Anything that can go wrong between receiving the sources and formatting the result
///
/// The message is returned to clients verbatim.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl CompareError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CompareError::Acquire(AcquireError::Timeout { .. }))
    }
}

/// Acquire → normalize → verify → format, one image after the other
pub struct Comparator {
    acquirer: ImageAcquirer,
    normalizer: ImageNormalizer,
    verifier: Arc<dyn FaceVerifier>,
    policy: PercentagePolicy,
}

impl Comparator {
    pub fn new(
        acquirer: ImageAcquirer,
        normalizer: ImageNormalizer,
        verifier: Arc<dyn FaceVerifier>,
        policy: PercentagePolicy,
    ) -> Self {
        Self {
            acquirer,
            normalizer,
            verifier,
            policy,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        verifier: Arc<dyn FaceVerifier>,
    ) -> Result<Self, AcquireError> {
        Ok(Self::new(
            ImageAcquirer::from_settings(settings)?,
            ImageNormalizer::new(settings.normalize.size),
            verifier,
            PercentagePolicy::from_clamp_flag(settings.response.clamp_percentage),
        ))
    }

    pub fn acquirer(&self) -> &ImageAcquirer {
        &self.acquirer
    }

    /// Compare two remote images
    pub async fn compare_urls(
        &self,
        first_url: &str,
        second_url: &str,
    ) -> Result<ComparisonResponse, CompareError> {
        let first = self.fetch_normalized(first_url).await?;
        let second = self.fetch_normalized(second_url).await?;

        self.verify_and_format(first, second).await
    }

    /// Compare a remote image with an uploaded one
    pub async fn compare_mixed(
        &self,
        url: &str,
        upload: UploadedImage,
    ) -> Result<ComparisonResponse, CompareError> {
        let remote = self.fetch_normalized(url).await?;

        let stored = self.acquirer.save_upload(upload).await?;
        let uploaded = self.normalizer.normalize(stored).await?;

        self.verify_and_format(remote, uploaded).await
    }

    async fn fetch_normalized(&self, url: &str) -> Result<NormalizedImage, CompareError> {
        let downloaded = self.acquirer.download(url).await?;
        Ok(self.normalizer.normalize(downloaded).await?)
    }

    async fn verify_and_format(
        &self,
        first: NormalizedImage,
        second: NormalizedImage,
    ) -> Result<ComparisonResponse, CompareError> {
        let result = self
            .verifier
            .verify(first.path(), second.path(), MODEL_NAME)
            .await?;

        first.release();
        second.release();

        tracing::debug!(
            "Verification via {}: verified={}, distance={}",
            self.verifier.backend(),
            result.verified,
            result.distance
        );

        Ok(format_result(&result, self.policy))
    }
}
