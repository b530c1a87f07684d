use crate::config::Settings;
use crate::models::UploadedImage;
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Every stored image ends in `.jpg`; the normalizer re-encodes it as JPEG
const STORAGE_SUFFIX: &str = ".jpg";

/// Errors that can occur while fetching or storing an image
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("Failed to download image: request to {url} timed out")]
    Timeout { url: String },

    #[error("Failed to download image: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to download image: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Image exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AcquireError {
    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AcquireError::Timeout { url: url.to_string() }
        } else {
            AcquireError::Request(err)
        }
    }
}

/// An image file on local disk, deleted when dropped
///
/// Ownership of the file moves with the value: whichever stage holds it last
/// removes it, whether the request succeeded or not.
#[derive(Debug)]
pub struct ScopedImage {
    path: TempPath,
}

impl ScopedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. A failed delete is logged, never returned.
    pub fn release(self) {
        let shown = self.path.display().to_string();
        if let Err(e) = self.path.close() {
            tracing::warn!("Failed to delete {}: {}", shown, e);
        }
    }
}

/// Fetches remote images and stores uploaded ones
pub struct ImageAcquirer {
    client: Client,
    temp_dir: PathBuf,
    uploads_dir: PathBuf,
    max_download_bytes: u64,
}

impl ImageAcquirer {
    pub fn new(
        temp_dir: PathBuf,
        uploads_dir: PathBuf,
        timeout: Duration,
        max_download_bytes: u64,
    ) -> Result<Self, AcquireError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            temp_dir,
            uploads_dir,
            max_download_bytes,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AcquireError> {
        Self::new(
            settings.storage.temp_dir(),
            settings.storage.uploads_dir.clone(),
            Duration::from_secs(settings.download.timeout_secs),
            settings.limits.max_download_bytes,
        )
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Create the uploads directory if it does not exist yet
    pub fn ensure_uploads_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.uploads_dir)
    }

    /// Download `url` into a new temporary `.jpg` file
    ///
    /// Only a 200 response is accepted. The body is streamed to disk and
    /// aborted once it passes the configured size limit.
    pub async fn download(&self, url: &str) -> Result<ScopedImage, AcquireError> {
        tracing::debug!("Downloading image from {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AcquireError::from_reqwest(url, e))?;

        if response.status() != StatusCode::OK {
            return Err(AcquireError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_download_bytes {
                return Err(AcquireError::TooLarge { limit: self.max_download_bytes });
            }
        }

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let (file, path) = tempfile::Builder::new()
            .prefix("face-")
            .suffix(STORAGE_SUFFIX)
            .tempfile_in(&self.temp_dir)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AcquireError::from_reqwest(url, e))?
        {
            written += chunk.len() as u64;
            if written > self.max_download_bytes {
                return Err(AcquireError::TooLarge { limit: self.max_download_bytes });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        tracing::debug!("Downloaded {} bytes from {} to {}", written, url, path.display());

        Ok(ScopedImage { path })
    }

    /// Store an uploaded image in the uploads directory under a generated `.jpg` name
    ///
    /// The client filename is only logged. The content is sniffed at decode time.
    pub async fn save_upload(&self, upload: UploadedImage) -> Result<ScopedImage, AcquireError> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;

        let (file, path) = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(STORAGE_SUFFIX)
            .tempfile_in(&self.uploads_dir)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);
        file.write_all(&upload.bytes).await?;
        file.flush().await?;

        tracing::debug!(
            "Stored upload {:?} ({} bytes) as {}",
            upload.filename,
            upload.bytes.len(),
            path.display()
        );

        Ok(ScopedImage { path })
    }
}
