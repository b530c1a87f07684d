use crate::core::acquire::ScopedImage;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Edge length of the square every image is resized to
pub const DEFAULT_SIZE: u32 = 224;

/// Errors that can occur while normalizing an image
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Normalization task failed: {0}")]
    Worker(String),
}

/// A scoped image whose pixels are RGB at the normalizer's fixed size
///
/// Consumed by the verification step; dropping it deletes the file.
#[derive(Debug)]
pub struct NormalizedImage {
    image: ScopedImage,
}

impl NormalizedImage {
    pub fn path(&self) -> &Path {
        self.image.path()
    }

    pub fn release(self) {
        self.image.release();
    }
}

/// Converts images to 3-channel RGB at a fixed square size, in place
#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    size: u32,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

impl ImageNormalizer {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Normalize on the blocking pool. On failure the scoped file is dropped (and deleted).
    pub async fn normalize(&self, image: ScopedImage) -> Result<NormalizedImage, NormalizeError> {
        let size = self.size;
        let path: PathBuf = image.path().to_path_buf();

        tokio::task::spawn_blocking(move || normalize_file(&path, size))
            .await
            .map_err(|e| NormalizeError::Worker(e.to_string()))??;

        tracing::debug!("Normalized {} to {}x{} RGB", image.path().display(), size, size);

        Ok(NormalizedImage { image })
    }
}

/// Decode `path`, convert to RGB, resize to `size`×`size` and overwrite the file as JPEG
///
/// The input format is sniffed from the content, whatever the extension says.
pub fn normalize_file(path: &Path, size: u32) -> Result<(), NormalizeError> {
    let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let normalized = to_rgb_square(&decoded, size);
    write_jpeg(&normalized, path)
}

/// Encode `image` as JPEG at `path`
pub fn write_jpeg(image: &DynamicImage, path: &Path) -> Result<(), NormalizeError> {
    image
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(NormalizeError::Encode)
}

/// RGB conversion followed by an exact square resize (bilinear)
pub fn to_rgb_square(image: &DynamicImage, size: u32) -> DynamicImage {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    rgb.resize_exact(size, size, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, RgbaImage};

    #[test]
    fn test_normalize_file_resizes_and_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        RgbaImage::from_pixel(40, 10, image::Rgba([200, 100, 50, 128]))
            .save(&path)
            .unwrap();

        normalize_file(&path, DEFAULT_SIZE).unwrap();

        let out = image::ImageReader::open(&path).unwrap().with_guessed_format().unwrap().decode().unwrap();
        assert_eq!(out.width(), 224);
        assert_eq!(out.height(), 224);
        assert_eq!(out.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_content_sniffed_not_extension() {
        // PNG bytes behind a .jpg name, like a downloaded file
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("download.jpg");
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3])));
        img.save_with_format(&path, ImageFormat::Png).unwrap();

        normalize_file(&path, 16).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let out = image::load_from_memory(&bytes).unwrap();
        assert_eq!((out.width(), out.height()), (16, 16));
    }

    #[test]
    fn test_invalid_image_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = normalize_file(&path, DEFAULT_SIZE).unwrap_err();
        assert!(matches!(err, NormalizeError::Decode(_)));
    }

    #[test]
    fn test_to_rgb_square_from_grayscale() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(3, 5, image::Luma([77])));
        let out = to_rgb_square(&gray, 4);
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!((out.width(), out.height()), (4, 4));
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &image::Rgb([77, 77, 77]));
    }

    #[test]
    fn test_non_jpeg_input_is_rewritten_as_jpeg() {
        // BMP content under the generated upload name
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload-abc.jpg");
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(20, 30, image::Rgb([9, 8, 7])));
        img.save_with_format(&path, ImageFormat::Bmp).unwrap();

        normalize_file(&path, DEFAULT_SIZE).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_write_failure_is_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("out.jpg");
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0])));

        let err = write_jpeg(&img, &missing).unwrap_err();

        assert!(matches!(err, NormalizeError::Encode(_)));
        assert!(err.to_string().starts_with("Failed to encode image"));
    }
}
