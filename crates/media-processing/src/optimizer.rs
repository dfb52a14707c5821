//! Story image optimization
//!
//! Downscales oversized photos and re-encodes them in their own format
//! before they are shown for review. The file is only replaced, by renaming a
//! staged copy over it, when the result is smaller than the original.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use app_core::camera::{CollaboratorError, ImageAsset, ImageOptimizer};
use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Longest edge of an optimized story image
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// Default JPEG quality for story images
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Errors that can occur while optimizing
#[derive(Debug, Error)]
pub enum MediaError {
    /// Image decoding error
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    /// Image encoding error
    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    /// No encoder for the image's format
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The URI does not point at a local file
    #[error("Unsupported image URI: {0}")]
    UnsupportedUri(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking worker failed
    #[error("Optimization task failed: {0}")]
    Task(String),
}

/// Result type for media operations
pub type Result<T> = std::result::Result<T, MediaError>;

/// Optimizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerOptions {
    /// Longest edge after resizing
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

/// Output of an in-memory optimization pass
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    /// Encoded bytes
    pub data: Vec<u8>,
    /// Encoding of `data`
    pub format: ImageFormat,
    /// Width after resizing
    pub width: u32,
    /// Height after resizing
    pub height: u32,
    /// Width of the decoded input
    pub original_width: u32,
    /// Height of the decoded input
    pub original_height: u32,
    /// Size of the input in bytes
    pub original_size: usize,
}

impl OptimizedImage {
    /// Input size divided by output size
    pub fn compression_ratio(&self) -> f32 {
        if self.data.is_empty() {
            return 1.0;
        }
        self.original_size as f32 / self.data.len() as f32
    }

    /// Whether re-encoding made the file smaller
    pub fn is_smaller(&self) -> bool {
        self.data.len() < self.original_size
    }

    /// Metadata of the optimized output
    pub fn optimized_asset(&self) -> ImageAsset {
        ImageAsset {
            width: self.width,
            height: self.height,
            file_size: Some(self.data.len() as u64),
            optimized: true,
            compression_ratio: Some(self.compression_ratio()),
        }
    }

    /// Metadata of the untouched input, for when the output is discarded
    pub fn original_asset(&self) -> ImageAsset {
        ImageAsset {
            width: self.original_width,
            height: self.original_height,
            file_size: Some(self.original_size as u64),
            optimized: false,
            compression_ratio: None,
        }
    }
}

/// Resizes and re-encodes images
#[derive(Debug, Clone, Default)]
pub struct StoryOptimizer {
    options: OptimizerOptions,
}

impl StoryOptimizer {
    /// Create an optimizer with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an optimizer with custom options
    pub fn with_options(options: OptimizerOptions) -> Self {
        Self { options }
    }

    /// Set the longest edge
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.options.max_dimension = max_dimension.max(1);
        self
    }

    /// Set JPEG quality
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.options.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Optimize encoded image bytes into a JPEG
    pub fn optimize_bytes(&self, bytes: &[u8]) -> Result<OptimizedImage> {
        self.optimize_bytes_as(bytes, ImageFormat::Jpeg)
    }

    /// Optimize encoded image bytes, encoding the result as `format`
    pub fn optimize_bytes_as(&self, bytes: &[u8], format: ImageFormat) -> Result<OptimizedImage> {
        let img = image::load_from_memory(bytes).map_err(|e| MediaError::DecodeError(e.to_string()))?;
        let (original_width, original_height) = img.dimensions();
        let img = self.fit(img);
        let (width, height) = img.dimensions();

        let mut data = Vec::new();
        match format {
            ImageFormat::Jpeg => {
                let encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut data, self.options.jpeg_quality);
                // JPEG has no alpha channel
                DynamicImage::ImageRgb8(img.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(|e| MediaError::EncodeError(e.to_string()))?;
            }
            ImageFormat::Png | ImageFormat::Bmp => {
                img.write_to(&mut Cursor::new(&mut data), format)
                    .map_err(|e| MediaError::EncodeError(e.to_string()))?;
            }
            other => return Err(MediaError::UnsupportedFormat(format!("{other:?}"))),
        }

        Ok(OptimizedImage {
            data,
            format,
            width,
            height,
            original_width,
            original_height,
            original_size: bytes.len(),
        })
    }

    /// Downscale so the longest edge fits, keeping the aspect ratio
    fn fit(&self, img: DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        let max = self.options.max_dimension;
        if width <= max && height <= max {
            return img;
        }
        img.resize(max, max, FilterType::Lanczos3)
    }

    /// Optimize the file at `path` in place and describe the result
    ///
    /// The output keeps the file's own format. The original is only replaced,
    /// atomically, when the result is smaller.
    pub async fn optimize_file(&self, path: &Path) -> Result<ImageAsset> {
        let optimizer = self.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || optimizer.optimize_file_blocking(&path))
            .await
            .map_err(|e| MediaError::Task(e.to_string()))?
    }

    fn optimize_file_blocking(&self, path: &Path) -> Result<ImageAsset> {
        let bytes = std::fs::read(path)?;
        let format = ImageFormat::from_path(path)
            .or_else(|_| image::guess_format(&bytes))
            .map_err(|e| MediaError::UnsupportedFormat(e.to_string()))?;
        let optimized = self.optimize_bytes_as(&bytes, format)?;

        if !optimized.is_smaller() {
            debug!(path = %path.display(), "Re-encoding did not shrink the image, keeping original");
            return Ok(optimized.original_asset());
        }

        replace_file(path, &optimized.data)?;
        debug!(
            path = %path.display(),
            ratio = optimized.compression_ratio(),
            "Image optimized"
        );
        Ok(optimized.optimized_asset())
    }
}

/// Write `data` next to `path` and rename it over the original
fn replace_file(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(data)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| MediaError::Io(e.error))?;
    Ok(())
}

/// Resolve a local image URI (`file://…` or a bare path) to a path
pub fn path_from_uri(uri: &str) -> Result<PathBuf> {
    if let Some(path) = uri.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if uri.contains("://") || uri.is_empty() {
        return Err(MediaError::UnsupportedUri(uri.to_string()));
    }
    Ok(PathBuf::from(uri))
}

#[async_trait]
impl ImageOptimizer for StoryOptimizer {
    async fn optimize(&self, uri: &str) -> std::result::Result<ImageAsset, CollaboratorError> {
        let path = path_from_uri(uri).map_err(|e| CollaboratorError::failed(e.to_string()))?;
        self.optimize_file(&path)
            .await
            .map_err(|e| CollaboratorError::failed(e.to_string()))
    }
}
