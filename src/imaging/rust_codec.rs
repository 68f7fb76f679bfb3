//! Production codec built on the `image` crate and libwebp.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders), format sniffed from content |
//! | Trim | [`content_bounds`] + `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → WebP | `webp` crate (libwebp), lossy, `quality` + `method` |
//!
//! The `image` crate's own WebP encoder only writes lossless files, so
//! encoding goes through libwebp directly.

use super::calculations::{content_bounds, scaled_width};
use super::codec::{CodecError, ImageCodec};
use super::params::{EncodeSpec, OutputFormat, ResizeSpec, TrimSpec};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::path::Path;
use tracing::debug;

/// Codec using the `image` crate ecosystem plus libwebp.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode as lossy WebP. `effort` maps onto libwebp's `method`.
fn encode_webp(img: &DynamicImage, spec: EncodeSpec) -> Result<Vec<u8>, CodecError> {
    let (width, height) = (img.width(), img.height());

    let mut config = webp::WebPConfig::new()
        .map_err(|_| CodecError::Encode("libwebp config initialisation failed".to_string()))?;
    config.lossless = 0;
    config.quality = spec.quality.value() as f32;
    config.method = spec.effort.value() as i32;

    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_advanced(&config)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_advanced(&config)
    };

    let memory = encoded.map_err(|e| {
        CodecError::Encode(format!("WebP encode of {width}x{height} image failed: {e:?}"))
    })?;
    Ok(memory.to_vec())
}

impl ImageCodec for RustCodec {
    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError> {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn trim(&self, img: &DynamicImage, spec: TrimSpec) -> Result<DynamicImage, CodecError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(CodecError::Trim("image has no pixels".to_string()));
        }
        match content_bounds(&img.to_rgba8(), spec.threshold) {
            Some(b) => {
                debug!(x = b.x, y = b.y, width = b.width, height = b.height, "trim box");
                Ok(img.crop_imm(b.x, b.y, b.width, b.height))
            }
            None => {
                debug!("uniform image, trim is a no-op");
                Ok(img.clone())
            }
        }
    }

    fn resize(&self, img: &DynamicImage, spec: ResizeSpec) -> Result<DynamicImage, CodecError> {
        if spec.height == 0 {
            return Err(CodecError::Resize("target height must be at least 1".to_string()));
        }
        if img.width() == 0 || img.height() == 0 {
            return Err(CodecError::Resize("image has no pixels".to_string()));
        }
        let width = scaled_width((img.width(), img.height()), spec.height);
        if width > spec.max_dimension || spec.height > spec.max_dimension {
            return Err(CodecError::Resize(format!(
                "{}x{} scaled to height {} is {width}x{} which exceeds the {} px limit",
                img.width(),
                img.height(),
                spec.height,
                spec.height,
                spec.max_dimension
            )));
        }
        Ok(img.resize_exact(width, spec.height, FilterType::Lanczos3))
    }

    fn encode(&self, img: &DynamicImage, spec: EncodeSpec) -> Result<Vec<u8>, CodecError> {
        match spec.format {
            OutputFormat::WebP => encode_webp(img, spec),
        }
    }
}
