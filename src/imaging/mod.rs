//! Image primitives: decode, trim, resize, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, TIFF, WebP) |
//! | **Trim** | [`content_bounds`] scan + `crop_imm` |
//! | **Resize** | Lanczos3, height-normalised |
//! | **Encode → WebP** | libwebp via the `webp` crate |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for trim bounds and dimension math (unit testable)
//! - **Parameters**: Data structures describing the transform
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]

mod calculations;
pub mod codec;
mod params;
pub mod rust_codec;

pub use calculations::{CropBox, content_bounds, scaled_width};
pub use codec::{CodecError, Dimensions, ImageCodec};
pub use params::{
    EncodeSpec, Effort, OutputFormat, PipelineSpec, Quality, ResizeSpec, TrimSpec,
};
pub use rust_codec::RustCodec;
