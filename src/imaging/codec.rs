//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait defines the four primitives every codec must
//! support: decode, trim, resize, and encode. None of them know anything
//! about directory layout; the [`pipeline`](crate::pipeline) strings them
//! together and owns the write to disk.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec).

use super::params::{EncodeSpec, ResizeSpec, TrimSpec};
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    Trim(String),
    #[error("{0}")]
    Resize(String),
    #[error("{0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image codecs.
///
/// Every codec implements all four primitives so the pipeline is
/// codec-agnostic. `Sync` is required because the batch runner shares one
/// codec across rayon workers.
pub trait ImageCodec: Sync {
    /// Read and decode a raster file.
    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError>;

    /// Crop away a uniform border. A fully uniform image comes back unchanged.
    fn trim(&self, image: &DynamicImage, spec: TrimSpec) -> Result<DynamicImage, CodecError>;

    /// Scale to `spec.height`, preserving aspect ratio.
    fn resize(&self, image: &DynamicImage, spec: ResizeSpec) -> Result<DynamicImage, CodecError>;

    /// Encode to the requested format, returning the file bytes.
    fn encode(&self, image: &DynamicImage, spec: EncodeSpec) -> Result<Vec<u8>, CodecError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::calculations::scaled_width;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Mock codec that records operations and fabricates images of the
    /// requested size instead of touching real pixels.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockCodec {
        /// Dimensions returned by `decode`, keyed by file name.
        pub decoded: Mutex<Vec<(String, Dimensions)>>,
        /// Dimensions `trim` shrinks to; `None` keeps the input size.
        pub trim_to: Option<Dimensions>,
        /// File names whose encode step should fail.
        pub fail_encode: HashSet<String>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(String),
        Trim {
            threshold: u8,
        },
        Resize {
            from: Dimensions,
            height: u32,
        },
        Encode {
            width: u32,
            height: u32,
            quality: u32,
            effort: u32,
        },
    }

    /// Marker written into fabricated images so `encode` knows the source.
    fn tag_for(name: &str) -> u8 {
        name.bytes().fold(0u8, |acc, b| acc.wrapping_add(b))
    }

    impl MockCodec {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_images(images: Vec<(&str, Dimensions)>) -> Self {
            Self {
                decoded: Mutex::new(
                    images
                        .into_iter()
                        .map(|(name, dims)| (name.to_string(), dims))
                        .collect(),
                ),
                ..Self::default()
            }
        }

        pub fn trimming_to(mut self, dims: Dimensions) -> Self {
            self.trim_to = Some(dims);
            self
        }

        pub fn failing_encode(mut self, name: &str) -> Self {
            self.fail_encode.insert(name.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl ImageCodec for MockCodec {
        fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.record(RecordedOp::Decode(name.clone()));

            let dims = self
                .decoded
                .lock()
                .unwrap()
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, d)| *d)
                .ok_or_else(|| CodecError::Decode(format!("no mock image for {name}")))?;

            let tag = tag_for(&name);
            Ok(DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
                dims.width,
                dims.height,
                image::Rgb([tag, 0, 0]),
            )))
        }

        fn trim(&self, image: &DynamicImage, spec: TrimSpec) -> Result<DynamicImage, CodecError> {
            self.record(RecordedOp::Trim {
                threshold: spec.threshold,
            });
            Ok(match self.trim_to {
                Some(d) => image.crop_imm(0, 0, d.width, d.height),
                None => image.clone(),
            })
        }

        fn resize(
            &self,
            image: &DynamicImage,
            spec: ResizeSpec,
        ) -> Result<DynamicImage, CodecError> {
            let from = Dimensions::of(image);
            self.record(RecordedOp::Resize {
                from,
                height: spec.height,
            });
            let width = scaled_width((from.width, from.height), spec.height);
            Ok(image.resize_exact(width, spec.height, image::imageops::FilterType::Nearest))
        }

        fn encode(&self, image: &DynamicImage, spec: EncodeSpec) -> Result<Vec<u8>, CodecError> {
            self.record(RecordedOp::Encode {
                width: image.width(),
                height: image.height(),
                quality: spec.quality.value(),
                effort: spec.effort.value(),
            });
            let tag = image.to_rgb8().get_pixel(0, 0).0[0];
            let failing = self.fail_encode.iter().any(|name| tag_for(name) == tag);
            if failing {
                return Err(CodecError::Encode("mock encoder refused".to_string()));
            }
            Ok(b"RIFF\0\0\0\0WEBPmock".to_vec())
        }
    }

    #[test]
    fn mock_records_decode() {
        let codec = MockCodec::with_images(vec![(
            "a.png",
            Dimensions {
                width: 80,
                height: 60,
            },
        )]);

        let img = codec.decode(Path::new("/in/a.png")).unwrap();
        assert_eq!((img.width(), img.height()), (80, 60));

        let ops = codec.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Decode(n) if n == "a.png"));
    }

    #[test]
    fn mock_decode_unknown_file_errors() {
        let codec = MockCodec::new();
        let result = codec.decode(Path::new("/in/missing.jpg"));
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn mock_records_resize_height() {
        let codec = MockCodec::new();
        let img = DynamicImage::new_rgb8(40, 20);

        let out = codec.resize(&img, ResizeSpec::new(10, crate::imaging::OutputFormat::WebP)).unwrap();
        assert_eq!((out.width(), out.height()), (20, 10));

        assert_eq!(
            codec.get_operations(),
            vec![RecordedOp::Resize {
                from: Dimensions {
                    width: 40,
                    height: 20
                },
                height: 10
            }]
        );
    }

    #[test]
    fn dimensions_display() {
        let d = Dimensions {
            width: 933,
            height: 700,
        };
        assert_eq!(d.to_string(), "933x700");
    }
}
