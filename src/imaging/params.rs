//! Parameter types for the trim → resize → encode transform.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`pipeline`](crate::pipeline) (which sequences the
//! steps) and the [`codec`](super::codec) (which does the actual pixel work).
//! This separation allows swapping codecs (e.g. for testing with a mock)
//! without changing pipeline logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (0–100, default 80). Clamped on construction.
//! - [`Effort`]: Encoder effort / compression method (0–6, default 6). Clamped on construction.
//! - [`TrimSpec`]: Background-trim threshold.
//! - [`ResizeSpec`]: Target output height.
//! - [`EncodeSpec`]: Output format plus quality and effort.
//! - [`PipelineSpec`]: All three, as handed to [`transform`](crate::pipeline::transform).

use serde::Serialize;

/// Quality setting for lossy image encoding (0-100).
///
/// Only [`Quality::new`] builds one, so the value is always in range:
///
/// ```compile_fail
/// let q = trimpress::imaging::Quality(150);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quality(u32);

impl Quality {
    pub const MAX: u32 = 100;

    pub fn new(value: u32) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Encoder effort: higher spends more CPU time for smaller output at the
/// same quality. Maps directly onto libwebp's `method` (0 = fastest).
///
/// ```compile_fail
/// let e = trimpress::imaging::Effort(9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Effort(u32);

impl Effort {
    pub const MAX: u32 = 6;

    pub fn new(value: u32) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Effort {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

/// Background-trim parameters.
///
/// `threshold` is the largest per-channel difference from the background
/// reference (the top-left pixel) that still counts as background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrimSpec {
    pub threshold: u8,
}

impl Default for TrimSpec {
    fn default() -> Self {
        Self { threshold: 100 }
    }
}

/// Height-normalised resize. Width follows from the post-trim aspect ratio.
///
/// `max_dimension` bounds both output sides; a resize that would exceed it
/// fails instead of allocating the oversized buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResizeSpec {
    pub height: u32,
    pub max_dimension: u32,
}

impl ResizeSpec {
    /// Resize to `height`, bounded by what `format` can encode.
    pub fn new(height: u32, format: OutputFormat) -> Self {
        Self {
            height,
            max_dimension: format.max_dimension(),
        }
    }
}

impl Default for ResizeSpec {
    fn default() -> Self {
        Self::new(700, OutputFormat::default())
    }
}

/// Output formats the encoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
}

impl OutputFormat {
    /// File extension (without the dot) for files of this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
        }
    }

    /// Largest width or height the format can store.
    pub fn max_dimension(self) -> u32 {
        match self {
            // VP8/VP8L headers store 14-bit sizes
            OutputFormat::WebP => 16383,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EncodeSpec {
    pub format: OutputFormat,
    pub quality: Quality,
    pub effort: Effort,
}

/// Everything [`transform`](crate::pipeline::transform) needs besides paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PipelineSpec {
    pub trim: TrimSpec,
    pub resize: ResizeSpec,
    pub encode: EncodeSpec,
}
