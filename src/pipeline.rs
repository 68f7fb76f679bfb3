//! The per-file transform: decode → trim → resize → encode → write.
//!
//! [`transform`] is stateless and knows nothing about directory scanning, so
//! it can be exercised on a single file with a mock codec. Each step's
//! failure short-circuits the rest and comes back as a [`PipelineError`]
//! variant naming the failing [`Stage`].
//!
//! ## Output Safety
//!
//! Encoded bytes go to a temp file next to the destination and are renamed
//! into place only once fully written. A failed run never leaves a partial
//! file at the destination path; an existing file there is replaced
//! atomically on success.

use crate::imaging::{CodecError, Dimensions, ImageCodec, PipelineSpec};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// The step of the transform that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Decode,
    Trim,
    Resize,
    Encode,
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Trim => "trim",
            Stage::Resize => "resize",
            Stage::Encode => "encode",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("decode failed for {}: {cause}", .path.display())]
    Decode { path: PathBuf, cause: CodecError },
    #[error("trim failed for {}: {cause}", .path.display())]
    Trim { path: PathBuf, cause: CodecError },
    #[error("resize failed for {}: {cause}", .path.display())]
    Resize { path: PathBuf, cause: CodecError },
    #[error("encode failed for {}: {cause}", .path.display())]
    Encode { path: PathBuf, cause: CodecError },
    #[error("write failed for {}: {cause}", .path.display())]
    Write {
        path: PathBuf,
        cause: std::io::Error,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Decode { .. } => Stage::Decode,
            PipelineError::Trim { .. } => Stage::Trim,
            PipelineError::Resize { .. } => Stage::Resize,
            PipelineError::Encode { .. } => Stage::Encode,
            PipelineError::Write { .. } => Stage::Write,
        }
    }

    /// The underlying cause without the stage/path prefix.
    pub fn reason(&self) -> String {
        match self {
            PipelineError::Decode { cause, .. }
            | PipelineError::Trim { cause, .. }
            | PipelineError::Resize { cause, .. }
            | PipelineError::Encode { cause, .. } => cause.to_string(),
            PipelineError::Write { cause, .. } => cause.to_string(),
        }
    }
}

/// Sizes seen along the way for one successful transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    pub original: Dimensions,
    pub trimmed: Dimensions,
    pub output: Dimensions,
    /// Size of the written file in bytes.
    pub bytes: u64,
}

/// Run the full transform for one file.
///
/// On success exactly one file exists at `dest`; on failure `dest` is left
/// as it was.
pub fn transform(
    codec: &impl ImageCodec,
    source: &Path,
    dest: &Path,
    spec: &PipelineSpec,
) -> Result<TransformReport, PipelineError> {
    let path = || source.to_path_buf();

    let decoded = codec
        .decode(source)
        .map_err(|cause| PipelineError::Decode { path: path(), cause })?;
    let original = Dimensions::of(&decoded);
    debug!(source = %source.display(), %original, "decoded");

    let trimmed = codec
        .trim(&decoded, spec.trim)
        .map_err(|cause| PipelineError::Trim { path: path(), cause })?;
    drop(decoded);
    let trimmed_dims = Dimensions::of(&trimmed);
    debug!(source = %source.display(), trimmed = %trimmed_dims, "trimmed");

    let resized = codec
        .resize(&trimmed, spec.resize)
        .map_err(|cause| PipelineError::Resize { path: path(), cause })?;
    drop(trimmed);
    let output = Dimensions::of(&resized);

    let bytes = codec
        .encode(&resized, spec.encode)
        .map_err(|cause| PipelineError::Encode { path: path(), cause })?;
    debug!(source = %source.display(), %output, bytes = bytes.len(), "encoded");

    write_atomically(dest, &bytes).map_err(|cause| PipelineError::Write {
        path: dest.to_path_buf(),
        cause,
    })?;

    Ok(TransformReport {
        original,
        trimmed: trimmed_dims,
        output,
        bytes: bytes.len() as u64,
    })
}

/// Write `bytes` to a sibling temp file, then rename it over `dest`.
fn write_atomically(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
