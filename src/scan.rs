//! Input discovery.
//!
//! Lists the input directory once at batch start and keeps the raster files
//! whose extension is on the allow-list. The listing is a snapshot: files
//! added while the batch runs are not picked up.
//!
//! ## Rules
//!
//! - Only the top level of the input directory is scanned; subdirectories are ignored.
//! - Extensions are matched case-insensitively (`A.PNG` and `a.png` both qualify).
//! - Files with any other extension, or none, are ignored and not counted.
//! - Discovery order is file-name order, so repeated runs see the same sequence.
//! - Only an unreadable input directory is an error. An entry that cannot be
//!   inspected (dangling symlink, file removed mid-listing) is kept when its
//!   name is eligible, so it fails on its own at decode, and skipped otherwise.

use crate::imaging::OutputFormat;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read input directory {}: {cause}", .path.display())]
    Io {
        path: PathBuf,
        cause: std::io::Error,
    },
    #[error("input path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot list input directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Raster formats accepted as input, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Jpeg,
    Png,
    Tiff,
    WebP,
}

const EXTENSIONS: &[(&str, InputFormat)] = &[
    ("jpg", InputFormat::Jpeg),
    ("jpeg", InputFormat::Jpeg),
    ("png", InputFormat::Png),
    ("tif", InputFormat::Tiff),
    ("tiff", InputFormat::Tiff),
    ("webp", InputFormat::WebP),
];

impl InputFormat {
    /// Look up a file extension (without the dot), ignoring ASCII case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, format)| *format)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Returns every accepted input extension, lowercase.
pub fn supported_input_extensions() -> Vec<&'static str> {
    EXTENSIONS.iter().map(|(ext, _)| *ext).collect()
}

/// An eligible input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceImage {
    pub path: PathBuf,
    /// File name as displayed in progress output.
    pub file_name: String,
    pub format: InputFormat,
}

impl SourceImage {
    /// `<stem>.<ext>` for the given output format inside `output_dir`.
    pub fn output_path(&self, output_dir: &Path, format: OutputFormat) -> PathBuf {
        output_path(output_dir, &self.path, format)
    }
}

/// Derive the destination path: strip the source extension, add the
/// output format's.
pub fn output_path(output_dir: &Path, source: &Path, format: OutputFormat) -> PathBuf {
    // Built by hand: `with_extension` would eat the last dot of `a.v2`.
    let mut name = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(format.extension());
    output_dir.join(name)
}

/// For each image, the index of an earlier image whose output lands on the
/// same file (`a.png` and `a.jpg` both become `a.webp`), or `None`.
pub fn output_conflicts(
    images: &[SourceImage],
    output_dir: &Path,
    format: OutputFormat,
) -> Vec<Option<usize>> {
    let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let dest = image.output_path(output_dir, format);
            match claimed.get(&dest) {
                Some(&first) => Some(first),
                None => {
                    claimed.insert(dest, i);
                    None
                }
            }
        })
        .collect()
}

/// List eligible images in `input_dir`.
pub fn discover(input_dir: &Path) -> Result<Vec<SourceImage>, ScanError> {
    let meta = std::fs::metadata(input_dir).map_err(|cause| ScanError::Io {
        path: input_dir.to_path_buf(),
        cause,
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(input_dir.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                match e.path().and_then(|p| InputFormat::from_path(p).map(|f| (p, f))) {
                    Some((path, format)) => {
                        debug!(path = %path.display(), "keeping unreadable entry: {e}");
                        images.push(SourceImage {
                            path: path.to_path_buf(),
                            file_name: file_name_of(path),
                            format,
                        });
                    }
                    None => warn!("skipping unreadable entry: {e}"),
                }
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(format) = InputFormat::from_path(path) else {
            continue;
        };
        images.push(SourceImage {
            path: path.to_path_buf(),
            file_name: entry.file_name().to_string_lossy().into_owned(),
            format,
        });
    }
    // walkdir yields failed entries ahead of sorted ones
    images.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(images)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
