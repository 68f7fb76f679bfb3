//! Mapping-driven renumbering of downloaded originals.
//!
//! Copies each file named in a mapping table into a target directory under
//! its assigned number, keeping the extension:
//!
//! ```toml
//! # renumber.toml
//! "IMG_2041.jpg" = 1
//! "IMG_2040.JPG" = 2
//! "scan-final.png" = 10
//! ```
//!
//! produces `1.jpg`, `2.jpg` and `10.png`. Sources are copied, never moved.
//! A mapped file that is missing from the source directory is warned about
//! and counted; the rest are still copied. Two entries claiming the same
//! number are rejected before anything is copied.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RenumberError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mapping parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid mapping: {0}")]
    Invalid(String),
    #[error("cannot create target directory {}: {cause}", .path.display())]
    TargetDir {
        path: PathBuf,
        cause: std::io::Error,
    },
}

/// Old file name → assigned number, ordered by number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenumberMap {
    entries: Vec<(String, u32)>,
}

impl RenumberMap {
    /// Build a map, rejecting duplicate numbers.
    pub fn new(entries: impl IntoIterator<Item = (String, u32)>) -> Result<Self, RenumberError> {
        let mut by_number: BTreeMap<u32, String> = BTreeMap::new();
        for (name, number) in entries {
            if name.is_empty() {
                return Err(RenumberError::Invalid("empty file name".into()));
            }
            if let Some(existing) = by_number.insert(number, name.clone()) {
                return Err(RenumberError::Invalid(format!(
                    "number {number} assigned to both {existing} and {name}"
                )));
            }
        }
        Ok(Self {
            entries: by_number.into_iter().map(|(n, name)| (name, n)).collect(),
        })
    }

    /// Parse a TOML table of `"old name" = number`.
    pub fn parse(content: &str) -> Result<Self, RenumberError> {
        let table: BTreeMap<String, i64> = toml::from_str(content)?;
        let entries = table
            .into_iter()
            .map(|(name, number)| {
                u32::try_from(number)
                    .map(|n| (name.clone(), n))
                    .map_err(|_| {
                        RenumberError::Invalid(format!("{name}: number {number} out of range"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries)
    }

    pub fn load(path: &Path) -> Result<Self, RenumberError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending number order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, n)| (name.as_str(), *n))
    }
}

/// One copied file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Renumbered {
    pub from: String,
    pub to: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenumberSummary {
    pub copied: Vec<Renumbered>,
    /// Mapped names not found in the source directory.
    pub missing: Vec<String>,
}

/// `<number>.<lowercased ext>`, or just `<number>` when the source has none.
pub fn numbered_name(old: &str, number: u32) -> String {
    match Path::new(old).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{number}.{}", ext.to_ascii_lowercase()),
        None => number.to_string(),
    }
}

/// Copy every mapped file from `source_dir` into `target_dir`.
pub fn renumber(
    source_dir: &Path,
    target_dir: &Path,
    map: &RenumberMap,
) -> Result<RenumberSummary, RenumberError> {
    fs::create_dir_all(target_dir).map_err(|cause| RenumberError::TargetDir {
        path: target_dir.to_path_buf(),
        cause,
    })?;

    let mut summary = RenumberSummary::default();
    for (old, number) in map.iter() {
        let from = source_dir.join(old);
        if !from.is_file() {
            warn!(file = old, "mapped file not found in {}", source_dir.display());
            summary.missing.push(old.to_string());
            continue;
        }
        let to = target_dir.join(numbered_name(old, number));
        fs::copy(&from, &to)?;
        debug!(from = %from.display(), to = %to.display(), "copied");
        summary.copied.push(Renumbered {
            from: old.to_string(),
            to,
        });
    }
    Ok(summary)
}
