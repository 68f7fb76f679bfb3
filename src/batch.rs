//! Batch runner: discover inputs, transform each one, summarise.
//!
//! ## Failure Semantics
//!
//! Two kinds of failure are kept apart:
//!
//! - **Fatal setup errors** ([`BatchError`]): the output directory cannot be
//!   created or the input directory cannot be listed. Nothing is processed
//!   and the error propagates to the caller.
//! - **Per-file errors** ([`PipelineError`](crate::pipeline::PipelineError)):
//!   logged, recorded in the [`BatchSummary`], and the batch moves on. They
//!   never propagate past [`run`].
//!
//! ## Parallel Processing
//!
//! Files are independent, so they are transformed in parallel on the current
//! rayon pool (sized by `processing.max_processes`, see
//! [`effective_threads`](crate::config::effective_threads)). Outcomes are
//! collected back in discovery order regardless of completion order.
//!
//! ## Output Name Conflicts
//!
//! Sources sharing a stem (`a.png`, `a.jpg`) would write the same output.
//! The first in discovery order owns it; the others are recorded as
//! failures at the write stage without being transformed.
//!
//! ## Cancellation
//!
//! A [`CancelFlag`] is checked before each file starts. Files already in
//! flight finish normally; the rest are recorded as skipped.

use crate::imaging::{Dimensions, ImageCodec, PipelineSpec};
use crate::pipeline::{self, Stage};
use crate::scan::{self, ScanError, SourceImage};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("cannot create output directory {}: {cause}", .path.display())]
    OutputDir {
        path: PathBuf,
        cause: std::io::Error,
    },
    #[error(transparent)]
    InputDir(#[from] ScanError),
}

/// Paths plus transform parameters for one run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub spec: PipelineSpec,
}

/// Shared stop request. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to a single input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Succeeded {
        source: PathBuf,
        output: PathBuf,
        dimensions: Dimensions,
        bytes: u64,
    },
    Failed {
        source: PathBuf,
        stage: Stage,
        reason: String,
    },
    Skipped {
        source: PathBuf,
    },
}

impl FileOutcome {
    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Succeeded { source, .. }
            | FileOutcome::Failed { source, .. }
            | FileOutcome::Skipped { source } => source,
        }
    }

    /// File name of the source, for display.
    pub fn file_name(&self) -> String {
        let source = self.source();
        source
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string())
    }
}

/// One entry of [`BatchSummary::failures`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub file: String,
    pub stage: Stage,
    pub reason: String,
}

/// Aggregate result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Eligible files found in the input directory.
    pub considered: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Not started because the run was cancelled.
    pub skipped: usize,
    pub failures: Vec<Failure>,
    /// Per-file outcomes in discovery order.
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: Vec<FileOutcome>) -> Self {
        let mut succeeded = 0;
        let mut skipped = 0;
        let mut failures = Vec::new();

        for outcome in &outcomes {
            match outcome {
                FileOutcome::Succeeded { .. } => succeeded += 1,
                FileOutcome::Skipped { .. } => skipped += 1,
                FileOutcome::Failed { stage, reason, .. } => failures.push(Failure {
                    file: outcome.file_name(),
                    stage: *stage,
                    reason: reason.clone(),
                }),
            }
        }

        Self {
            considered: outcomes.len(),
            succeeded,
            failed: failures.len(),
            skipped,
            failures,
            outcomes,
        }
    }
}

/// Progress events, sent as the run advances.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        input_dir: PathBuf,
        total: usize,
    },
    FileFinished {
        /// 1-based position in discovery order.
        index: usize,
        total: usize,
        outcome: FileOutcome,
    },
}

/// Transform one discovered file into an outcome. Never fails.
fn process_one(
    codec: &impl ImageCodec,
    source: &SourceImage,
    config: &BatchConfig,
) -> FileOutcome {
    let dest = source.output_path(&config.output_dir, config.spec.encode.format);

    match pipeline::transform(codec, &source.path, &dest, &config.spec) {
        Ok(report) => FileOutcome::Succeeded {
            source: source.path.clone(),
            output: dest,
            dimensions: report.output,
            bytes: report.bytes,
        },
        Err(e) => {
            // Reported to the user through the outcome; debug only here.
            debug!(file = %source.file_name, stage = %e.stage(), "{e}");
            FileOutcome::Failed {
                source: source.path.clone(),
                stage: e.stage(),
                reason: e.reason(),
            }
        }
    }
}

/// Outcome for a file whose output name was already taken by an earlier file.
fn output_conflict(
    source: &SourceImage,
    first: &SourceImage,
    config: &BatchConfig,
) -> FileOutcome {
    let dest = source.output_path(&config.output_dir, config.spec.encode.format);
    let reason = format!(
        "output {} is already written from {}",
        dest.display(),
        first.file_name
    );
    debug!(file = %source.file_name, "{reason}");
    FileOutcome::Failed {
        source: source.path.clone(),
        stage: Stage::Write,
        reason,
    }
}

/// Run the batch.
///
/// Creates `output_dir` if needed, snapshots `input_dir`, and transforms
/// every eligible file. Only setup failures return `Err`.
pub fn run(
    config: &BatchConfig,
    codec: &impl ImageCodec,
    events: Option<Sender<BatchEvent>>,
    cancel: &CancelFlag,
) -> Result<BatchSummary, BatchError> {
    std::fs::create_dir_all(&config.output_dir).map_err(|cause| BatchError::OutputDir {
        path: config.output_dir.clone(),
        cause,
    })?;

    let sources = scan::discover(&config.input_dir)?;
    let conflicts =
        scan::output_conflicts(&sources, &config.output_dir, config.spec.encode.format);
    let total = sources.len();
    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        total,
        "starting batch"
    );

    let emit = |event: BatchEvent| {
        if let Some(tx) = &events {
            // A dropped receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    };

    emit(BatchEvent::Started {
        input_dir: config.input_dir.clone(),
        total,
    });

    let outcomes: Vec<FileOutcome> = sources
        .par_iter()
        .enumerate()
        .map(|(i, source)| {
            let outcome = if cancel.is_cancelled() {
                FileOutcome::Skipped {
                    source: source.path.clone(),
                }
            } else if let Some(first) = conflicts[i] {
                output_conflict(source, &sources[first], config)
            } else {
                process_one(codec, source, config)
            };
            emit(BatchEvent::FileFinished {
                index: i + 1,
                total,
                outcome: outcome.clone(),
            });
            outcome
        })
        .collect();

    let summary = BatchSummary::from_outcomes(outcomes);
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "batch finished"
    );
    Ok(summary)
}
