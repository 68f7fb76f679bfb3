//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! Found 3 images in originals
//! 001 a.png → a.webp (969x700)
//! 002 b.jpg failed at decode: Format error decoding Jpeg: ...
//! 003 c.png skipped
//!
//! Done: 1 processed, 1 failed, 1 skipped (3 total)
//!     b.jpg: decode: Format error decoding Jpeg: ...
//! ```
//!
//! ## Renumber
//!
//! ```text
//! IMG_2041.jpg → 1.jpg
//! missing: IMG_2040.jpg
//! Copied 1 of 2 files
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::batch::{BatchEvent, BatchSummary, FileOutcome};
use crate::renumber::RenumberSummary;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format a single progress event as display lines.
pub fn format_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { input_dir, total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Found {} {} in {}", total, noun, input_dir.display())]
        }
        BatchEvent::FileFinished { index, outcome, .. } => {
            let name = outcome.file_name();
            let line = match outcome {
                FileOutcome::Succeeded {
                    output, dimensions, ..
                } => format!(
                    "{} {} → {} ({})",
                    format_index(*index),
                    name,
                    file_name(output),
                    dimensions
                ),
                FileOutcome::Failed { stage, reason, .. } => format!(
                    "{} {} failed at {}: {}",
                    format_index(*index),
                    name,
                    stage,
                    reason
                ),
                FileOutcome::Skipped { .. } => format!("{} {} skipped", format_index(*index), name),
            };
            vec![line]
        }
    }
}

/// Closing summary: one count line, then one indented line per failure.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Done: {} processed, {} failed, {} skipped ({} total)",
        summary.succeeded, summary.failed, summary.skipped, summary.considered
    )];
    for failure in &summary.failures {
        lines.push(format!(
            "    {}: {}: {}",
            failure.file, failure.stage, failure.reason
        ));
    }
    lines
}

pub fn print_summary(summary: &BatchSummary) {
    println!();
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

pub fn format_renumber(summary: &RenumberSummary) -> Vec<String> {
    let mut lines: Vec<String> = summary
        .copied
        .iter()
        .map(|r| format!("{} → {}", r.from, file_name(&r.to)))
        .collect();
    lines.extend(summary.missing.iter().map(|m| format!("missing: {}", m)));
    lines.push(format!(
        "Copied {} of {} files",
        summary.copied.len(),
        summary.copied.len() + summary.missing.len()
    ));
    lines
}

pub fn print_renumber(summary: &RenumberSummary) {
    for line in format_renumber(summary) {
        println!("{}", line);
    }
}
