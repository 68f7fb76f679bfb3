//! # trimpress
//!
//! Batch image normaliser for web delivery. Every raster image in an input
//! directory is trimmed of its uniform border, scaled to a fixed height, and
//! re-encoded as lossy WebP in an output directory. One bad file never stops
//! the batch: each file ends up either converted or listed as a failure.
//!
//! ```text
//! originals/a.png ─ decode ─ trim ─ resize ─ encode ─ write ─▶ optimized/a.webp
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Codec trait, parameter types, pure crop/scale math, the `image` + libwebp implementation |
//! | [`pipeline`] | Per-file transform, stage-tagged errors, atomic output writes |
//! | [`scan`] | Input discovery and the extension allow-list |
//! | [`batch`] | Parallel batch runner, outcomes, summary, cancellation |
//! | [`config`] | Layered `trimpress.toml` loading and validation |
//! | [`renumber`] | Copy originals to `<number>.<ext>` from a mapping table |
//! | [`output`] | CLI progress and summary formatting |
//!
//! # Design Decisions
//!
//! ## Lossy WebP via libwebp
//!
//! The `image` crate only writes lossless WebP, which defeats the purpose for
//! photographs. Encoding goes through the `webp` crate (libwebp bindings) so
//! that `quality` and `effort` map straight onto libwebp's quality and method.
//!
//! ## Codec Behind a Trait
//!
//! [`imaging::ImageCodec`] separates the pixel work from the orchestration.
//! Pipeline and batch logic are tested against a recording mock that never
//! touches real pixels; the real codec gets its own focused tests.
//!
//! ## Deterministic Order
//!
//! Inputs are discovered in file-name order and outcomes are reported in that
//! order even though files are transformed in parallel, so two runs over the
//! same directory print the same thing.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod renumber;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
