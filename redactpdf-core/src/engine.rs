// redactpdf-core/src/engine.rs
//! Defines the core RedactionEngine trait and the per-file outcome record.
//!
//! The `RedactionEngine` trait provides a pluggable interface for the two
//! redaction pipelines: the built-in span engine that rewrites page content
//! streams in place, and the external-tools engine that round-trips the
//! document through PostScript. This module defines the contract that both
//! engines adhere to, ensuring a consistent per-file API for the CLI.
//!
//! License: MIT OR APACHE 2.0

use std::path::Path;

use crate::errors::Result;

/// The result of processing one input file.
///
/// `spans_degraded` counts spans whose original glyphs were erased but whose
/// replacement could not be drawn (font registration or insertion failure).
/// Such spans are left blank rather than aborting the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOutcome {
    /// True if any span text changed under the rule set.
    pub changed: bool,
    /// Number of pages processed.
    pub pages: usize,
    /// Number of spans erased and redrawn with replacement text.
    pub spans_replaced: usize,
    /// Number of spans erased but left blank after an insertion failure.
    pub spans_degraded: usize,
    /// Input file size in bytes.
    pub original_size: u64,
    /// Output file size in bytes.
    pub final_size: u64,
}

/// A trait that defines the per-file contract of a redaction pipeline.
///
/// This trait decouples the high-level CLI logic from the specific
/// erase/insert mechanism, allowing the two pipelines to be used
/// interchangeably. A file either completes or fails atomically; there is
/// no cancellation mid-file.
pub trait RedactionEngine {
    /// A short, stable identifier for logging.
    fn name(&self) -> &'static str;

    /// Processes one input document and writes the result to `output`.
    ///
    /// If no span text changes under the rule set, the output must be a
    /// byte-for-byte copy of the input — untouched content is never
    /// re-encoded.
    fn redact_file(&self, input: &Path, output: &Path) -> Result<FileOutcome>;
}
