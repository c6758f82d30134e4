//! errors.rs - Custom error types for the redactpdf-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//! The variants follow the failure taxonomy of the processing pipeline:
//! configuration problems are fatal before any document is touched, while
//! per-file problems are fatal in single-file mode and skippable in batch
//! mode.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;
use thiserror::Error;

/// Custom result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactError>;

/// This enum represents all possible error types in the `redactpdf-core`
/// library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions. This prevents them from
/// matching all variants exhaustively, thus avoiding breaking changes.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RedactError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to compile replacement pattern '{0}': {1}")]
    RuleCompilation(String, regex::Error),

    #[error("Cannot access '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{}' as a PDF: {reason}", path.display())]
    DocumentParse { path: PathBuf, reason: String },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Failed to save '{}': {reason}", path.display())]
    Save { path: PathBuf, reason: String },

    #[error("Missing required external tools: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    #[error("External tool '{tool}' failed: {reason}")]
    ExternalTool { tool: String, reason: String },

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}
