// redactpdf-core/src/lib.rs
//! # RedactPDF Core Library
//!
//! `redactpdf-core` provides the fundamental logic for finding and replacing
//! sensitive text fragments inside PDF documents. It defines the data
//! structures for replacement rules, compiles them for efficient matching,
//! and implements a pluggable `RedactionEngine` trait for applying the
//! replacements to documents.
//!
//! The library is deliberately synchronous and single-threaded: one file is
//! processed at a time, each document is exclusively owned by its processing
//! call, and a file either completes or fails atomically.
//!
//! ## Modules
//!
//! * `config`: Defines `Rule`s, the `RuleSet` builder, and the JSON
//!   configuration file format, including the compression policy.
//! * `matcher`: Compiles the rule set and applies it to span text.
//! * `engine`: Defines the `RedactionEngine` trait and per-file outcome.
//! * `engines`: Concrete engines — the built-in span engine (per-span
//!   content-stream redaction over `lopdf`) and the external-tools engine
//!   (whole-document substitution via qpdf/pdftotext/pdf2ps/ps2pdf).
//! * `pdf`: Inspection, structured text extraction, span location, the
//!   redaction applicator, and the compression/save policy.
//! * `errors`: The structured error taxonomy for the pipeline.
//!
//! ## Usage Example
//!
//! ```no_run
//! use redactpdf_core::{RuleSet, SpanRedactionEngine, RedactionEngine};
//! use std::path::Path;
//!
//! fn main() -> redactpdf_core::Result<()> {
//!     let rules = RuleSet::builder()
//!         .add_rule("John Doe", "[REDACTED]", false, false)
//!         .add_rule(r"\d{3}-\d{2}-\d{4}", "XXX-XX-XXXX", true, false)
//!         .build()?;
//!
//!     let engine = SpanRedactionEngine::new(&rules)?;
//!     let outcome = engine.redact_file(Path::new("input.pdf"), Path::new("output.pdf"))?;
//!     println!("changed: {}", outcome.changed);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`RedactError`], whose variants follow the
//! pipeline's failure taxonomy: configuration problems fail fast before any
//! document is touched; per-file problems are fatal in single-file mode and
//! skippable in batch mode; a single span that cannot be redrawn degrades to
//! a blank region instead of failing the document.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod config;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod matcher;
pub mod pdf;

/// Re-exports the public configuration types for building rule sets.
pub use config::{
    CompressionPolicy, ConfigRule, FindSpec, RedactionConfig, Rule, RuleSet, RuleSetBuilder,
    MAX_PATTERN_LENGTH,
};

/// Re-exports the custom error type and result alias.
pub use errors::{RedactError, Result};

/// Re-exports the engine trait and per-file outcome record.
pub use engine::{FileOutcome, RedactionEngine};

/// Re-exports the concrete engine implementations.
pub use engines::span_engine::SpanRedactionEngine;
pub use engines::tools_engine::{check_tools, ExternalToolsEngine, REQUIRED_TOOLS};

/// Re-exports rule compilation for advanced usage.
pub use matcher::{compile_rules, get_or_compile_rules, CompiledRules};

/// Re-exports document inspection for the CLI's `--info` mode.
pub use pdf::info::{inspect, DocumentInfo};
