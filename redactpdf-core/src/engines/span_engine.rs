// redactpdf-core/src/engines/span_engine.rs
//! The built-in span engine: per-span redaction over lopdf.
//!
//! Implements the per-file state machine
//! OPEN -> INSPECT -> (DECOMPRESS?) -> PROCESS_PAGES -> SAVE -> CLEANUP.
//! Pages are processed strictly one at a time; within a page the applicator
//! runs its mark/commit/insert phases in order. If no span on any page
//! changes, the input is copied to the output byte for byte so untouched
//! documents are never re-encoded.
//!
//! License: MIT OR Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lopdf::{Document, ObjectId};
use log::{debug, info, warn};

use crate::config::{CompressionPolicy, RuleSet};
use crate::engine::{FileOutcome, RedactionEngine};
use crate::errors::{RedactError, Result};
use crate::matcher::{get_or_compile_rules, CompiledRules};
use crate::pdf::{fonts, info, locator, redactor, save, text};

pub struct SpanRedactionEngine {
    rules: Arc<CompiledRules>,
    policy: CompressionPolicy,
}

impl SpanRedactionEngine {
    pub fn new(rule_set: &RuleSet) -> Result<Self> {
        Ok(Self {
            rules: get_or_compile_rules(rule_set)?,
            policy: rule_set.compression,
        })
    }
}

impl RedactionEngine for SpanRedactionEngine {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn redact_file(&self, input: &Path, output: &Path) -> Result<FileOutcome> {
        info!("Processing: {}", input.display());

        // OPEN + INSPECT
        let doc_info = info::inspect(input)?;
        debug!(
            "{} pages, encrypted: {}, compressed streams: {}",
            doc_info.page_count, doc_info.encrypted, doc_info.compressed_objects
        );
        if doc_info.encrypted {
            return Err(RedactError::DocumentParse {
                path: input.to_path_buf(),
                reason: "document is encrypted".to_string(),
            });
        }

        // DECOMPRESS? A working copy keeps the original pristine and gives
        // the interpreter plain streams to read.
        let working = WorkingCopy::create(input, doc_info.uses_compression)?;
        let mut doc = info::load_document(working.path())?;

        // PROCESS_PAGES
        let page_ids: Vec<ObjectId> = doc.page_iter().collect();
        let mut outcome = FileOutcome {
            pages: page_ids.len(),
            original_size: doc_info.file_size,
            ..FileOutcome::default()
        };

        for (page_index, page_id) in page_ids.into_iter().enumerate() {
            let page_fonts = fonts::page_fonts(&doc, page_id);
            let blocks = text::extract_blocks(&doc, page_id, &page_fonts)?;
            let ops: Vec<locator::RedactionOp> =
                locator::locate(&blocks, &page_fonts, &self.rules).collect();
            if ops.is_empty() {
                continue;
            }
            debug!("Page {}: {} spans to redact", page_index + 1, ops.len());
            let edit = redactor::apply(&mut doc, page_id, ops)?;
            outcome.spans_replaced += edit.replaced;
            outcome.spans_degraded += edit.degraded;
        }

        outcome.changed = outcome.spans_replaced + outcome.spans_degraded > 0;
        if !outcome.changed {
            // Untouched content is copied byte for byte; re-saving would
            // change file size and bytes for no reason.
            info!("No text replacements were needed");
            fs::copy(input, output).map_err(|source| RedactError::FileAccess {
                path: output.to_path_buf(),
                source,
            })?;
            outcome.final_size = outcome.original_size;
            return Ok(outcome);
        }
        info!(
            "Applied {} span replacements ({} degraded) across {} pages",
            outcome.spans_replaced, outcome.spans_degraded, outcome.pages
        );

        // SAVE
        outcome.final_size =
            save::save_document(&mut doc, output, doc_info.uses_compression, &self.policy)?;
        log_size_change(outcome.original_size, outcome.final_size);
        info!("Successfully created: {}", output.display());

        // CLEANUP happens when `working` drops.
        Ok(outcome)
    }
}

fn log_size_change(original: u64, final_size: u64) {
    let delta = final_size as i64 - original as i64;
    let pct = if original > 0 {
        delta as f64 / original as f64 * 100.0
    } else {
        0.0
    };
    info!("Original size: {} bytes", original);
    info!("Final size: {} bytes ({:+.1}%)", final_size, pct);
}

/// A temporary working copy of the input, decompressed when the input uses
/// stream compression. Released best-effort on all exit paths; a transiently
/// locked file is retried a bounded number of times and then leaked with a
/// warning.
struct WorkingCopy {
    path: PathBuf,
}

const CLEANUP_ATTEMPTS: u32 = 3;
const CLEANUP_BACKOFF: Duration = Duration::from_millis(50);

impl WorkingCopy {
    fn create(input: &Path, decompress: bool) -> Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix("redactpdf-")
            .suffix(".pdf")
            .tempfile()?;
        let (_, path) = temp.keep().map_err(|e| RedactError::Io(e.error))?;

        if decompress {
            match Self::write_decompressed(input, &path) {
                Ok(()) => {
                    debug!("Decompressed working copy at {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) => {
                    warn!("Failed to decompress input, using a plain copy: {}", e);
                }
            }
        }
        fs::copy(input, &path).map_err(|source| RedactError::FileAccess {
            path: input.to_path_buf(),
            source,
        })?;
        Ok(Self { path })
    }

    fn write_decompressed(input: &Path, path: &Path) -> Result<()> {
        let mut doc = Document::load(input).map_err(|e| RedactError::DocumentParse {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })?;
        doc.decompress();
        doc.save(path).map_err(|e| RedactError::Save {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingCopy {
    fn drop(&mut self) {
        for attempt in 0..CLEANUP_ATTEMPTS {
            match fs::remove_file(&self.path) {
                Ok(()) => return,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
                Err(e) => {
                    debug!(
                        "Attempt {} to remove {} failed: {}",
                        attempt + 1,
                        self.path.display(),
                        e
                    );
                    thread::sleep(CLEANUP_BACKOFF * (attempt + 1));
                }
            }
        }
        warn!(
            "Could not remove temporary working copy {}; leaving it behind",
            self.path.display()
        );
    }
}
