//! Redact command: single-file and batch-directory processing.

use anyhow::{Context, Result};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

use redactpdf_core::RedactionEngine;

/// Result of a batch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub total: usize,
}

/// Processes one file; any failure is fatal to the invocation.
pub fn run_single(engine: &dyn RedactionEngine, input: &Path, output: &Path) -> Result<()> {
    engine
        .redact_file(input, output)
        .with_context(|| format!("Error processing {}", input.display()))?;
    Ok(())
}

/// Processes every `*.pdf` in `input_dir`, continuing past per-file
/// failures, and always reports a final success-count/total summary.
pub fn run_batch(
    engine: &dyn RedactionEngine,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<BatchSummary> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create output directory {}", output_dir.display()))?;

    let mut pdf_files: Vec<PathBuf> = fs::read_dir(input_dir)
        .with_context(|| format!("Cannot read input directory {}", input_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdf_files.sort();

    info!("Found {} PDF files to process", pdf_files.len());

    let mut summary = BatchSummary {
        total: pdf_files.len(),
        ..BatchSummary::default()
    };
    let mut total_original: u64 = 0;
    let mut total_final: u64 = 0;

    for pdf_file in &pdf_files {
        let file_name = match pdf_file.file_name() {
            Some(name) => name,
            None => continue,
        };
        let output_file = output_dir.join(file_name);

        match engine.redact_file(pdf_file, &output_file) {
            Ok(outcome) => {
                summary.processed += 1;
                total_original += outcome.original_size;
                total_final += outcome.final_size;
            }
            Err(e) => {
                error!("Error processing {}: {}", pdf_file.display(), e);
            }
        }
    }

    info!(
        "Successfully processed {}/{} files",
        summary.processed, summary.total
    );
    if summary.processed > 0 && total_original > 0 {
        let delta = total_final as i64 - total_original as i64;
        let pct = delta as f64 / total_original as f64 * 100.0;
        info!("Total size change: {} bytes ({:+.1}%)", delta, pct);
    }
    Ok(summary)
}
