// redactpdf-core/src/engines/tools_engine.rs
//! The external-tools engine: whole-document text substitution via
//! qpdf / pdftotext / pdf2ps / ps2pdf subprocesses.
//!
//! The same compiled rule set drives both engines; only the erase/insert
//! mechanism differs. This pipeline extracts the document text to decide
//! whether anything changes, then round-trips the document through
//! PostScript, substitutes in the PostScript text, and linearizes the
//! result. Every subprocess call blocks until complete.
//!
//! License: MIT OR Apache-2.0

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

use log::{info, warn};

use crate::config::{CompressionPolicy, RuleSet};
use crate::engine::{FileOutcome, RedactionEngine};
use crate::errors::{RedactError, Result};
use crate::matcher::{get_or_compile_rules, CompiledRules};

/// Tools the pipeline shells out to.
pub const REQUIRED_TOOLS: &[&str] = &["qpdf", "pdftotext", "pdf2ps", "ps2pdf"];

pub struct ExternalToolsEngine {
    rules: Arc<CompiledRules>,
    policy: CompressionPolicy,
}

impl ExternalToolsEngine {
    /// Builds the engine, preflighting the required tools.
    pub fn new(rule_set: &RuleSet) -> Result<Self> {
        check_tools()?;
        Ok(Self {
            rules: get_or_compile_rules(rule_set)?,
            policy: rule_set.compression,
        })
    }
}

/// Verifies all required external tools are on PATH.
pub fn check_tools() -> Result<()> {
    let missing: Vec<String> = REQUIRED_TOOLS
        .iter()
        .filter(|tool| find_in_path(tool).is_none())
        .map(|tool| tool.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RedactError::MissingTools(missing))
    }
}

fn find_in_path(tool: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}

fn run_tool(tool: &str, args: &[&std::ffi::OsStr]) -> Result<Output> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| RedactError::ExternalTool {
            tool: tool.to_string(),
            reason: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(RedactError::ExternalTool {
            tool: tool.to_string(),
            reason: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(output)
}

macro_rules! os_args {
    ($($arg:expr),* $(,)?) => {
        &[$(std::ffi::OsStr::new($arg)),*]
    };
}

impl RedactionEngine for ExternalToolsEngine {
    fn name(&self) -> &'static str {
        "tools"
    }

    fn redact_file(&self, input: &Path, output: &Path) -> Result<FileOutcome> {
        info!("Processing: {}", input.display());
        let original_size = fs::metadata(input)
            .map_err(|source| RedactError::FileAccess {
                path: input.to_path_buf(),
                source,
            })?
            .len();

        // Extract the document text to see whether anything would change.
        let extracted = run_tool("pdftotext", os_args!["-layout", input.as_os_str(), "-"])?;
        let text = String::from_utf8_lossy(&extracted.stdout).to_string();
        let (_, changed) = self.rules.apply(&text);

        let mut outcome = FileOutcome {
            changed,
            original_size,
            ..FileOutcome::default()
        };
        if !changed {
            info!("No replacements needed, copying file as-is");
            fs::copy(input, output).map_err(|source| RedactError::FileAccess {
                path: output.to_path_buf(),
                source,
            })?;
            outcome.final_size = original_size;
            return Ok(outcome);
        }
        info!("Text replacements needed, processing PDF...");

        let workdir = tempfile::tempdir()?;

        // Decompress for a cleaner PostScript round trip; a failure here
        // falls back to the original file.
        let decompressed = workdir.path().join("decompressed.pdf");
        let stage_input: PathBuf = match run_tool(
            "qpdf",
            os_args![
                "--stream-data=uncompress",
                "--decode-level=all",
                input.as_os_str(),
                decompressed.as_os_str(),
            ],
        ) {
            Ok(_) => decompressed,
            Err(e) => {
                warn!("Failed to decompress, using original: {}", e);
                input.to_path_buf()
            }
        };

        let ps_file = workdir.path().join("document.ps");
        run_tool("pdf2ps", os_args![stage_input.as_os_str(), ps_file.as_os_str()])?;

        self.substitute_in_postscript(&ps_file)?;

        let processed = workdir.path().join("processed.pdf");
        let mut ps2pdf_args: Vec<&std::ffi::OsStr> = if self.policy.preserve {
            os_args![
                "-dPDFSETTINGS=/printer",
                "-dCompressPages=true",
                "-dCompressStreams=true",
            ]
            .to_vec()
        } else {
            os_args!["-dCompressPages=false", "-dCompressStreams=false"].to_vec()
        };
        ps2pdf_args.push(ps_file.as_os_str());
        ps2pdf_args.push(processed.as_os_str());
        run_tool("ps2pdf", &ps2pdf_args)?;

        run_tool(
            "qpdf",
            os_args!["--linearize", processed.as_os_str(), output.as_os_str()],
        )?;

        outcome.final_size = fs::metadata(output)
            .map_err(|source| RedactError::FileAccess {
                path: output.to_path_buf(),
                source,
            })?
            .len();
        let delta = outcome.final_size as i64 - original_size as i64;
        let pct = if original_size > 0 {
            delta as f64 / original_size as f64 * 100.0
        } else {
            0.0
        };
        info!("Original size: {} bytes", original_size);
        info!("Final size: {} bytes ({:+.1}%)", outcome.final_size, pct);
        info!("Successfully created: {}", output.display());
        Ok(outcome)
    }
}

impl ExternalToolsEngine {
    /// Applies the rule set to the PostScript text. The file is Latin-1 on
    /// disk; bytes map one-to-one onto chars and back.
    fn substitute_in_postscript(&self, ps_file: &Path) -> Result<()> {
        let bytes = fs::read(ps_file)?;
        let content = latin1_decode(&bytes);
        let (replaced, modified) = self.rules.apply(&content);
        if modified {
            fs::write(ps_file, latin1_encode(&replaced))?;
            info!("Text replacements applied successfully");
        } else {
            info!("No text replacements were needed");
        }
        Ok(())
    }
}

fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn latin1_encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_round_trips_all_byte_values() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        assert_eq!(latin1_encode(&latin1_decode(&bytes)), bytes);
    }

    #[test]
    fn missing_tool_lookup_reports_name() {
        assert!(find_in_path("definitely-not-a-real-tool-9931").is_none());
    }
}
