// redactpdf/src/cli.rs
//! This file defines the command-line interface (CLI) for the redactpdf
//! application, including all available arguments and the mode resolution
//! that mirrors the tool's two operating modes (single file and batch).
//! License: MIT OR Apache-2.0

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "redactpdf",
    version = env!("CARGO_PKG_VERSION"),
    about = "Replace sensitive data in PDF files with compression support",
    long_about = "Redactpdf finds and replaces sensitive text fragments inside PDF documents while \
                  preserving the visual layout: original glyphs are erased from the page content \
                  stream and the replacement is drawn at the original baseline with the original \
                  (or a mapped fallback) font, size, and color.",
    after_help = "Examples:\n  \
        redactpdf input.pdf output.pdf --find \"John Doe\" --replace \"[REDACTED]\"\n  \
        redactpdf input.pdf output.pdf --find \"\\d{3}-\\d{2}-\\d{4}\" --replace \"XXX-XX-XXXX\" --regex\n  \
        redactpdf input.pdf output.pdf --config replacements.json\n  \
        redactpdf --input-dir ./pdfs --output-dir ./redacted --config replacements.json\n  \
        redactpdf input.pdf output.pdf --find \"SSN\" --replace \"[REDACTED]\" --no-compress"
)]
pub struct Cli {
    /// Input PDF file (single-file mode).
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output PDF file (single-file mode).
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Text to find.
    #[arg(long, value_name = "TEXT", help = "Text to find.")]
    pub find: Option<String>,

    /// Replacement text.
    #[arg(long, value_name = "TEXT", requires = "find", help = "Replacement text.")]
    pub replace: Option<String>,

    /// Treat --find as a regular expression.
    #[arg(long, requires = "find", help = "Use regular expression matching.")]
    pub regex: bool,

    /// Configuration file with replacement rules (JSON).
    #[arg(long, value_name = "FILE", help = "Configuration file with replacement rules (JSON).")]
    pub config: Option<PathBuf>,

    /// Input directory for batch processing.
    #[arg(
        long = "input-dir",
        value_name = "DIR",
        conflicts_with_all = ["input", "output"],
        requires = "output_dir",
        help = "Input directory for batch processing."
    )]
    pub input_dir: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        requires = "input_dir",
        help = "Output directory for batch processing."
    )]
    pub output_dir: Option<PathBuf>,

    /// Do not compress the output PDF.
    #[arg(long = "no-compress", help = "Do not compress the output PDF.")]
    pub no_compress: bool,

    /// Compression level (0=none, 9=maximum).
    #[arg(
        long = "compression-level",
        value_name = "0-9",
        default_value_t = 9,
        value_parser = clap::value_parser!(u32).range(0..=9),
        help = "Compression level (0=none, 9=maximum, default: 9)."
    )]
    pub compression_level: u32,

    /// Show PDF information and exit.
    #[arg(long, help = "Show PDF information and exit.")]
    pub info: bool,

    /// Which redaction pipeline to run.
    #[arg(
        long,
        value_enum,
        default_value = "builtin",
        help = "Redaction pipeline: in-process span redaction or external tools."
    )]
    pub engine: EngineChoice,

    /// Check that the external tools are installed, then exit.
    #[arg(long = "check-tools", help = "Check that the required external tools are installed.")]
    pub check_tools: bool,

    /// Verbose output.
    #[arg(long, short = 'v', help = "Verbose output.")]
    pub verbose: bool,

    /// Suppress informational messages.
    #[arg(long, short = 'q', conflicts_with = "verbose", help = "Suppress informational messages.")]
    pub quiet: bool,
}

/// Enum for selecting the redaction engine.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EngineChoice {
    /// The built-in per-span redaction engine (lopdf).
    Builtin,
    /// The external-tool pipeline (qpdf, pdftotext, pdf2ps, ps2pdf).
    Tools,
}

/// What one invocation does, after validation.
#[derive(Debug, Clone)]
pub enum RunMode {
    Info { input: PathBuf },
    Single { input: PathBuf, output: PathBuf },
    Batch { input_dir: PathBuf, output_dir: PathBuf },
}

impl Cli {
    /// Resolves the operating mode, exiting through clap's standard error
    /// path when the argument combination is invalid.
    pub fn mode(&self) -> RunMode {
        let mut cmd = Cli::command();

        if self.info {
            match &self.input {
                Some(input) => return RunMode::Info { input: input.clone() },
                None => cmd
                    .error(ErrorKind::MissingRequiredArgument, "--info requires an input file")
                    .exit(),
            }
        }

        let has_rule_source =
            self.config.is_some() || (self.find.is_some() && self.replace.is_some());

        if let (Some(input_dir), Some(output_dir)) = (&self.input_dir, &self.output_dir) {
            if !has_rule_source {
                cmd.error(
                    ErrorKind::MissingRequiredArgument,
                    "Batch mode requires either --config or --find/--replace",
                )
                .exit();
            }
            return RunMode::Batch {
                input_dir: input_dir.clone(),
                output_dir: output_dir.clone(),
            };
        }

        if let (Some(input), Some(output)) = (&self.input, &self.output) {
            if !has_rule_source {
                cmd.error(
                    ErrorKind::MissingRequiredArgument,
                    "Single file mode requires either --config or --find/--replace",
                )
                .exit();
            }
            return RunMode::Single {
                input: input.clone(),
                output: output.clone(),
            };
        }

        cmd.error(
            ErrorKind::MissingRequiredArgument,
            "Specify either input/output files or --input-dir/--output-dir",
        )
        .exit()
    }
}
