// redactpdf/src/main.rs
//! RedactPDF entry point.
//!
//! Parses arguments, builds the rule set (fail fast, before any document is
//! opened), selects an engine, and dispatches to the info / single-file /
//! batch command. Single-file failures exit non-zero; batch mode continues
//! past per-file failures and reports a final summary.

use anyhow::Result;
use clap::Parser;
use log::error;
use std::process;

use redactpdf::cli::{Cli, EngineChoice, RunMode};
use redactpdf::commands::{info, redact};
use redactpdf::logger;
use redactpdf_core::{
    check_tools, CompressionPolicy, ExternalToolsEngine, RedactionConfig, RedactionEngine,
    RuleSet, SpanRedactionEngine,
};

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.check_tools {
        check_tools()?;
        println!("All required tools are installed!");
        return Ok(());
    }

    let mode = cli.mode();

    if let RunMode::Info { input } = &mode {
        return info::run(input);
    }

    let rules = build_rule_set(cli)?;
    let engine: Box<dyn RedactionEngine> = match cli.engine {
        EngineChoice::Builtin => Box::new(SpanRedactionEngine::new(&rules)?),
        EngineChoice::Tools => Box::new(ExternalToolsEngine::new(&rules)?),
    };

    match mode {
        RunMode::Single { input, output } => redact::run_single(engine.as_ref(), &input, &output),
        RunMode::Batch { input_dir, output_dir } => {
            redact::run_batch(engine.as_ref(), &input_dir, &output_dir)?;
            Ok(())
        }
        RunMode::Info { .. } => unreachable!("info mode handled above"),
    }
}

/// Builds the immutable rule set from CLI flags and/or the config file.
/// Compression flags form the baseline; an explicit compression section in
/// the config file overrides them.
fn build_rule_set(cli: &Cli) -> Result<RuleSet> {
    let mut builder = RuleSet::builder().compression(CompressionPolicy {
        preserve: !cli.no_compress,
        level: cli.compression_level,
    });

    if let Some(config_path) = &cli.config {
        let config = RedactionConfig::load_from_file(config_path)?;
        builder = builder.add_config(&config);
    }

    if let (Some(find), Some(replace)) = (&cli.find, &cli.replace) {
        builder = builder.add_rule(find, replace, cli.regex, false);
    }

    Ok(builder.build()?)
}
