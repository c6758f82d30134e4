// redactpdf/src/logger.rs
//! Logging setup for the CLI. The verbosity flags map onto `env_logger`
//! level filters; `RUST_LOG` still wins when set explicitly.

use log::LevelFilter;

pub fn init(verbose: bool, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}
