use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::{
    Layer,
    filter::LevelFilter,
    fmt::{self},
    prelude::*,
    registry::LookupSpan,
};

/// The log file never records less than this, whatever the console level.
const FILE_MIN_LEVEL: LevelFilter = LevelFilter::DEBUG;

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn file_level(verbosity: u8) -> LevelFilter {
    level_filter(verbosity, false).max(FILE_MIN_LEVEL)
}

/// Plain-text layer for `--log-file`. Lines carry the enclosing spans, so every event of a
/// build is tagged with the recipe it came from.
fn file_layer<S>(file: File, verbosity: u8) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(file_level(verbosity))
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(level_filter(verbosity, quiet));

    let file_output = match log_file {
        Some(path) => Some(file_layer(File::create(&path).map_err(CliError::Io)?, verbosity)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_output)
        .init();
    Ok(())
}
