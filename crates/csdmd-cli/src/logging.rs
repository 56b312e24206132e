use crate::error::{CliError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt::{self, format},
    prelude::*,
};

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Plain-text layer for `--log-file`. The file is truncated, so each harness
/// run leaves exactly one transcript.
fn transcript_layer<S>(
    path: &Path,
) -> Result<fmt::Layer<S, format::DefaultFields, format::Format, File>> {
    let file = File::create(path).map_err(CliError::Io)?;
    Ok(fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true))
}

/// Installs the global subscriber. `RUST_LOG`, when set, refines the level chosen by `-v`/`-q`.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level_filter(verbosity, quiet).into())
        .from_env_lossy();

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    let transcript = log_file.as_deref().map(transcript_layer).transpose()?;

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(transcript)
        .init();
    Ok(())
}
