//! Tracing setup. stdout is reserved for MCP stdio framing and task
//! output, so anything serving stdio must never log there — file-based
//! logging for the server modes, stderr for plain CLI subcommands.

use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr. Used by CLI subcommands (`run`, `start`, `stop`, ...)
/// where stdout carries task output and status lines go to stderr
/// anyway.
pub fn init_stderr() {
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Log to `<state>/runbook.log`. Used by the stdio-MCP and `-serve`
/// entrypoints, where stdout is the MCP transport and must stay clean.
pub fn init_file(state_dir: &Path) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(state_dir)?;
    let file_appender = tracing_appender::rolling::never(state_dir, "runbook.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(non_blocking))
        .try_init();

    Ok(guard)
}
