// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup: stderr by default, optionally mirrored to a log file.

use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Guard that must be held for the lifetime of the process when a log file
/// is configured; dropping it stops the non-blocking writer thread.
pub enum LogGuard {
    Stderr,
    File(tracing_appender::non_blocking::WorkerGuard),
}

/// Initialize the global tracing subscriber. Respects `RUST_LOG`, defaulting
/// to `info` when unset.
pub fn setup_logging(log_file: Option<&Path>) -> Result<LogGuard, std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
            Ok(LogGuard::Stderr)
        }
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path.file_name().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "log file has no name")
            })?;
            let appender = tracing_appender::rolling::never(
                dir.unwrap_or_else(|| Path::new(".")),
                file_name,
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
            Ok(LogGuard::File(guard))
        }
    }
}
