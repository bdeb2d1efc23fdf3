// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated executor configuration, built from [`crate::cli::Cli`].

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::discovery::Discovery;
use crate::error::ExecutorError;

/// Heartbeat interval, matching the original's `HEARTBEAT_INTERVAL`.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Main-loop wake timeout, matching the original's `WAIT_TIMEOUT`.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Assumed upper bound on server RPC latency, matching the original's
/// `LATENCY_TOLERANCE`. Used only to size [`SHUTDOWN_TIME`].
pub const LATENCY_TOLERANCE: Duration = Duration::from_secs(15);

/// Budget for a polite (graceful) exit: `WAIT_TIMEOUT + LATENCY_TOLERANCE`.
pub const SHUTDOWN_TIME: Duration = Duration::from_secs(20);

/// Executor configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub mem_total: f64,
    pub proc_total: u32,
    pub discovery: Discovery,
    pub idle_limit: Option<Duration>,
    pub accept_limit: Option<Duration>,
    pub heartbeat_interval: Duration,
    pub wait_timeout: Duration,
    pub heartbeat_escalate_after: u32,
    pub num_executors: i64,
    pub local: bool,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Validate and build a [`Config`] from parsed CLI arguments.
    ///
    /// Resolves the `--queue`/`--queue-type` and `--sge-queue-opts`/`--queue-name`
    /// deprecated-alias pairs by rejecting conflicting values outright,
    /// rather than silently letting the deprecated value lose as the
    /// original did (see DESIGN.md).
    pub fn from_cli(cli: &Cli) -> Result<Self, ExecutorError> {
        if cli.num_executors < 0 {
            return Err(ExecutorError::Config(format!(
                "--num-executors must be >= 0, got {}",
                cli.num_executors
            )));
        }

        reject_conflicting_alias("--queue", &cli.queue, "--queue-type", &cli.queue_type)?;
        reject_conflicting_alias(
            "--sge-queue-opts",
            &cli.sge_queue_opts,
            "--queue-name",
            &cli.queue_name,
        )?;

        if cli.no_monitor_heartbeats {
            tracing::warn!(
                "--no-monitor-heartbeats only affects the server's liveness assumption; \
                 this executor's own heartbeat behavior is unaffected"
            );
        }

        let discovery = if cli.use_ns {
            Discovery::NameService(cli.pipeline_name.clone())
        } else {
            let path = cli
                .uri_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("{}_uri", cli.pipeline_name)));
            Discovery::UriFile(path)
        };

        Ok(Config {
            mem_total: cli.mem,
            proc_total: cli.proc,
            discovery,
            idle_limit: cli.time_to_seppuku.map(minutes),
            accept_limit: cli.time_to_accept_jobs.map(minutes),
            heartbeat_interval: HEARTBEAT_INTERVAL,
            wait_timeout: WAIT_TIMEOUT,
            heartbeat_escalate_after: cli.heartbeat_escalate_after,
            num_executors: cli.num_executors,
            local: cli.local,
            log_file: cli.log_file.clone(),
        })
    }
}

fn minutes(m: f64) -> Duration {
    Duration::from_secs_f64((m * 60.0).max(0.0))
}

fn reject_conflicting_alias(
    deprecated_name: &str,
    deprecated: &Option<String>,
    canonical_name: &str,
    canonical: &Option<String>,
) -> Result<(), ExecutorError> {
    if let (Some(d), Some(c)) = (deprecated, canonical) {
        if d != c {
            return Err(ExecutorError::Config(format!(
                "{deprecated_name}={d} conflicts with {canonical_name}={c}; \
                 pass only one"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
