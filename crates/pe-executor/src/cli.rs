// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface, covering every flag in the core CLI contract plus
//! the legacy/ambient flags the original batch-submission tool carried.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pipeline-executor",
    version,
    about = "Registers with a pipeline server and runs its stages as local child processes"
)]
pub struct Cli {
    /// Location of server URI file (fallback when no name service).
    #[arg(long, value_name = "PATH")]
    pub uri_file: Option<PathBuf>,

    /// Use the naming service instead of a URI file.
    #[arg(long)]
    pub use_ns: bool,

    /// Name of the pipeline, used both as the name-service key and to
    /// derive the default URI file name (`<pipelineName>_uri`).
    #[arg(long, default_value = "pipeline")]
    pub pipeline_name: String,

    /// Supervisor spawn count. Unspecified or N<0 is a usage error.
    #[arg(long, default_value_t = -1)]
    pub num_executors: i64,

    /// Per-executor process budget.
    #[arg(long, default_value_t = 1)]
    pub proc: u32,

    /// Per-executor memory budget, in gigabytes.
    #[arg(long, default_value_t = 2.0)]
    pub mem: f64,

    /// Idle timeout in minutes before self-termination ("seppuku"). Omit to
    /// disable.
    #[arg(long, value_name = "MIN")]
    pub time_to_seppuku: Option<f64>,

    /// Drain deadline in minutes from registration; after this, stop
    /// accepting new stages but let running ones finish. Omit to disable.
    #[arg(long, value_name = "MIN")]
    pub time_to_accept_jobs: Option<f64>,

    /// Run as an executor directly in this process (otherwise a Supervisor
    /// would submit to a batch system — out of scope here).
    #[arg(long)]
    pub local: bool,

    /// Consecutive heartbeat failures before escalating to abrupt teardown.
    /// 0 (default) disables escalation, matching the original's log-and-continue
    /// behavior.
    #[arg(long, default_value_t = 0)]
    pub heartbeat_escalate_after: u32,

    /// Write logs to this file in addition to stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Maximum number of executors the server will relaunch after a crash.
    /// Enforced server-side; accepted here only so existing invocations
    /// don't break.
    #[arg(long)]
    pub max_failed_executors: Option<u32>,

    /// Disable the server's heartbeat-based liveness assumption. Not acted
    /// on locally; accepted and ignored with a warning.
    #[arg(long)]
    pub no_monitor_heartbeats: bool,

    /// Batch queue type (out-of-scope submission wrapper, parsed for
    /// forward compatibility).
    #[arg(long)]
    pub queue_type: Option<String>,

    /// Deprecated alias of `--queue-type`.
    #[arg(long)]
    pub queue: Option<String>,

    /// Batch queue name (out-of-scope submission wrapper).
    #[arg(long)]
    pub queue_name: Option<String>,

    /// Deprecated alias of `--queue-name`.
    #[arg(long)]
    pub sge_queue_opts: Option<String>,

    /// Batch wall-clock time request (out-of-scope submission wrapper).
    #[arg(long)]
    pub time: Option<String>,

    /// Processes per node for batch submission (out-of-scope submission
    /// wrapper).
    #[arg(long)]
    pub ppn: Option<u32>,

    /// Minimum wall time for batch submission (out-of-scope submission
    /// wrapper).
    #[arg(long)]
    pub min_walltime: Option<String>,

    /// Maximum wall time for batch submission (out-of-scope submission
    /// wrapper).
    #[arg(long)]
    pub max_walltime: Option<String>,

    /// Prologue script to source before batch submission (out-of-scope
    /// submission wrapper).
    #[arg(long)]
    pub prologue_file: Option<PathBuf>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
