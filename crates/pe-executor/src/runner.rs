// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot routine that executes a single stage as a child process,
//! streaming its output to a stage log and reporting start/finish/fail.

use std::io::Write as _;
use std::process::Stdio;
use std::sync::Arc;

use pe_core::{ServerProxy, StageId};

use crate::pool::WorkerPool;

/// Outcome of one stage execution, returned to the Main Loop so it can
/// reconcile the Resource Ledger. The ledger is never touched here: only
/// the Main Loop mutates it, per spec.md §9 ("only the Main Loop mutates
/// the Resource Ledger").
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: StageId,
    pub mem: f64,
    pub procs: u32,
    pub failed: bool,
}

/// Execute `stage` to completion and report its outcome to the server.
///
/// Any spawn or I/O failure is treated as stage failure rather than
/// propagated: the Main Loop must still be able to reclaim `(mem, procs)`
/// and keep iterating.
pub async fn run_stage(
    proxy: Arc<dyn ServerProxy>,
    client_uri: String,
    pool: WorkerPool,
    stage: StageId,
    mem: f64,
    procs: u32,
) -> StageOutcome {
    let _permit = pool.acquire(procs).await;

    if let Err(e) = proxy.set_stage_started(stage, &client_uri).await {
        tracing::warn!(%stage, error = %e, "setStageStarted failed, continuing anyway");
    }

    let failed = match execute(&proxy, &pool, stage).await {
        Ok(exit_success) => !exit_success,
        Err(e) => {
            tracing::warn!(%stage, error = %e, "stage execution failed");
            true
        }
    };

    let report = if failed {
        proxy.set_stage_failed(stage, &client_uri).await
    } else {
        proxy.set_stage_finished(stage, &client_uri).await
    };
    if let Err(e) = report {
        tracing::warn!(%stage, error = %e, "failed to report stage outcome to server");
    }

    StageOutcome {
        stage,
        mem,
        procs,
        failed,
    }
}

/// Fetch the stage's command/logfile, spawn it, and wait for completion.
/// Returns `Ok(true)` for exit code 0, `Ok(false)` for any other exit code.
async fn execute(
    proxy: &Arc<dyn ServerProxy>,
    pool: &WorkerPool,
    stage: StageId,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let _span = tracing::info_span!("stage", stage = stage.0).entered();

    let command = proxy.get_stage_command(stage).await?;
    let logfile_path = proxy.get_stage_logfile(stage).await?;

    if let Some(parent) = logfile_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logfile_path)?;

    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown-host".to_string());
    let timestamp = chrono::Utc::now().to_rfc3339();
    writeln!(
        log,
        "Stage {} running on {} at {}:",
        stage.0, hostname, timestamp
    )?;
    writeln!(log, "{command}")?;
    log.flush()?;

    let args = shell_words::split(&command)?;
    let Some((program, rest)) = args.split_first() else {
        writeln!(log, "<empty command>")?;
        return Ok(false);
    };

    let stdout = Stdio::from(log.try_clone()?);
    let stderr = Stdio::from(log);

    let mut child = tokio::process::Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()?;

    let pid = child.id();
    if let Some(pid) = pid {
        pool.register_pid(pid);
    }
    let status = child.wait().await;
    if let Some(pid) = pid {
        pool.unregister_pid(pid);
    }

    Ok(status?.success())
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
