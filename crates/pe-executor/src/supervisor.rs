// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawns `numExecutors` sibling executor processes and waits on all of
//! them, per spec.md §4.8. Each sibling is a full `pipeline-executor
//! --local ...` invocation; a crashed sibling is logged, not propagated.

use std::process::Stdio;

/// Spawn `count` sibling executors by re-invoking `exe` with `args` plus
/// `--local`, and wait for all of them to exit.
pub async fn run(exe: &std::path::Path, args: &[String], count: i64) -> Result<(), std::io::Error> {
    let mut children = Vec::new();
    for i in 0..count {
        match tokio::process::Command::new(exe)
            .args(args)
            .arg("--local")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
        {
            Ok(child) => children.push(child),
            Err(e) => tracing::error!(executor_index = i, error = %e, "failed to spawn sibling executor"),
        }
    }

    for (i, mut child) in children.into_iter().enumerate() {
        match child.wait().await {
            Ok(status) if status.success() => {
                tracing::info!(executor_index = i, "sibling executor exited cleanly")
            }
            Ok(status) => {
                tracing::warn!(executor_index = i, %status, "sibling executor exited with failure")
            }
            Err(e) => tracing::error!(executor_index = i, error = %e, "failed to wait on sibling executor"),
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
