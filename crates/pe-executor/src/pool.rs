// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded concurrent executor of Stage Runner tasks.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A bounded pool sized to `procTotal`. Tracks live child PIDs on behalf of
/// Stage Runners so Lifecycle can terminate them during abrupt teardown.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    live_pids: Arc<Mutex<HashSet<u32>>>,
}

impl WorkerPool {
    pub fn new(proc_total: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(proc_total.max(1) as usize)),
            live_pids: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Acquire `procs` worker slots, blocking until available. Paired with
    /// the Resource Ledger's admission check: by the time the Main Loop
    /// dispatches a stage, the ledger has already confirmed the budget is
    /// free, so this should not block in practice.
    pub async fn acquire(&self, procs: u32) -> OwnedSemaphorePermit {
        self.semaphore
            .clone()
            .acquire_many_owned(procs.max(1))
            .await
            .unwrap_or_else(|_| unreachable!("worker pool semaphore is never closed"))
    }

    pub fn register_pid(&self, pid: u32) {
        self.live_pids.lock().insert(pid);
    }

    pub fn unregister_pid(&self, pid: u32) {
        self.live_pids.lock().remove(&pid);
    }

    pub fn live_pid_count(&self) -> usize {
        self.live_pids.lock().len()
    }

    /// Abrupt shutdown: send SIGTERM to every tracked PID without waiting,
    /// and without reporting individual signal-delivery failures (per
    /// spec.md §4.3/§4.7 — the process is exiting regardless).
    pub fn terminate_all(&self) -> Vec<u32> {
        let pids: Vec<u32> = self.live_pids.lock().iter().copied().collect();
        for pid in &pids {
            send_sigterm(*pid);
        }
        pids
    }
}

fn send_sigterm(pid: u32) {
    let _ = std::process::Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
