// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State machine driving stage acquisition, admission, dispatch, idle
//! accounting, drain, and shutdown triggers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use tokio::sync::{mpsc, Notify};

use pe_core::{ServerProxy, StageId, TransportError, Verb};

use crate::error::ExecutorError;
use crate::ledger::ResourceLedger;
use crate::pool::WorkerPool;
use crate::runner::{self, StageOutcome};

/// Why the Main Loop stopped; every variant leads to graceful teardown
/// (wait for in-flight children, then unregister).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ShutdownNormally,
    IdleTimeout,
    Drained,
}

pub struct MainLoop {
    proxy: Arc<dyn ServerProxy>,
    client_uri: String,
    pool: WorkerPool,
    ledger: ResourceLedger,
    running: HashMap<StageId, (f64, u32)>,
    idle_elapsed: Duration,
    idle_limit: Option<Duration>,
    accept_limit: Option<Duration>,
    connected_at: Instant,
    wait_timeout: Duration,
    wake: Arc<Notify>,
    outcome_tx: mpsc::UnboundedSender<StageOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<StageOutcome>,
}

impl MainLoop {
    pub fn new(
        proxy: Arc<dyn ServerProxy>,
        client_uri: String,
        pool: WorkerPool,
        mem_total: f64,
        procs_total: u32,
        idle_limit: Option<Duration>,
        accept_limit: Option<Duration>,
        wait_timeout: Duration,
        connected_at: Instant,
    ) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            proxy,
            client_uri,
            pool,
            ledger: ResourceLedger::new(mem_total, procs_total),
            running: HashMap::new(),
            idle_elapsed: Duration::ZERO,
            idle_limit,
            accept_limit,
            connected_at,
            wait_timeout,
            wake: Arc::new(Notify::new()),
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn idle_elapsed(&self) -> Duration {
        self.idle_elapsed
    }

    /// Run until a stop condition is reached or a fatal transport error
    /// occurs. On return, zero or more stages may still be running; the
    /// caller (Lifecycle) is responsible for graceful or abrupt teardown.
    pub async fn run(&mut self) -> Result<StopReason, ExecutorError> {
        let mut prev_time: Option<Instant> = None;

        loop {
            let current_time = Instant::now();

            self.free_resources();

            if let Some(prev) = prev_time {
                if self.ledger.is_idle() {
                    self.idle_elapsed += current_time - prev;
                }
            }
            prev_time = Some(current_time);

            if let Some(idle_limit) = self.idle_limit {
                if self.idle_elapsed > idle_limit {
                    self.drain_running().await;
                    return Ok(StopReason::IdleTimeout);
                }
            }

            if let Some(accept_limit) = self.accept_limit {
                if current_time - self.connected_at > accept_limit {
                    self.drain_running().await;
                    return Ok(StopReason::Drained);
                }
            }

            match self
                .proxy
                .get_command(&self.client_uri, self.ledger.mem_free(), self.ledger.procs_free())
                .await
            {
                Ok(Verb::ShutdownNormally) => {
                    self.drain_running().await;
                    return Ok(StopReason::ShutdownNormally);
                }
                Ok(Verb::Wait) => {}
                Ok(Verb::RunStage(stage)) => {
                    if let Err(e) = self.dispatch(stage).await {
                        if e.is_fatal() {
                            return Err(ExecutorError::Transport(e));
                        }
                        tracing::warn!(%stage, error = %e, "transient failure fetching stage metadata, retrying next iteration");
                    }
                }
                Err(e) => {
                    if e.is_fatal() {
                        return Err(ExecutorError::Transport(e));
                    }
                    tracing::warn!(error = %e, "transient getCommand failure, retrying next iteration");
                }
            }

            self.wait_for_wake_or_timeout().await;
        }
    }

    async fn dispatch(&mut self, stage: StageId) -> Result<(), TransportError> {
        let mem = self.proxy.get_stage_mem(stage).await?;
        let procs = self.proxy.get_stage_procs(stage).await?;

        self.idle_elapsed = Duration::ZERO;
        self.ledger.reserve(mem, procs);
        self.running.insert(stage, (mem, procs));

        let proxy = Arc::clone(&self.proxy);
        let client_uri = self.client_uri.clone();
        let pool = self.pool.clone();
        let tx = self.outcome_tx.clone();
        let wake = Arc::clone(&self.wake);

        tokio::spawn(async move {
            let outcome = runner::run_stage(proxy, client_uri, pool, stage, mem, procs).await;
            let _ = tx.send(outcome);
            wake.notify_one();
        });

        Ok(())
    }

    /// Reap completed children and release their reservations. Only the
    /// Main Loop mutates the Resource Ledger (spec.md §9).
    fn free_resources(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.running.remove(&outcome.stage);
            self.ledger.release(outcome.mem, outcome.procs);
        }
    }

    /// Graceful teardown, step 1: await every outstanding Stage Runner and
    /// release its reservation before the Main Loop returns. Lifecycle only
    /// needs to unregister after this.
    async fn drain_running(&mut self) {
        while !self.running.is_empty() {
            match self.outcome_rx.recv().await {
                Some(outcome) => {
                    self.running.remove(&outcome.stage);
                    self.ledger.release(outcome.mem, outcome.procs);
                }
                None => break,
            }
        }
    }

    async fn wait_for_wake_or_timeout(&self) {
        tokio::select! {
            _ = self.wake.notified() => {}
            _ = tokio::time::sleep(self.wait_timeout) => {}
        }
    }
}

#[cfg(test)]
#[path = "main_loop_tests.rs"]
mod tests;
