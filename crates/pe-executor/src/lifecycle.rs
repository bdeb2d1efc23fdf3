// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bring-up and teardown around one Main Loop run: registration, signal
//! handling, and the graceful/abrupt shutdown disciplines of spec.md §4.7.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};

use pe_core::ServerProxy;

use crate::config::Config;
use crate::discovery::{Discovery, NameServiceResolver};
use crate::error::ExecutorError;
use crate::heartbeat;
use crate::main_loop::{MainLoop, StopReason};
use crate::pool::WorkerPool;

/// How the process should exit, chosen by whichever teardown path ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    /// Graceful completion or a handled interrupt: exit 0.
    Clean,
    /// Abrupt teardown triggered by a fatal error: exit non-zero.
    Faulted,
}

/// Resolve `serverURI`, derive `clientURI`, and register with the server.
/// Returns the registered proxy, the chosen client URI, and the shared
/// `registered` flag the Heartbeat reads.
pub async fn bring_up(
    config: &Config,
    proxy: Arc<dyn ServerProxy>,
) -> Result<(String, heartbeat::Registered), ExecutorError> {
    let client_uri = derive_client_uri()?;

    proxy
        .register_client(&client_uri, config.mem_total)
        .await
        .map_err(|e| ExecutorError::Registration(e.to_string()))?;

    Ok((client_uri, Arc::new(AtomicBool::new(true))))
}

fn derive_client_uri() -> Result<String, ExecutorError> {
    let addr = crate::discovery::non_loopback_address()?;
    Ok(format!("tcp://{addr}:0"))
}

/// Resolve the server's address per [`Discovery`].
pub async fn resolve_server_uri(
    discovery: &Discovery,
    resolver: &dyn NameServiceResolver,
) -> Result<String, ExecutorError> {
    discovery.resolve(resolver).await
}

/// Run one executor end to end: bring-up, Heartbeat + Main Loop, then the
/// teardown discipline matching how the Main Loop stopped.
pub async fn run_one(
    config: Config,
    proxy: Arc<dyn ServerProxy>,
) -> Result<ExitDisposition, ExecutorError> {
    let (client_uri, registered) = bring_up(&config, Arc::clone(&proxy)).await?;
    let connected_at = tokio::time::Instant::now();

    let pool = WorkerPool::new(config.proc_total);
    let escalated = Arc::new(AtomicBool::new(false));
    let heartbeat_handle = heartbeat::spawn(
        Arc::clone(&proxy),
        client_uri.clone(),
        config.heartbeat_interval,
        Arc::clone(&registered),
        config.heartbeat_escalate_after,
        Arc::clone(&escalated),
    );

    let mut main_loop = MainLoop::new(
        Arc::clone(&proxy),
        client_uri.clone(),
        pool.clone(),
        config.mem_total,
        config.proc_total,
        config.idle_limit,
        config.accept_limit,
        config.wait_timeout,
        connected_at,
    );

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| ExecutorError::Fatal(format!("installing SIGTERM handler: {e}")))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| ExecutorError::Fatal(format!("installing SIGINT handler: {e}")))?;

    let outcome = tokio::select! {
        result = main_loop.run() => Outcome::MainLoop(result),
        _ = sigterm.recv() => Outcome::Interrupt,
        _ = sigint.recv() => Outcome::Interrupt,
        _ = escalated_wait(&escalated) => Outcome::HeartbeatEscalated,
    };

    heartbeat_handle.abort();

    match outcome {
        Outcome::MainLoop(Ok(reason)) => {
            tracing::info!(?reason, "main loop stopped, entering graceful teardown");
            graceful_teardown(&proxy, &client_uri, &registered).await;
            Ok(ExitDisposition::Clean)
        }
        Outcome::MainLoop(Err(e)) => {
            tracing::error!(error = %e, "main loop failed, entering abrupt teardown");
            abrupt_teardown(&proxy, &client_uri, &registered, &pool).await;
            Ok(ExitDisposition::Faulted)
        }
        Outcome::Interrupt => {
            tracing::info!("received interrupt signal, entering abrupt teardown");
            abrupt_teardown(&proxy, &client_uri, &registered, &pool).await;
            Ok(ExitDisposition::Clean)
        }
        Outcome::HeartbeatEscalated => {
            tracing::error!("heartbeat escalated after repeated failures, entering abrupt teardown");
            abrupt_teardown(&proxy, &client_uri, &registered, &pool).await;
            Ok(ExitDisposition::Faulted)
        }
    }
}

enum Outcome {
    MainLoop(Result<StopReason, ExecutorError>),
    Interrupt,
    HeartbeatEscalated,
}

async fn escalated_wait(escalated: &Arc<AtomicBool>) {
    loop {
        if escalated.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

/// Graceful teardown: the Main Loop itself awaits every outstanding Stage
/// Runner before returning, so by the time we get here there is nothing
/// left to wait for beyond unregistering.
async fn graceful_teardown(
    proxy: &Arc<dyn ServerProxy>,
    client_uri: &str,
    registered: &heartbeat::Registered,
) {
    registered.store(false, Ordering::SeqCst);
    if let Err(e) = proxy.unregister_client(client_uri).await {
        tracing::warn!(error = %e, "unregisterClient failed during graceful teardown");
    }
}

/// Abrupt teardown: signal every live child, then unregister without
/// waiting for the Worker Pool to drain.
async fn abrupt_teardown(
    proxy: &Arc<dyn ServerProxy>,
    client_uri: &str,
    registered: &heartbeat::Registered,
    pool: &WorkerPool,
) {
    let signaled = pool.terminate_all();
    tracing::info!(count = signaled.len(), "sent SIGTERM to live stage PIDs");

    registered.store(false, Ordering::SeqCst);
    if let Err(e) = proxy.unregister_client(client_uri).await {
        tracing::warn!(error = %e, "unregisterClient failed during abrupt teardown");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
