// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodically refreshes the client's liveness timestamp on the server.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pe_core::ServerProxy;

/// Shared flag toggled by Lifecycle: true between successful
/// `registerClient` and unregister. The Heartbeat checks this before every
/// tick and stops once it flips to false, relying on the unset-before-call
/// discipline in Lifecycle to avoid a race with `unregisterClient`.
pub type Registered = Arc<AtomicBool>;

/// Spawn the Heartbeat Ticker. Runs until `registered` is false or the
/// configured number of consecutive failures triggers escalation.
///
/// `escalate_after == 0` disables escalation, matching the original's
/// log-and-continue behavior (spec.md §9's open question, resolved as an
/// additive opt-in rather than a default behavior change).
pub fn spawn(
    proxy: Arc<dyn ServerProxy>,
    client_uri: String,
    interval: Duration,
    registered: Registered,
    escalate_after: u32,
    escalated: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let consecutive_failures = AtomicU32::new(0);
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it

        while registered.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !registered.load(Ordering::SeqCst) {
                break;
            }

            match proxy.update_client_timestamp(&client_uri).await {
                Ok(()) => {
                    consecutive_failures.store(0, Ordering::SeqCst);
                }
                Err(e) => {
                    let n = consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::warn!(error = %e, consecutive_failures = n, "heartbeat failed");
                    if escalate_after > 0 && n >= escalate_after {
                        tracing::error!(
                            consecutive_failures = n,
                            "heartbeat escalating to abrupt teardown"
                        );
                        escalated.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
