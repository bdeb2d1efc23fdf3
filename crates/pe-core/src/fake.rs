// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake server proxy for deterministic executor testing.
#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::proxy::{ServerProxy, TransportError, Verb};
use crate::StageId;

/// One call recorded by [`FakeServerProxy`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerCall {
    RegisterClient { client_uri: String, mem: f64 },
    UnregisterClient { client_uri: String },
    UpdateClientTimestamp { client_uri: String },
    GetCommand { mem_free: f64, procs_free: u32 },
    StageStarted(StageId),
    StageFinished(StageId),
    StageFailed(StageId),
}

#[derive(Clone)]
struct StageMeta {
    command: String,
    logfile: PathBuf,
    mem: f64,
    procs: u32,
}

type Responder = dyn Fn(f64, u32) -> Verb + Send + Sync;

struct Inner {
    /// Verbs returned by successive `getCommand` calls, in order. The last
    /// entry repeats once exhausted so scenarios don't need to pad a tail
    /// of `Wait`.
    script: Vec<Verb>,
    cursor: usize,
    /// When set, takes priority over `script`: lets a test emulate a real
    /// server that only offers a stage when it actually fits the reported
    /// free budget (e.g. the resource-gated-wait scenario).
    responder: Option<Arc<Responder>>,
    stages: HashMap<StageId, StageMeta>,
    calls: Vec<ServerCall>,
    get_command_error: Option<TransportError>,
    heartbeat_error: Option<TransportError>,
}

/// In-memory stand-in for the pipeline server, driving a scripted sequence
/// of `getCommand` verbs and recording every call the executor makes so
/// tests can assert on ordering (e.g. `setStageStarted` before
/// `setStageFinished`).
#[derive(Clone)]
pub struct FakeServerProxy {
    inner: Arc<Mutex<Inner>>,
}

impl FakeServerProxy {
    pub fn new(script: Vec<Verb>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                script,
                cursor: 0,
                responder: None,
                stages: HashMap::new(),
                calls: Vec::new(),
                get_command_error: None,
                heartbeat_error: None,
            })),
        }
    }

    /// Replace the scripted sequence with a closure that computes the next
    /// verb from the `(memFree, procsFree)` the executor just reported.
    pub fn with_responder(self, responder: impl Fn(f64, u32) -> Verb + Send + Sync + 'static) -> Self {
        self.inner.lock().responder = Some(Arc::new(responder));
        self
    }

    pub fn with_stage(
        self,
        id: StageId,
        command: impl Into<String>,
        logfile: impl Into<PathBuf>,
        mem: f64,
        procs: u32,
    ) -> Self {
        self.inner.lock().stages.insert(
            id,
            StageMeta {
                command: command.into(),
                logfile: logfile.into(),
                mem,
                procs,
            },
        );
        self
    }

    /// Make every subsequent `getCommand` call fail with the given error.
    pub fn fail_get_command(&self, err: TransportError) {
        self.inner.lock().get_command_error = Some(err);
    }

    /// Make every subsequent `updateClientTimestamp` call fail.
    pub fn fail_heartbeat(&self, err: TransportError) {
        self.inner.lock().heartbeat_error = Some(err);
    }

    pub fn calls(&self) -> Vec<ServerCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl ServerProxy for FakeServerProxy {
    async fn register_client(&self, client_uri: &str, mem: f64) -> Result<(), TransportError> {
        self.inner.lock().calls.push(ServerCall::RegisterClient {
            client_uri: client_uri.to_string(),
            mem,
        });
        Ok(())
    }

    async fn unregister_client(&self, client_uri: &str) -> Result<(), TransportError> {
        self.inner.lock().calls.push(ServerCall::UnregisterClient {
            client_uri: client_uri.to_string(),
        });
        Ok(())
    }

    async fn update_client_timestamp(&self, client_uri: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push(ServerCall::UpdateClientTimestamp {
                client_uri: client_uri.to_string(),
            });
        if let Some(err) = inner.heartbeat_error.clone() {
            return Err(err);
        }
        Ok(())
    }

    async fn get_command(
        &self,
        _client_uri: &str,
        mem_free: f64,
        procs_free: u32,
    ) -> Result<Verb, TransportError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ServerCall::GetCommand {
            mem_free,
            procs_free,
        });
        if let Some(err) = inner.get_command_error.clone() {
            return Err(err);
        }
        if let Some(responder) = inner.responder.clone() {
            return Ok(responder(mem_free, procs_free));
        }
        if inner.script.is_empty() {
            return Ok(Verb::Wait);
        }
        let i = inner.cursor.min(inner.script.len() - 1);
        let verb = inner.script[i].clone();
        if inner.cursor < inner.script.len() {
            inner.cursor += 1;
        }
        Ok(verb)
    }

    async fn get_stage_command(&self, stage: StageId) -> Result<String, TransportError> {
        let inner = self.inner.lock();
        inner
            .stages
            .get(&stage)
            .map(|s| s.command.clone())
            .ok_or_else(|| TransportError::Fatal(format!("unknown stage {stage}")))
    }

    async fn get_stage_logfile(&self, stage: StageId) -> Result<PathBuf, TransportError> {
        let inner = self.inner.lock();
        inner
            .stages
            .get(&stage)
            .map(|s| s.logfile.clone())
            .ok_or_else(|| TransportError::Fatal(format!("unknown stage {stage}")))
    }

    async fn get_stage_mem(&self, stage: StageId) -> Result<f64, TransportError> {
        let inner = self.inner.lock();
        inner
            .stages
            .get(&stage)
            .map(|s| s.mem)
            .ok_or_else(|| TransportError::Fatal(format!("unknown stage {stage}")))
    }

    async fn get_stage_procs(&self, stage: StageId) -> Result<u32, TransportError> {
        let inner = self.inner.lock();
        inner
            .stages
            .get(&stage)
            .map(|s| s.procs)
            .ok_or_else(|| TransportError::Fatal(format!("unknown stage {stage}")))
    }

    async fn set_stage_started(
        &self,
        stage: StageId,
        _client_uri: &str,
    ) -> Result<(), TransportError> {
        self.inner.lock().calls.push(ServerCall::StageStarted(stage));
        Ok(())
    }

    async fn set_stage_finished(
        &self,
        stage: StageId,
        _client_uri: &str,
    ) -> Result<(), TransportError> {
        self.inner
            .lock()
            .calls
            .push(ServerCall::StageFinished(stage));
        Ok(())
    }

    async fn set_stage_failed(
        &self,
        stage: StageId,
        _client_uri: &str,
    ) -> Result<(), TransportError> {
        self.inner.lock().calls.push(ServerCall::StageFailed(stage));
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
