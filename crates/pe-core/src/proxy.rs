// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed remote handle to the pipeline server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::wire::{self, ProtocolError, Request, Response, DEFAULT_TIMEOUT};
use crate::StageId;

/// A classified transport failure. Transient failures are retried or
/// swallowed by the caller (see the Heartbeat and Main Loop); fatal
/// failures propagate to abrupt teardown.
#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("transient: {0}")]
    Transient(String),

    #[error("fatal: {0}")]
    Fatal(String),
}

impl TransportError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::Fatal(_))
    }
}

impl From<ProtocolError> for TransportError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::ConnectionClosed | ProtocolError::Timeout | ProtocolError::Io(_) => {
                TransportError::Transient(e.to_string())
            }
            ProtocolError::Json(_) | ProtocolError::MessageTooLarge { .. } => {
                TransportError::Fatal(e.to_string())
            }
        }
    }
}

/// The verb returned by `getCommand`, directing the Main Loop's next action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verb {
    RunStage(StageId),
    Wait,
    ShutdownNormally,
}

/// Remote handle to the pipeline server. Every method wraps one RPC call.
///
/// Implementations must be safe to call concurrently from multiple tasks
/// without requiring the caller to hold an external lock; the server is
/// single-threaded and serializes calls on its end.
#[async_trait]
pub trait ServerProxy: Send + Sync {
    async fn register_client(&self, client_uri: &str, mem: f64) -> Result<(), TransportError>;

    async fn unregister_client(&self, client_uri: &str) -> Result<(), TransportError>;

    async fn update_client_timestamp(&self, client_uri: &str) -> Result<(), TransportError>;

    async fn get_command(
        &self,
        client_uri: &str,
        mem_free: f64,
        procs_free: u32,
    ) -> Result<Verb, TransportError>;

    async fn get_stage_command(&self, stage: StageId) -> Result<String, TransportError>;

    async fn get_stage_logfile(&self, stage: StageId) -> Result<PathBuf, TransportError>;

    async fn get_stage_mem(&self, stage: StageId) -> Result<f64, TransportError>;

    async fn get_stage_procs(&self, stage: StageId) -> Result<u32, TransportError>;

    async fn set_stage_started(
        &self,
        stage: StageId,
        client_uri: &str,
    ) -> Result<(), TransportError>;

    async fn set_stage_finished(
        &self,
        stage: StageId,
        client_uri: &str,
    ) -> Result<(), TransportError>;

    async fn set_stage_failed(
        &self,
        stage: StageId,
        client_uri: &str,
    ) -> Result<(), TransportError>;
}

/// [`ServerProxy`] backed by the length-prefixed JSON wire protocol over TCP.
///
/// A single connection is held open and reused across calls, guarded by a
/// mutex so callers never need to serialize themselves; since every call is
/// a short request/response round trip this is not a throughput bottleneck.
pub struct TcpServerProxy {
    conn: Mutex<TcpStream>,
    timeout: std::time::Duration,
}

impl TcpServerProxy {
    pub async fn connect(server_uri: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(server_uri)
            .await
            .map_err(|e| TransportError::Transient(format!("connect {server_uri}: {e}")))?;
        Ok(Self {
            conn: Mutex::new(stream),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    async fn call(&self, request: Request) -> Result<Response, TransportError> {
        let mut conn = self.conn.lock().await;
        let response = wire::call(&mut *conn, &request, self.timeout).await?;
        if let Response::Error(msg) = &response {
            return Err(TransportError::Fatal(msg.clone()));
        }
        Ok(response)
    }
}

#[async_trait]
impl ServerProxy for TcpServerProxy {
    async fn register_client(&self, client_uri: &str, mem: f64) -> Result<(), TransportError> {
        self.call(Request::RegisterClient {
            client_uri: client_uri.to_string(),
            mem,
        })
        .await?;
        Ok(())
    }

    async fn unregister_client(&self, client_uri: &str) -> Result<(), TransportError> {
        self.call(Request::UnregisterClient {
            client_uri: client_uri.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn update_client_timestamp(&self, client_uri: &str) -> Result<(), TransportError> {
        self.call(Request::UpdateClientTimestamp {
            client_uri: client_uri.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn get_command(
        &self,
        client_uri: &str,
        mem_free: f64,
        procs_free: u32,
    ) -> Result<Verb, TransportError> {
        match self
            .call(Request::GetCommand {
                client_uri: client_uri.to_string(),
                mem_free,
                procs_free,
            })
            .await?
        {
            Response::Command(verb) => Ok(verb),
            other => Err(TransportError::Fatal(format!(
                "unexpected response to getCommand: {other:?}"
            ))),
        }
    }

    async fn get_stage_command(&self, stage: StageId) -> Result<String, TransportError> {
        match self.call(Request::GetStageCommand { stage }).await? {
            Response::Text(s) => Ok(s),
            other => Err(TransportError::Fatal(format!(
                "unexpected response to getStageCommand: {other:?}"
            ))),
        }
    }

    async fn get_stage_logfile(&self, stage: StageId) -> Result<PathBuf, TransportError> {
        match self.call(Request::GetStageLogfile { stage }).await? {
            Response::Text(s) => Ok(PathBuf::from(s)),
            other => Err(TransportError::Fatal(format!(
                "unexpected response to getStageLogfile: {other:?}"
            ))),
        }
    }

    async fn get_stage_mem(&self, stage: StageId) -> Result<f64, TransportError> {
        match self.call(Request::GetStageMem { stage }).await? {
            Response::Mem(m) => Ok(m),
            other => Err(TransportError::Fatal(format!(
                "unexpected response to getStageMem: {other:?}"
            ))),
        }
    }

    async fn get_stage_procs(&self, stage: StageId) -> Result<u32, TransportError> {
        match self.call(Request::GetStageProcs { stage }).await? {
            Response::Procs(p) => Ok(p),
            other => Err(TransportError::Fatal(format!(
                "unexpected response to getStageProcs: {other:?}"
            ))),
        }
    }

    async fn set_stage_started(
        &self,
        stage: StageId,
        client_uri: &str,
    ) -> Result<(), TransportError> {
        self.call(Request::SetStageStarted {
            stage,
            client_uri: client_uri.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn set_stage_finished(
        &self,
        stage: StageId,
        client_uri: &str,
    ) -> Result<(), TransportError> {
        self.call(Request::SetStageFinished {
            stage,
            client_uri: client_uri.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn set_stage_failed(
        &self,
        stage: StageId,
        client_uri: &str,
    ) -> Result<(), TransportError> {
        self.call(Request::SetStageFailed {
            stage,
            client_uri: client_uri.to_string(),
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
