// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format encoding/decoding for the executor-to-server RPC channel.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StageId;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timeout")]
    Timeout,
}

/// Maximum message size (16 MiB; stage commands and logfile paths are tiny,
/// this just guards against a corrupt length prefix).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Default per-call RPC timeout. The server is expected to respond within
/// `LATENCY_TOLERANCE` (15s); this is deliberately generous relative to that.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

/// One RPC call on the wire, client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "args")]
pub enum Request {
    RegisterClient { client_uri: String, mem: f64 },
    UnregisterClient { client_uri: String },
    UpdateClientTimestamp { client_uri: String },
    GetCommand {
        client_uri: String,
        mem_free: f64,
        procs_free: u32,
    },
    GetStageCommand { stage: StageId },
    GetStageLogfile { stage: StageId },
    GetStageMem { stage: StageId },
    GetStageProcs { stage: StageId },
    SetStageStarted { stage: StageId, client_uri: String },
    SetStageFinished { stage: StageId, client_uri: String },
    SetStageFailed { stage: StageId, client_uri: String },
}

/// One RPC reply on the wire, server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", content = "value")]
pub enum Response {
    Ack,
    Command(crate::proxy::Verb),
    Text(String),
    Mem(f64),
    Procs(u32),
    Error(String),
}

/// Encode a message to JSON bytes (without length prefix).
///
/// Use with [`write_message`] which handles the length-prefix wire format.
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;

    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    Ok(json)
}

/// Decode a message from wire format.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read a length-prefixed message from an async reader.
pub async fn read_message<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Write a length-prefixed message to an async writer.
pub async fn write_message<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    let len = data.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Send a request and read the matching response, both under `timeout`.
pub async fn call<S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin>(
    stream: &mut S,
    request: &Request,
    timeout: std::time::Duration,
) -> Result<Response, ProtocolError> {
    let data = encode(request)?;
    tokio::time::timeout(timeout, write_message(stream, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    let bytes = tokio::time::timeout(timeout, read_message(stream))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
