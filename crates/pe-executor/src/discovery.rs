// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server discovery and client-URI selection.

use async_trait::async_trait;
use std::net::UdpSocket;
use std::path::PathBuf;

use crate::error::ExecutorError;

/// How to locate the pipeline server.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    /// Look up a well-known key in the naming service.
    NameService(String),
    /// Read the first line of a file containing the server URI.
    UriFile(PathBuf),
}

/// Resolves a naming-service key to a server address. Abstracted as a
/// trait so discovery is testable without a real naming service running.
#[async_trait]
pub trait NameServiceResolver: Send + Sync {
    async fn resolve(&self, key: &str) -> Result<String, ExecutorError>;
}

/// Resolves naming-service keys via an environment variable of the form
/// `PIPELINE_NAMESERVICE_<KEY>` (uppercased). This is the minimal real
/// stand-in for a nameserver in environments that run one out-of-band and
/// export its resolution into the executor's environment; swap in a
/// different [`NameServiceResolver`] for a real service registry.
#[derive(Default)]
pub struct EnvNameServiceResolver;

#[async_trait]
impl NameServiceResolver for EnvNameServiceResolver {
    async fn resolve(&self, key: &str) -> Result<String, ExecutorError> {
        let var = format!("PIPELINE_NAMESERVICE_{}", key.to_uppercase());
        std::env::var(&var).map_err(|_| {
            ExecutorError::Discovery(format!("naming service key '{key}' not found ({var} unset)"))
        })
    }
}

impl Discovery {
    pub async fn resolve(
        &self,
        resolver: &dyn NameServiceResolver,
    ) -> Result<String, ExecutorError> {
        match self {
            Discovery::NameService(key) => resolver.resolve(key).await,
            Discovery::UriFile(path) => read_uri_file(path),
        }
    }
}

fn read_uri_file(path: &std::path::Path) -> Result<String, ExecutorError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ExecutorError::Discovery(format!("reading uri file {}: {e}", path.display()))
    })?;
    let line = content.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Err(ExecutorError::Discovery(format!(
            "uri file {} is empty",
            path.display()
        )));
    }
    Ok(line.to_string())
}

/// Determine this host's externally-reachable (non-loopback) address by
/// asking the OS which local interface would be used to reach an
/// arbitrary public address. No packets are sent; UDP `connect()` only
/// consults the routing table. Falls back to the resolved hostname address
/// if the routing trick fails (e.g. no default route in a sandboxed test
/// environment).
pub fn non_loopback_address() -> Result<std::net::IpAddr, ExecutorError> {
    if let Ok(sock) = UdpSocket::bind("0.0.0.0:0") {
        if sock.connect("8.8.8.8:80").is_ok() {
            if let Ok(addr) = sock.local_addr() {
                if !addr.ip().is_loopback() {
                    return Ok(addr.ip());
                }
            }
        }
    }

    let hostname = hostname::get()
        .map_err(|e| ExecutorError::Discovery(format!("resolving hostname: {e}")))?
        .to_string_lossy()
        .into_owned();
    use std::net::ToSocketAddrs;
    (hostname.as_str(), 0u16)
        .to_socket_addrs()
        .map_err(|e| ExecutorError::Discovery(format!("resolving hostname address: {e}")))?
        .map(|a| a.ip())
        .find(|ip| !ip.is_loopback())
        .ok_or_else(|| {
            ExecutorError::Discovery("no non-loopback address found for this host".into())
        })
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
