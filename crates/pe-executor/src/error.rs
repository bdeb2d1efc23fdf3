// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy and process exit codes.

use pe_core::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("discovery failure: {0}")]
    Discovery(String),

    #[error("registration failure: {0}")]
    Registration(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("fatal executor error: {0}")]
    Fatal(String),
}

impl ExecutorError {
    /// Exit code per spec.md §6: 0 on graceful completion or handled
    /// interrupt, non-zero otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecutorError::Config(_)
            | ExecutorError::Discovery(_)
            | ExecutorError::Registration(_)
            | ExecutorError::Transport(_)
            | ExecutorError::Fatal(_) => 1,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
