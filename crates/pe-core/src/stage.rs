// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a stage known to the pipeline server. Opaque to the executor
/// beyond this integer; all other stage attributes (`command`, `logfile`,
/// `mem`, `procs`) are fetched on demand via the [`crate::ServerProxy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageId(pub u64);

impl StageId {
    pub fn new(i: u64) -> Self {
        Self(i)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StageId {
    fn from(i: u64) -> Self {
        Self(i)
    }
}
