//! Wire events of the scan stream.
//!
//! Each variant serializes to one JSON object tagged by `type`, e.g.
//! `{"type":"scanning","repo":"owner/name","scanned":1,"total":2}`.

use crate::models::AccessFinding;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    Start {
        total: usize,
        username: String,
        avatar_url: String,
        is_owner: bool,
    },
    Scanning {
        repo: String,
        scanned: usize,
        total: usize,
    },
    Found {
        repo: AccessFinding,
    },
    /// `total` is the number of findings, not repositories.
    Done {
        total: usize,
    },
    Error {
        message: String,
    },
}

impl ScanEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ScanEvent::Start { .. } => "start",
            ScanEvent::Scanning { .. } => "scanning",
            ScanEvent::Found { .. } => "found",
            ScanEvent::Done { .. } => "done",
            ScanEvent::Error { .. } => "error",
        }
    }
}
