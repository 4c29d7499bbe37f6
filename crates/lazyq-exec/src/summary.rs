//! What a run did, in a form the CLI can print as JSON.

use serde::{Deserialize, Serialize};

use lazyq_operators::MembershipPath;

/// Key membership strategy every keyed stage of the run used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPath {
    Hashed,
    Scanned,
}

impl From<MembershipPath> for KeyPath {
    fn from(path: MembershipPath) -> Self {
        match path {
            MembershipPath::Hashed => KeyPath::Hashed,
            MembershipPath::Scanned => KeyPath::Scanned,
        }
    }
}

/// Rows that left one stage; `scan` is the first entry.
///
/// Counts every pull, so a stage whose consumer reads it twice (the second
/// pass of `exclusive` re-reads its input) reports both reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRows {
    pub stage: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Crate version that produced the run.
    pub engine_version: String,

    /// Rows loaded per referenced source.
    pub source_rows: Vec<StageRows>,

    pub stages: Vec<StageRows>,
    pub rows_out: usize,
    pub key_path: KeyPath,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunSummary {
    pub fn elapsed_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
