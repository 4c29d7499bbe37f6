#![forbid(unsafe_code)]
//! lazyq-exec: runs validated pipelines over record sources.
//!
//! Design intent:
//! - `Engine::prepare` loads every referenced source up front, then lowers the
//!   plan stage by stage into one boxed `Sequence<Item = Record>`; nothing is
//!   read from the rows until the caller advances it.
//! - All keyed stages share one comparer, chosen from `EngineConfig`, so a
//!   single switch moves the whole run between the hashed and scanned paths.
//! - `Engine::run` drains the pipeline and returns a `RunSummary` alongside
//!   the rows.

pub mod aggregate;
pub mod lower;
pub mod metrics;
pub mod runtime;
pub mod sources;
pub mod summary;

pub use lower::Structural;
pub use runtime::{Engine, ExecError, RunOutput};
pub use summary::{KeyPath, RunSummary, StageRows};
