//! Runtime: load sources, lower a `Plan`, drain it, and summarize the run.
//!
//! - Rows registered in memory win over a declaration's `path`; relative
//!   paths resolve against the engine's base directory.
//! - Every loaded source is checked against `max_source_rows`.
//! - The engine uses its `EngineConfig` verbatim; callers merge a plan's
//!   `config:` block (and any overrides of their own) before constructing it.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use lazyq_core::comparer::DefaultEquality;
use lazyq_core::config::EngineConfig;
use lazyq_core::types::{Record, Scalar};
use lazyq_operators::KeyIndex;
use lazyq_planner::{Plan, PlanError};

use crate::lower::{
    counted, lower_stage, open_source, RecordComparer, RecordSeq, SourceRows, Structural,
};
use crate::metrics::emit_span;
use crate::sources::{check_row_cap, load_json_file};
use crate::summary::{KeyPath, RunSummary, StageRows};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("planning: {0}")]
    Plan(#[from] PlanError),
    #[error("query: {0}")]
    Query(#[from] lazyq_core::Error),
    #[error("source `{0}` has no registered rows and no path")]
    MissingSource(String),
    #[error("loading source `{name}`: {reason}")]
    Load { name: String, reason: String },
    #[error("source `{name}` has {rows} rows, over the limit of {limit}")]
    TooManyRows {
        name: String,
        rows: usize,
        limit: usize,
    },
    #[error("serialization: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rows produced by [`Engine::run`].
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub records: Vec<Record>,
    pub summary: RunSummary,
}

/// A lowered plan plus one row counter per step, scan first.
struct Lowered {
    seq: RecordSeq,
    counters: Vec<(&'static str, Rc<Cell<usize>>)>,
}

/// Engine owns the configuration and the in-memory source registry.
pub struct Engine {
    cfg: EngineConfig,
    registered: SourceRows,
    base_dir: Option<PathBuf>,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            cfg,
            registered: BTreeMap::new(),
            base_dir: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Directory that relative source paths resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Make `rows` available under `name`, replacing any earlier registration.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        rows: Vec<Record>,
    ) -> Result<(), ExecError> {
        let name = name.into();
        check_row_cap(&name, rows.len(), self.cfg.max_source_rows)?;
        self.registered.insert(name, Arc::new(rows));
        Ok(())
    }

    pub fn register_json_file(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), ExecError> {
        let name = name.into();
        let rows = load_json_file(&name, path.as_ref())?;
        self.register(name, rows)
    }

    /// Membership strategy keyed stages will use under this config.
    pub fn key_path(&self) -> KeyPath {
        if self.cfg.hash_fast_path {
            KeyIndex::<Scalar, _>::new(DefaultEquality).path().into()
        } else {
            KeyIndex::<Scalar, _>::new(Structural).path().into()
        }
    }

    /// Load every source the plan reads.
    fn resolve(&self, plan: &Plan) -> Result<SourceRows, ExecError> {
        let mut out = SourceRows::new();
        for name in plan.referenced_sources() {
            if let Some(rows) = self.registered.get(name) {
                out.insert(name.to_string(), Arc::clone(rows));
                continue;
            }
            let path = plan
                .source(name)
                .and_then(|decl| decl.path.as_deref())
                .ok_or_else(|| ExecError::MissingSource(name.to_string()))?;
            let path = match &self.base_dir {
                Some(dir) if Path::new(path).is_relative() => dir.join(path),
                _ => PathBuf::from(path),
            };
            let rows = load_json_file(name, &path)?;
            check_row_cap(name, rows.len(), self.cfg.max_source_rows)?;

            #[cfg(feature = "tracing")]
            tracing::debug!(
                source = name,
                rows = rows.len(),
                path = %path.display(),
                "loaded source"
            );

            out.insert(name.to_string(), Arc::new(rows));
        }
        Ok(out)
    }

    fn lower(&self, plan: &Plan, sources: &SourceRows) -> Result<Lowered, ExecError> {
        if self.cfg.hash_fast_path {
            lower_with(plan, sources, &DefaultEquality)
        } else {
            lower_with(plan, sources, &Structural)
        }
    }

    /// The plan as one lazy record sequence. Sources are loaded now; rows are
    /// read only when the sequence is advanced, once per session.
    pub fn prepare(&self, plan: &Plan) -> Result<RecordSeq, ExecError> {
        let sources = self.resolve(plan)?;
        Ok(self.lower(plan, &sources)?.seq)
    }

    /// Drain the plan and report what happened.
    pub fn run(&self, plan: &Plan) -> Result<RunOutput, ExecError> {
        let started_ms = now_millis();
        let sources = self.resolve(plan)?;
        let source_rows: Vec<StageRows> = plan
            .referenced_sources()
            .into_iter()
            .map(|name| StageRows {
                stage: name.to_string(),
                rows: sources.get(name).map_or(0, |rows| rows.len()),
            })
            .collect();

        let lowered = self.lower(plan, &sources)?;
        let records = lazyq_core::terminal::SequenceExt::to_vec(&lowered.seq)?;

        let stages: Vec<StageRows> = lowered
            .counters
            .iter()
            .map(|(stage, counter)| StageRows {
                stage: stage.to_string(),
                rows: counter.get(),
            })
            .collect();
        if self.cfg.trace_steps {
            for (index, step) in stages.iter().enumerate() {
                emit_span(
                    "step",
                    &[
                        ("index", index.to_string()),
                        ("stage", step.stage.clone()),
                        ("rows", step.rows.to_string()),
                    ],
                );
            }
        }

        let summary = RunSummary {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            source_rows,
            stages,
            rows_out: records.len(),
            key_path: self.key_path(),
            started_ms,
            finished_ms: now_millis(),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rows_out = summary.rows_out,
            elapsed_ms = summary.elapsed_ms(),
            key_path = ?summary.key_path,
            "pipeline finished"
        );

        Ok(RunOutput { records, summary })
    }
}

fn lower_with<C: RecordComparer>(
    plan: &Plan,
    sources: &SourceRows,
    comparer: &C,
) -> Result<Lowered, ExecError> {
    let scan_rows = Rc::new(Cell::new(0));
    let mut seq = counted(open_source(sources, &plan.scan)?, Rc::clone(&scan_rows));
    let mut counters = vec![("scan", scan_rows)];
    for stage in &plan.stages {
        let rows = Rc::new(Cell::new(0));
        seq = counted(lower_stage(seq, stage, sources, comparer)?, Rc::clone(&rows));
        counters.push((stage.name(), rows));
    }
    Ok(Lowered { seq, counters })
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
