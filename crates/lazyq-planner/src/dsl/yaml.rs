//! YAML surface for *linear* record pipelines.
//!
//! Example:
//! ```yaml
//! sources:
//!   - { name: people, path: "data/people.json" }
//!   - { name: pets }
//! steps:
//!   - { op: scan, source: people }
//!   - { op: join, source: pets, left: id, right: owner }
//!   - { op: order_by, field: age, descending: true }
//!   - { op: then_by, field: name }
//!   - { op: take, count: 10 }
//! ```

use serde::{Deserialize, Serialize};

use lazyq_core::config::EngineConfig;

use crate::error::PlanError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub config: Option<PipelineConfig>,
    #[serde(default)]
    pub sources: Vec<SourceDecl>,
    pub steps: Vec<Step>,
}

/// A named input. Without a `path` the rows must be registered with the
/// engine (or passed on the command line) before running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDecl {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Step {
    Scan {
        source: String,
    },

    OrderBy {
        field: String,
        #[serde(default)]
        descending: bool,
    },

    ThenBy {
        field: String,
        #[serde(default)]
        descending: bool,
    },

    Distinct {
        #[serde(default)]
        field: Option<String>,
    },

    Except {
        source: String,
        #[serde(default)]
        field: Option<String>,
    },

    Intersect {
        source: String,
        #[serde(default)]
        field: Option<String>,
    },

    Union {
        source: String,
        #[serde(default)]
        field: Option<String>,
    },

    Exclusive {
        source: String,
        #[serde(default)]
        field: Option<String>,
    },

    GroupBy {
        field: String,
        #[serde(default)]
        aggregates: Vec<AggregateDef>,
    },

    Join {
        source: String,
        left: String,
        right: String,
        /// `every` (default) or `once`.
        #[serde(default)]
        mode: Option<String>,
    },

    GroupJoin {
        source: String,
        left: String,
        right: String,
        #[serde(default)]
        aggregates: Vec<AggregateDef>,
    },

    OfType {
        field: String,
        #[serde(rename = "type")]
        type_name: String,
    },

    Take {
        count: usize,
    },
}

impl Step {
    /// The `op` tag, for messages.
    pub fn op(&self) -> &'static str {
        match self {
            Step::Scan { .. } => "scan",
            Step::OrderBy { .. } => "order_by",
            Step::ThenBy { .. } => "then_by",
            Step::Distinct { .. } => "distinct",
            Step::Except { .. } => "except",
            Step::Intersect { .. } => "intersect",
            Step::Union { .. } => "union",
            Step::Exclusive { .. } => "exclusive",
            Step::GroupBy { .. } => "group_by",
            Step::Join { .. } => "join",
            Step::GroupJoin { .. } => "group_join",
            Step::OfType { .. } => "of_type",
            Step::Take { .. } => "take",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateDef {
    /// `count`, `sum`, `min`, `max`, or `collect`.
    pub func: String,
    #[serde(default)]
    pub field: Option<String>,
    /// Output field name; defaults to `func` or `func_field`.
    #[serde(default, rename = "as")]
    pub alias: Option<String>,
}

/// Per-pipeline overrides of [`EngineConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub hash_fast_path: Option<bool>,
    pub max_source_rows: Option<usize>,
    pub trace_steps: Option<bool>,
}

impl PipelineConfig {
    pub fn apply(&self, cfg: &mut EngineConfig) {
        if let Some(v) = self.hash_fast_path {
            cfg.hash_fast_path = v;
        }
        if let Some(v) = self.max_source_rows {
            cfg.max_source_rows = Some(v);
        }
        if let Some(v) = self.trace_steps {
            cfg.trace_steps = v;
        }
    }
}

/// Parse YAML text into the raw pipeline; see [`crate::rules`] for validation.
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<Pipeline, PlanError> {
    Ok(serde_yaml::from_str(yaml_src)?)
}
