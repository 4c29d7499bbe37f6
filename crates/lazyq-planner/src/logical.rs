//! The validated, linear plan.

use serde::{Deserialize, Serialize};

use lazyq_core::types::TypeTag;

use crate::dsl::yaml::{PipelineConfig, SourceDecl};
use crate::error::PlanError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub sources: Vec<SourceDecl>,
    /// The source every stage reads from.
    pub scan: String,
    pub stages: Vec<Stage>,
    pub config: PipelineConfig,
}

impl Plan {
    pub fn source(&self, name: &str) -> Option<&SourceDecl> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Names of every source read while running the plan, scan first.
    pub fn referenced_sources(&self) -> Vec<&str> {
        let mut names = vec![self.scan.as_str()];
        for stage in &self.stages {
            if let Some(name) = stage.other_source() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn to_json_pretty(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum Stage {
    /// One `order_by` plus the `then_by` levels that followed it.
    OrderBy { keys: Vec<SortKey> },
    Distinct { field: Option<String> },
    SetOp {
        op: SetOp,
        source: String,
        field: Option<String>,
    },
    GroupBy {
        field: String,
        aggregates: Vec<Aggregate>,
    },
    Join {
        source: String,
        left: String,
        right: String,
        mode: JoinMode,
    },
    GroupJoin {
        source: String,
        left: String,
        right: String,
        aggregates: Vec<Aggregate>,
    },
    OfType { field: String, tag: TypeTag },
    Take { count: usize },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::OrderBy { .. } => "order_by",
            Stage::Distinct { .. } => "distinct",
            Stage::SetOp { op, .. } => op.name(),
            Stage::GroupBy { .. } => "group_by",
            Stage::Join { .. } => "join",
            Stage::GroupJoin { .. } => "group_join",
            Stage::OfType { .. } => "of_type",
            Stage::Take { .. } => "take",
        }
    }

    /// The second source this stage reads, if any.
    pub fn other_source(&self) -> Option<&str> {
        match self {
            Stage::SetOp { source, .. }
            | Stage::Join { source, .. }
            | Stage::GroupJoin { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOp {
    Except,
    Intersect,
    Union,
    Exclusive,
}

impl SetOp {
    pub fn name(self) -> &'static str {
        match self {
            SetOp::Except => "except",
            SetOp::Intersect => "intersect",
            SetOp::Union => "union",
            SetOp::Exclusive => "exclusive",
        }
    }
}

/// Inner-element reuse in a join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    #[default]
    Every,
    Once,
}

impl JoinMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "every" => Some(JoinMode::Every),
            "once" => Some(JoinMode::Once),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFn {
    /// Rows in the group, or non-null values of `field` when one is given.
    Count,
    Sum,
    Min,
    Max,
    /// Every value of `field`, as a list.
    Collect,
}

impl AggFn {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "count" => AggFn::Count,
            "sum" => AggFn::Sum,
            "min" => AggFn::Min,
            "max" => AggFn::Max,
            "collect" => AggFn::Collect,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            AggFn::Count => "count",
            AggFn::Sum => "sum",
            AggFn::Min => "min",
            AggFn::Max => "max",
            AggFn::Collect => "collect",
        }
    }

    pub fn needs_field(self) -> bool {
        !matches!(self, AggFn::Count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub func: AggFn,
    pub field: Option<String>,
    pub alias: String,
}
