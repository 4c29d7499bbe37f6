#![forbid(unsafe_code)]
//! lazyq-planner: from a YAML pipeline to a validated, linear [`Plan`].
//!
//! Design:
//! - `dsl::yaml` is the raw serde surface, one tagged enum variant per step.
//! - `rules` checks the step order and source references and folds
//!   `then_by` steps into the preceding `order_by` stage.
//! - `logical` holds the validated plan; `explain` renders it.
//!
//! Nothing here reads data; the exec crate lowers a `Plan` into sequences.

pub mod dsl;
pub mod error;
pub mod explain;
pub mod logical;
pub mod rules;

pub use dsl::yaml::{parse_yaml_pipeline, Pipeline, PipelineConfig, SourceDecl, Step};
pub use error::PlanError;
pub use explain::explain;
pub use logical::{AggFn, Aggregate, JoinMode, Plan, SetOp, SortKey, Stage};
pub use rules::{plan_pipeline, plan_yaml};
