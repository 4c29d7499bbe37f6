//! Validation of a raw pipeline into a [`Plan`].
//!
//! Rules:
//! - the first step is the only `scan`;
//! - `then_by` directly follows `order_by` or another `then_by`;
//! - every referenced source is declared, and declared once;
//! - aggregate, type, and join-mode names are known, and output field names
//!   of a grouping stage do not collide.

use std::collections::BTreeSet;

use lazyq_core::types::TypeTag;

use crate::dsl::yaml::{parse_yaml_pipeline, AggregateDef, Pipeline, Step};
use crate::error::PlanError;
use crate::logical::{AggFn, Aggregate, JoinMode, Plan, SetOp, SortKey, Stage};

/// Parse and validate in one go.
pub fn plan_yaml(yaml_src: &str) -> Result<Plan, PlanError> {
    plan_pipeline(parse_yaml_pipeline(yaml_src)?)
}

pub fn plan_pipeline(pipeline: Pipeline) -> Result<Plan, PlanError> {
    let mut declared = BTreeSet::new();
    for decl in &pipeline.sources {
        if decl.name.is_empty() {
            return Err(PlanError::Invalid("source names must not be empty".into()));
        }
        if !declared.insert(decl.name.as_str()) {
            return Err(PlanError::Invalid(format!("source `{}` declared twice", decl.name)));
        }
    }
    let require = |name: &str| -> Result<(), PlanError> {
        if declared.contains(name) {
            Ok(())
        } else {
            Err(PlanError::UnknownSource(name.to_string()))
        }
    };

    let mut steps = pipeline.steps.iter();
    let scan = match steps.next() {
        Some(Step::Scan { source }) => {
            require(source)?;
            source.clone()
        }
        Some(other) => {
            return Err(PlanError::Invalid(format!(
                "first step must be `scan`, got `{}`",
                other.op()
            )))
        }
        None => return Err(PlanError::Invalid("empty pipeline".into())),
    };

    let mut stages: Vec<Stage> = Vec::new();
    for step in steps {
        let stage = match step {
            Step::Scan { .. } => {
                return Err(PlanError::Invalid("only the first step may be `scan`".into()))
            }
            Step::OrderBy { field, descending } => Stage::OrderBy {
                keys: vec![sort_key(field, *descending)?],
            },
            Step::ThenBy { field, descending } => {
                match stages.last_mut() {
                    Some(Stage::OrderBy { keys }) => keys.push(sort_key(field, *descending)?),
                    _ => {
                        return Err(PlanError::Invalid(
                            "`then_by` must follow `order_by` or `then_by`".into(),
                        ))
                    }
                }
                continue;
            }
            Step::Distinct { field } => Stage::Distinct {
                field: field.clone(),
            },
            Step::Except { source, field } => set_op(SetOp::Except, source, field, &require)?,
            Step::Intersect { source, field } => {
                set_op(SetOp::Intersect, source, field, &require)?
            }
            Step::Union { source, field } => set_op(SetOp::Union, source, field, &require)?,
            Step::Exclusive { source, field } => {
                set_op(SetOp::Exclusive, source, field, &require)?
            }
            Step::GroupBy { field, aggregates } => {
                non_empty("group_by field", field)?;
                Stage::GroupBy {
                    field: field.clone(),
                    aggregates: aggregates_of(aggregates, field)?,
                }
            }
            Step::Join {
                source,
                left,
                right,
                mode,
            } => {
                require(source)?;
                non_empty("join left field", left)?;
                non_empty("join right field", right)?;
                let mode = match mode.as_deref() {
                    None => JoinMode::default(),
                    Some(name) => JoinMode::parse(name).ok_or_else(|| {
                        PlanError::Invalid(format!("unknown join mode `{name}`"))
                    })?,
                };
                Stage::Join {
                    source: source.clone(),
                    left: left.clone(),
                    right: right.clone(),
                    mode,
                }
            }
            Step::GroupJoin {
                source,
                left,
                right,
                aggregates,
            } => {
                require(source)?;
                non_empty("group_join left field", left)?;
                non_empty("group_join right field", right)?;
                Stage::GroupJoin {
                    source: source.clone(),
                    left: left.clone(),
                    right: right.clone(),
                    aggregates: aggregates_of(aggregates, "")?,
                }
            }
            Step::OfType { field, type_name } => {
                non_empty("of_type field", field)?;
                let tag = TypeTag::parse(type_name)
                    .ok_or_else(|| PlanError::Invalid(format!("unknown type `{type_name}`")))?;
                Stage::OfType {
                    field: field.clone(),
                    tag,
                }
            }
            Step::Take { count } => Stage::Take { count: *count },
        };
        stages.push(stage);
    }

    Ok(Plan {
        sources: pipeline.sources,
        scan,
        stages,
        config: pipeline.config.unwrap_or_default(),
    })
}

fn non_empty(what: &str, value: &str) -> Result<(), PlanError> {
    if value.is_empty() {
        Err(PlanError::Invalid(format!("{what} must not be empty")))
    } else {
        Ok(())
    }
}

fn sort_key(field: &str, descending: bool) -> Result<SortKey, PlanError> {
    non_empty("sort field", field)?;
    Ok(SortKey {
        field: field.to_string(),
        descending,
    })
}

fn set_op(
    op: SetOp,
    source: &str,
    field: &Option<String>,
    require: &dyn Fn(&str) -> Result<(), PlanError>,
) -> Result<Stage, PlanError> {
    require(source)?;
    Ok(Stage::SetOp {
        op,
        source: source.to_string(),
        field: field.clone(),
    })
}

/// Resolve aggregate definitions; `reserved` is an output name already taken.
fn aggregates_of(defs: &[AggregateDef], reserved: &str) -> Result<Vec<Aggregate>, PlanError> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    if !reserved.is_empty() {
        names.insert(reserved.to_string());
    }
    let mut out = Vec::with_capacity(defs.len());
    for def in defs {
        let func = AggFn::parse(&def.func)
            .ok_or_else(|| PlanError::Invalid(format!("unknown aggregate `{}`", def.func)))?;
        if func.needs_field() && def.field.as_deref().map_or(true, str::is_empty) {
            return Err(PlanError::Invalid(format!("`{}` needs a field", func.name())));
        }
        let alias = match (&def.alias, &def.field) {
            (Some(alias), _) => alias.clone(),
            (None, Some(field)) => format!("{}_{field}", func.name()),
            (None, None) => func.name().to_string(),
        };
        if !names.insert(alias.clone()) {
            return Err(PlanError::Invalid(format!("duplicate output field `{alias}`")));
        }
        out.push(Aggregate {
            func,
            field: def.field.clone(),
            alias,
        });
    }
    Ok(out)
}
