//! Human-readable rendering of a [`Plan`], one stage per line.

use std::fmt::Write as _;

use crate::logical::{Aggregate, JoinMode, Plan, Stage};

pub fn explain(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "scan {}{}", plan.scan, located(plan, &plan.scan));
    for (i, stage) in plan.stages.iter().enumerate() {
        let _ = write!(out, "{:>2}. ", i + 1);
        let _ = match stage {
            Stage::OrderBy { keys } => {
                let keys: Vec<String> = keys
                    .iter()
                    .map(|k| format!("{} {}", k.field, if k.descending { "desc" } else { "asc" }))
                    .collect();
                writeln!(out, "order_by {}", keys.join(", "))
            }
            Stage::Distinct { field } => writeln!(out, "distinct{}", keyed(field)),
            Stage::SetOp { op, source, field } => writeln!(
                out,
                "{} {}{}{}",
                op.name(),
                source,
                located(plan, source),
                keyed(field)
            ),
            Stage::GroupBy { field, aggregates } => {
                writeln!(out, "group_by {field}{}", aggregated(aggregates))
            }
            Stage::Join {
                source,
                left,
                right,
                mode,
            } => writeln!(
                out,
                "join {source}{} on {left} = {right}{}",
                located(plan, source),
                match mode {
                    JoinMode::Every => "",
                    JoinMode::Once => " (inner rows match once)",
                }
            ),
            Stage::GroupJoin {
                source,
                left,
                right,
                aggregates,
            } => writeln!(
                out,
                "group_join {source}{} on {left} = {right}{}",
                located(plan, source),
                aggregated(aggregates)
            ),
            Stage::OfType { field, tag } => writeln!(out, "of_type {field}: {tag:?}"),
            Stage::Take { count } => writeln!(out, "take {count}"),
        };
    }
    out
}

fn located(plan: &Plan, name: &str) -> String {
    match plan.source(name).and_then(|s| s.path.as_deref()) {
        Some(path) => format!(" ({path})"),
        None => String::new(),
    }
}

fn keyed(field: &Option<String>) -> String {
    field.as_ref().map(|f| format!(" by {f}")).unwrap_or_default()
}

fn aggregated(aggregates: &[Aggregate]) -> String {
    if aggregates.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = aggregates
        .iter()
        .map(|a| match &a.field {
            Some(field) => format!("{} = {}({field})", a.alias, a.func.name()),
            None => format!("{} = {}()", a.alias, a.func.name()),
        })
        .collect();
    format!(" [{}]", parts.join(", "))
}
