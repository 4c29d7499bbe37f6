//! Running accumulators behind `group_by` and `group_join` aggregates.
//!
//! `group_by` folds rows into one [`Accumulator`] per aggregate as they
//! stream past; `group_join` folds its matched bucket the same way, so both
//! stages agree on every function's result.

use lazyq_core::types::{Record, Scalar};
use lazyq_planner::{AggFn, Aggregate};

#[derive(Debug, Clone)]
pub enum Accumulator {
    Count(i64),
    /// `ints` stays exact until a float arrives or the sum overflows.
    Sum { ints: Option<i64>, floats: f64 },
    Min(Option<Scalar>),
    Max(Option<Scalar>),
    Collect(Vec<Scalar>),
}

impl Accumulator {
    pub fn new(func: AggFn) -> Self {
        match func {
            AggFn::Count => Accumulator::Count(0),
            AggFn::Sum => Accumulator::Sum {
                ints: Some(0),
                floats: 0.0,
            },
            AggFn::Min => Accumulator::Min(None),
            AggFn::Max => Accumulator::Max(None),
            AggFn::Collect => Accumulator::Collect(Vec::new()),
        }
    }

    /// Fold one row; `field` is the aggregate's input column, if any.
    pub fn push(&mut self, field: Option<&str>, row: &Record) {
        let value = field.map(|f| row.get(f));
        match self {
            Accumulator::Count(n) => {
                if value.map_or(true, |v| !v.is_null()) {
                    *n += 1;
                }
            }
            Accumulator::Sum { ints, floats } => match value {
                Some(Scalar::Int(v)) => {
                    *ints = ints.and_then(|acc| acc.checked_add(*v));
                    *floats += *v as f64;
                }
                Some(Scalar::Float(v)) => {
                    *ints = None;
                    *floats += v;
                }
                _ => {}
            },
            Accumulator::Min(best) => {
                if let Some(v) = value.filter(|v| !v.is_null()) {
                    if best.as_ref().map_or(true, |b| v < b) {
                        *best = Some(v.clone());
                    }
                }
            }
            Accumulator::Max(best) => {
                if let Some(v) = value.filter(|v| !v.is_null()) {
                    if best.as_ref().map_or(true, |b| v > b) {
                        *best = Some(v.clone());
                    }
                }
            }
            Accumulator::Collect(items) => {
                if let Some(v) = value {
                    items.push(v.clone());
                }
            }
        }
    }

    pub fn finish(self) -> Scalar {
        match self {
            Accumulator::Count(n) => Scalar::Int(n),
            Accumulator::Sum {
                ints: Some(total), ..
            } => Scalar::Int(total),
            Accumulator::Sum { floats, .. } => Scalar::Float(floats),
            Accumulator::Min(best) | Accumulator::Max(best) => best.unwrap_or(Scalar::Null),
            Accumulator::Collect(items) => Scalar::List(items),
        }
    }
}

/// One accumulator per aggregate, in declaration order.
pub fn start(aggregates: &[Aggregate]) -> Vec<Accumulator> {
    aggregates.iter().map(|a| Accumulator::new(a.func)).collect()
}

pub fn fold(aggregates: &[Aggregate], mut accs: Vec<Accumulator>, row: &Record) -> Vec<Accumulator> {
    for (agg, acc) in aggregates.iter().zip(accs.iter_mut()) {
        acc.push(agg.field.as_deref(), row);
    }
    accs
}

/// Write every finished aggregate into `out` under its alias.
pub fn finish_into(aggregates: &[Aggregate], accs: Vec<Accumulator>, out: &mut Record) {
    for (agg, acc) in aggregates.iter().zip(accs) {
        out.insert(agg.alias.clone(), acc.finish());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(func: AggFn, field: Option<&str>) -> Aggregate {
        Aggregate {
            func,
            field: field.map(str::to_string),
            alias: func.name().to_string(),
        }
    }

    fn rows() -> Vec<Record> {
        vec![
            Record::new().with("v", 3i64).with("s", "b"),
            Record::new().with("v", 1i64).with("s", "a"),
            Record::new().with("s", "c"),
        ]
    }

    fn run(a: Aggregate) -> Scalar {
        let aggs = vec![a];
        let accs = rows().iter().fold(start(&aggs), |accs, r| fold(&aggs, accs, r));
        let mut out = Record::new();
        finish_into(&aggs, accs, &mut out);
        out.get(aggs[0].alias.as_str()).clone()
    }

    #[test]
    fn counts_rows_or_present_values() {
        assert_eq!(run(agg(AggFn::Count, None)), Scalar::Int(3));
        assert_eq!(run(agg(AggFn::Count, Some("v"))), Scalar::Int(2));
    }

    #[test]
    fn sums_stay_integral_until_a_float_arrives() {
        assert_eq!(run(agg(AggFn::Sum, Some("v"))), Scalar::Int(4));
        let mut acc = Accumulator::new(AggFn::Sum);
        acc.push(Some("v"), &Record::new().with("v", 1i64));
        acc.push(Some("v"), &Record::new().with("v", 0.5f64));
        assert_eq!(acc.finish(), Scalar::Float(1.5));

        let mut acc = Accumulator::new(AggFn::Sum);
        acc.push(Some("v"), &Record::new().with("v", i64::MAX));
        acc.push(Some("v"), &Record::new().with("v", 1i64));
        assert!(matches!(acc.finish(), Scalar::Float(_)));
    }

    #[test]
    fn extremes_skip_nulls() {
        assert_eq!(run(agg(AggFn::Min, Some("v"))), Scalar::Int(1));
        assert_eq!(run(agg(AggFn::Max, Some("s"))), Scalar::from("c"));
        assert_eq!(run(agg(AggFn::Max, Some("missing"))), Scalar::Null);
    }

    #[test]
    fn extremes_compare_ints_and_floats_by_value() {
        let mut lo = Accumulator::new(AggFn::Min);
        let mut hi = Accumulator::new(AggFn::Max);
        for price in [Scalar::Int(3), Scalar::Float(2.5), Scalar::Int(10)] {
            let row = Record::new().with("price", price);
            lo.push(Some("price"), &row);
            hi.push(Some("price"), &row);
        }
        assert!(matches!(lo.finish(), Scalar::Float(v) if v == 2.5));
        assert!(matches!(hi.finish(), Scalar::Int(10)));
    }

    #[test]
    fn collect_keeps_row_order() {
        assert_eq!(
            run(agg(AggFn::Collect, Some("v"))),
            Scalar::List(vec![Scalar::Int(3), Scalar::Int(1), Scalar::Null])
        );
    }
}
