//! Plan lowering: one boxed record sequence per stage, each wrapping the
//! previous one.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use lazyq_core::comparer::EqualityComparer;
use lazyq_core::sequence::Sequence;
use lazyq_core::terminal::SequenceExt;
use lazyq_core::types::{Record, Scalar, TypeTag};
use lazyq_operators::{InnerMatch, QueryExt, TypeFilter};
use lazyq_planner::{Aggregate, JoinMode, SetOp, Stage};

use crate::aggregate;
use crate::runtime::ExecError;

/// The lowered form of every stage.
pub type RecordSeq = Box<dyn Sequence<Item = Record>>;

/// Loaded rows by source name.
pub type SourceRows = BTreeMap<String, Arc<Vec<Record>>>;

/// Plain value equality that does not identify as the default comparer,
/// so every keyed stage using it resolves keys by scanning.
#[derive(Debug, Clone, Copy, Default)]
pub struct Structural;

impl<T: PartialEq + ?Sized> EqualityComparer<T> for Structural {
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Comparers usable for both field keys and whole records.
pub trait RecordComparer:
    EqualityComparer<Scalar> + EqualityComparer<Record> + Clone + 'static
{
}

impl<C> RecordComparer for C where
    C: EqualityComparer<Scalar> + EqualityComparer<Record> + Clone + 'static
{
}

fn boxed<S: Sequence<Item = Record> + 'static>(seq: S) -> RecordSeq {
    Box::new(seq)
}

pub(crate) fn open_source(sources: &SourceRows, name: &str) -> Result<RecordSeq, ExecError> {
    let rows = sources
        .get(name)
        .ok_or_else(|| ExecError::MissingSource(name.to_string()))?;
    Ok(boxed(Arc::clone(rows)))
}

fn field_of(field: &str) -> impl Fn(&Record) -> Scalar + 'static {
    let field = field.to_string();
    move |row: &Record| row.get(&field).clone()
}

fn tag_of(field: &str) -> impl Fn(&Record) -> TypeTag + 'static {
    let field = field.to_string();
    move |row: &Record| row.get(&field).type_tag()
}

/// Outer fields as-is, inner fields under `{source}.{field}`.
fn merge(outer: &Record, inner: &Record, source: &str) -> Record {
    let mut out = outer.clone();
    for (field, value) in inner.fields() {
        out.insert(format!("{source}.{field}"), value.clone());
    }
    out
}

/// Counts rows as they pass; the counter is shared with the run summary.
pub(crate) fn counted(seq: RecordSeq, counter: Rc<Cell<usize>>) -> RecordSeq {
    boxed(seq.map(move |row: Record| {
        counter.set(counter.get() + 1);
        row
    }))
}

pub(crate) fn lower_stage<C: RecordComparer>(
    seq: RecordSeq,
    stage: &Stage,
    sources: &SourceRows,
    comparer: &C,
) -> Result<RecordSeq, ExecError> {
    let cmp = comparer.clone();
    Ok(match stage {
        Stage::OrderBy { keys } => {
            let mut keys = keys.iter();
            let Some(first) = keys.next() else {
                return Ok(seq);
            };
            let mut ordered = if first.descending {
                seq.order_by_descending(field_of(&first.field))
            } else {
                seq.order_by(field_of(&first.field))
            };
            for key in keys {
                ordered = if key.descending {
                    ordered.then_by_descending(field_of(&key.field))
                } else {
                    ordered.then_by(field_of(&key.field))
                };
            }
            boxed(ordered)
        }

        Stage::Distinct { field: None } => boxed(seq.distinct_with(cmp)),
        Stage::Distinct { field: Some(f) } => boxed(seq.distinct_by_with(field_of(f), cmp)),

        Stage::SetOp { op, source, field } => {
            let other = open_source(sources, source)?;
            match (op, field) {
                (SetOp::Except, None) => boxed(seq.except_with(other, cmp)),
                (SetOp::Except, Some(f)) => boxed(seq.except_by_with(other, field_of(f), cmp)),
                (SetOp::Intersect, None) => boxed(seq.intersect_with(other, cmp)),
                (SetOp::Intersect, Some(f)) => {
                    boxed(seq.intersect_by_with(other, field_of(f), cmp))
                }
                (SetOp::Union, None) => boxed(seq.union_with(other, cmp)),
                (SetOp::Union, Some(f)) => boxed(seq.union_by_with(other, field_of(f), cmp)),
                (SetOp::Exclusive, None) => boxed(seq.exclusive_with(other, cmp)),
                (SetOp::Exclusive, Some(f)) => {
                    boxed(seq.exclusive_by_with(other, field_of(f), cmp))
                }
            }
        }

        Stage::GroupBy { field, aggregates } => {
            let seed_aggs: Arc<[Aggregate]> = aggregates.clone().into();
            let fold_aggs = Arc::clone(&seed_aggs);
            let out_aggs = Arc::clone(&seed_aggs);
            let key_field = field.clone();
            let grouped = seq.aggregate_by_with(
                field_of(field),
                move |_key: &Scalar| aggregate::start(&seed_aggs),
                move |accs: Vec<aggregate::Accumulator>, row: Record| {
                    aggregate::fold(&fold_aggs, accs, &row)
                },
                cmp,
            );
            boxed(grouped.map(move |(key, accs)| {
                let mut out = Record::new().with(key_field.clone(), key);
                aggregate::finish_into(&out_aggs, accs, &mut out);
                out
            }))
        }

        Stage::Join {
            source,
            left,
            right,
            mode,
        } => {
            let inner = open_source(sources, source)?;
            let prefix = source.clone();
            let mode = match mode {
                JoinMode::Every => InnerMatch::Every,
                JoinMode::Once => InnerMatch::Once,
            };
            boxed(seq.join_with_mode(
                inner,
                field_of(left),
                field_of(right),
                move |outer: &Record, inner: &Record| merge(outer, inner, &prefix),
                cmp,
                mode,
            ))
        }

        Stage::GroupJoin {
            source,
            left,
            right,
            aggregates,
        } => {
            let inner = open_source(sources, source)?;
            let aggs = aggregates.clone();
            boxed(seq.group_join_with(
                inner,
                field_of(left),
                field_of(right),
                move |outer: Record, bucket: &[Record]| {
                    let accs = bucket
                        .iter()
                        .fold(aggregate::start(&aggs), |accs, row| {
                            aggregate::fold(&aggs, accs, row)
                        });
                    let mut out = outer;
                    aggregate::finish_into(&aggs, accs, &mut out);
                    out
                },
                cmp,
            ))
        }

        Stage::OfType { field, tag } => {
            boxed(seq.of_type_by(tag_of(field), TypeFilter::from(*tag)))
        }

        Stage::Take { count } => boxed(seq.take(*count)),
    })
}

#[cfg(test)]
mod tests {
    use lazyq_core::comparer::DefaultEquality;
    use lazyq_operators::{KeyIndex, MembershipPath};
    use lazyq_planner::{AggFn, SortKey};

    use super::*;

    fn people() -> Vec<Record> {
        vec![
            Record::new().with("id", 1i64).with("name", "ann").with("age", 30i64),
            Record::new().with("id", 2i64).with("name", "bob").with("age", 25i64),
            Record::new().with("id", 3i64).with("name", "cy").with("age", 30i64),
        ]
    }

    fn pets() -> Vec<Record> {
        vec![
            Record::new().with("owner", 1i64).with("pet", "rex"),
            Record::new().with("owner", 3i64).with("pet", "tom"),
            Record::new().with("owner", 1i64).with("pet", "kit"),
        ]
    }

    fn sources() -> SourceRows {
        let mut s = SourceRows::new();
        s.insert("people".into(), Arc::new(people()));
        s.insert("pets".into(), Arc::new(pets()));
        s
    }

    fn run_stage<C: RecordComparer>(stage: Stage, cmp: C) -> Vec<Record> {
        let srcs = sources();
        let seq = open_source(&srcs, "people").unwrap();
        lower_stage(seq, &stage, &srcs, &cmp).unwrap().to_vec().unwrap()
    }

    fn names(rows: &[Record]) -> Vec<String> {
        rows.iter().map(|r| r.get("name").to_string()).collect()
    }

    #[test]
    fn structural_comparer_scans() {
        let index: KeyIndex<Scalar, _> = KeyIndex::new(Structural);
        assert_eq!(index.path(), MembershipPath::Scanned);
        let index: KeyIndex<Scalar, _> = KeyIndex::new(DefaultEquality);
        assert_eq!(index.path(), MembershipPath::Hashed);
    }

    #[test]
    fn multi_key_order() {
        let stage = Stage::OrderBy {
            keys: vec![
                SortKey { field: "age".into(), descending: true },
                SortKey { field: "name".into(), descending: false },
            ],
        };
        assert_eq!(names(&run_stage(stage, DefaultEquality)), vec!["ann", "cy", "bob"]);
    }

    #[test]
    fn group_by_emits_key_and_aggregates() {
        let stage = Stage::GroupBy {
            field: "age".into(),
            aggregates: vec![
                Aggregate { func: AggFn::Count, field: None, alias: "n".into() },
                Aggregate { func: AggFn::Collect, field: Some("name".into()), alias: "who".into() },
            ],
        };
        for rows in [
            run_stage(stage.clone(), DefaultEquality),
            run_stage(stage, Structural),
        ] {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].get("age"), &Scalar::Int(30));
            assert_eq!(rows[0].get("n"), &Scalar::Int(2));
            assert_eq!(
                rows[0].get("who"),
                &Scalar::List(vec![Scalar::from("ann"), Scalar::from("cy")])
            );
            assert_eq!(rows[1].get("n"), &Scalar::Int(1));
        }
    }

    #[test]
    fn join_prefixes_inner_fields() {
        let stage = Stage::Join {
            source: "pets".into(),
            left: "id".into(),
            right: "owner".into(),
            mode: JoinMode::Every,
        };
        let rows = run_stage(stage, DefaultEquality);
        let pairs: Vec<(String, String)> = rows
            .iter()
            .map(|r| (r.get("name").to_string(), r.get("pets.pet").to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("ann".to_string(), "rex".to_string()),
                ("ann".to_string(), "kit".to_string()),
                ("cy".to_string(), "tom".to_string()),
            ]
        );
    }

    #[test]
    fn group_join_aggregates_each_bucket() {
        let stage = Stage::GroupJoin {
            source: "pets".into(),
            left: "id".into(),
            right: "owner".into(),
            aggregates: vec![Aggregate { func: AggFn::Count, field: None, alias: "pets".into() }],
        };
        let rows = run_stage(stage, Structural);
        let counts: Vec<&Scalar> = rows.iter().map(|r| r.get("pets")).collect();
        assert_eq!(counts, vec![&Scalar::Int(2), &Scalar::Int(0), &Scalar::Int(1)]);
    }

    fn price_sources() -> SourceRows {
        let mut s = SourceRows::new();
        s.insert(
            "prices".into(),
            Arc::new(vec![
                Record::new().with("sku", "a").with("price", 3i64),
                Record::new().with("sku", "b").with("price", 2.5f64),
                Record::new().with("sku", "c").with("price", 10i64),
                Record::new().with("sku", "d").with("price", 1.0f64),
            ]),
        );
        s.insert(
            "tiers".into(),
            Arc::new(vec![Record::new().with("level", 1i64).with("label", "basic")]),
        );
        s
    }

    fn run_prices<C: RecordComparer>(stage: Stage, cmp: C) -> Vec<Record> {
        let srcs = price_sources();
        let seq = open_source(&srcs, "prices").unwrap();
        lower_stage(seq, &stage, &srcs, &cmp).unwrap().to_vec().unwrap()
    }

    #[test]
    fn mixed_numbers_order_and_match_by_value() {
        let order = Stage::OrderBy {
            keys: vec![SortKey { field: "price".into(), descending: false }],
        };
        let min = Stage::GroupBy {
            field: "none".into(),
            aggregates: vec![
                Aggregate { func: AggFn::Min, field: Some("price".into()), alias: "lo".into() },
                Aggregate { func: AggFn::Max, field: Some("price".into()), alias: "hi".into() },
            ],
        };
        let join = Stage::Join {
            source: "tiers".into(),
            left: "price".into(),
            right: "level".into(),
            mode: JoinMode::Every,
        };
        for hashed in [true, false] {
            let run = |stage: Stage| {
                if hashed {
                    run_prices(stage, DefaultEquality)
                } else {
                    run_prices(stage, Structural)
                }
            };
            let sorted: Vec<String> =
                run(order.clone()).iter().map(|r| r.get("price").to_string()).collect();
            assert_eq!(sorted, vec!["1", "2.5", "3", "10"]);

            let extremes = run(min.clone());
            assert_eq!(extremes[0].get("lo"), &Scalar::Float(1.0));
            assert_eq!(extremes[0].get("hi"), &Scalar::Int(10));

            let joined = run(join.clone());
            assert_eq!(joined.len(), 1);
            assert_eq!(joined[0].get("sku"), &Scalar::from("d"));
            assert_eq!(joined[0].get("tiers.label"), &Scalar::from("basic"));
        }
    }

    #[test]
    fn missing_source_is_reported() {
        let srcs = sources();
        let seq = open_source(&srcs, "people").unwrap();
        let stage = Stage::SetOp {
            op: SetOp::Union,
            source: "ghosts".into(),
            field: None,
        };
        let err = lower_stage(seq, &stage, &srcs, &DefaultEquality).err().unwrap();
        assert!(matches!(err, ExecError::MissingSource(ref n) if n == "ghosts"));
    }

    #[test]
    fn counted_tracks_rows() {
        let counter = Rc::new(Cell::new(0));
        let srcs = sources();
        let seq = counted(open_source(&srcs, "people").unwrap(), Rc::clone(&counter));
        let seq = lower_stage(seq, &Stage::Take { count: 2 }, &srcs, &DefaultEquality).unwrap();
        assert_eq!(seq.count().unwrap(), 2);
        assert_eq!(counter.get(), 2);
    }
}
