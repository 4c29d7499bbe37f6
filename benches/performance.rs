use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lazyq::exec::Engine;
use lazyq::planner::plan_yaml;
use lazyq::prelude::*;

fn keys(n: usize, distinct: usize) -> Vec<i64> {
    (0..n as i64)
        .map(|i| (i * 7_919) % distinct as i64)
        .collect()
}

fn words(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let w = format!("word-{}", i % 97);
            if i % 2 == 0 {
                w.to_uppercase()
            } else {
                w
            }
        })
        .collect()
}

fn bench_order_by(c: &mut Criterion) {
    let xs: Vec<(i64, i64)> = keys(10_000, 1_000)
        .into_iter()
        .zip(keys(10_000, 37))
        .collect();
    c.bench_function("order_by_then_by", |b| {
        b.iter(|| {
            (&xs)
                .order_by(|p| p.0)
                .then_by_descending(|p| p.1)
                .to_vec()
                .unwrap()
        })
    });
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by");
    for distinct in [16usize, 256] {
        let xs = keys(10_000, distinct);
        group.bench_with_input(BenchmarkId::new("hashed", distinct), &xs, |b, xs| {
            b.iter(|| xs.group_by(|x| *x).count().unwrap())
        });
        group.bench_with_input(BenchmarkId::new("scanned", distinct), &xs, |b, xs| {
            b.iter(|| {
                xs.group_by_with(|x| *x, equality_fn(|a: &i64, b: &i64| a == b))
                    .count()
                    .unwrap()
            })
        });
    }
    group.finish();

    let ws = words(5_000);
    c.bench_function("group_by_ignore_ascii_case", |b| {
        b.iter(|| {
            (&ws)
                .group_by_with(|w| w.clone(), IgnoreAsciiCase)
                .count()
                .unwrap()
        })
    });
}

fn bench_set_ops(c: &mut Criterion) {
    let xs = keys(20_000, 5_000);
    let ys = keys(5_000, 2_500);
    let mut group = c.benchmark_group("set_ops");
    group.bench_function("except", |b| {
        b.iter(|| (&xs).except(&ys).count().unwrap())
    });
    group.bench_function("intersect", |b| {
        b.iter(|| (&xs).intersect(&ys).count().unwrap())
    });
    group.bench_function("union", |b| {
        b.iter(|| (&xs).union(&ys).count().unwrap())
    });
    group.bench_function("exclusive", |b| {
        b.iter(|| (&xs).exclusive(&ys).count().unwrap())
    });
    group.bench_function("distinct_scanned", |b| {
        b.iter(|| {
            (&ys)
                .distinct_with(equality_fn(|a: &i64, b: &i64| a == b))
                .count()
                .unwrap()
        })
    });
    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let outer = keys(2_000, 500);
    let inner = keys(500, 500);
    c.bench_function("join", |b| {
        b.iter(|| {
            (&outer)
                .join(&inner, |x| *x, |y| *y, |x, y| x + y)
                .count()
                .unwrap()
        })
    });
    c.bench_function("group_join", |b| {
        b.iter(|| {
            (&outer)
                .group_join(&inner, |x| *x, |y| *y, |x, ys| x + ys.len() as i64)
                .count()
                .unwrap()
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let plan = plan_yaml(
        r#"
sources: [ { name: events } ]
steps:
  - { op: scan, source: events }
  - op: group_by
    field: user
    aggregates: [ { func: count }, { func: sum, field: value } ]
  - { op: order_by, field: sum_value, descending: true }
  - { op: take, count: 10 }
"#,
    )
    .unwrap();
    let rows: Vec<Record> = keys(10_000, 300)
        .into_iter()
        .enumerate()
        .map(|(i, user)| {
            Record::new()
                .with("user", user)
                .with("value", (i % 10) as i64)
        })
        .collect();
    let mut engine = Engine::new(EngineConfig::default());
    engine.register("events", rows).unwrap();
    c.bench_function("pipeline_group_order_take", |b| {
        b.iter(|| black_box(engine.run(&plan).unwrap().records.len()))
    });
}

criterion_group!(
    benches,
    bench_order_by,
    bench_group_by,
    bench_set_ops,
    bench_join,
    bench_pipeline
);
criterion_main!(benches);
