//! YAML pipelines end to end: planning, loading, running, and reporting.

use std::fs;
use std::path::PathBuf;

use lazyq_core::prelude::*;
use lazyq_exec::{Engine, ExecError, KeyPath};
use lazyq_planner::{explain, plan_yaml, JoinMode, PlanError, Stage};

fn person(id: i64, name: &str, age: i64, city: &str) -> Record {
    Record::new()
        .with("id", id)
        .with("name", name)
        .with("age", age)
        .with("city", city)
}

fn pet(owner: i64, name: &str) -> Record {
    Record::new().with("owner", owner).with("name", name)
}

fn people() -> Vec<Record> {
    vec![
        person(1, "ann", 41, "oslo"),
        person(2, "bob", 19, "rome"),
        person(3, "cy", 33, "oslo"),
        person(1, "ann-again", 41, "lima"),
    ]
}

fn pets() -> Vec<Record> {
    vec![pet(1, "rex"), pet(2, "tom"), pet(2, "kit"), pet(9, "stray")]
}

fn engine(cfg: EngineConfig) -> Engine {
    let mut engine = Engine::new(cfg);
    engine.register("people", people()).unwrap();
    engine.register("pets", pets()).unwrap();
    engine
}

fn scanned() -> EngineConfig {
    EngineConfig {
        hash_fast_path: false,
        ..EngineConfig::default()
    }
}

fn strings(rows: &[Record], field: &str) -> Vec<String> {
    rows.iter().map(|r| r.get(field).to_string()).collect()
}

/// A fresh directory under the system temp dir, unique per test and process.
fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lazyq-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

const JOIN_ONCE: &str = r#"
sources: [ { name: people }, { name: pets } ]
steps:
  - { op: scan, source: people }
  - { op: join, source: pets, left: id, right: owner, mode: once }
"#;

#[test]
fn joins_prefix_inner_fields_and_honor_the_mode() {
    let every = plan_yaml(&JOIN_ONCE.replace(", mode: once", "")).unwrap();
    let out = engine(EngineConfig::default()).run(&every).unwrap();
    assert_eq!(
        strings(&out.records, "pets.name"),
        vec!["rex", "tom", "kit", "rex"]
    );
    assert_eq!(out.records[0].get("name"), &Scalar::from("ann"));

    let once = plan_yaml(JOIN_ONCE).unwrap();
    assert!(matches!(
        once.stages[0],
        Stage::Join {
            mode: JoinMode::Once,
            ..
        }
    ));
    let out = engine(EngineConfig::default()).run(&once).unwrap();
    assert_eq!(strings(&out.records, "pets.name"), vec!["rex", "tom", "kit"]);
    assert_eq!(strings(&out.records, "name"), vec!["ann", "bob", "bob"]);
}

#[test]
fn grouping_with_aggregates() {
    let plan = plan_yaml(
        r#"
sources: [ { name: people } ]
steps:
  - { op: scan, source: people }
  - op: group_by
    field: city
    aggregates:
      - { func: count }
      - { func: sum, field: age, as: years }
      - { func: collect, field: name }
      - { func: min, field: age }
  - { op: order_by, field: count, descending: true }
"#,
    )
    .unwrap();

    let hashed = engine(EngineConfig::default()).run(&plan).unwrap();
    let scanned = engine(scanned()).run(&plan).unwrap();
    assert_eq!(hashed.records, scanned.records);
    assert_eq!(scanned.summary.key_path, KeyPath::Scanned);

    let oslo = &hashed.records[0];
    assert_eq!(oslo.get("city"), &Scalar::from("oslo"));
    assert_eq!(oslo.get("count"), &Scalar::Int(2));
    assert_eq!(oslo.get("years"), &Scalar::Int(74));
    assert_eq!(oslo.get("min_age"), &Scalar::Int(33));
    assert_eq!(
        oslo.get("collect_name"),
        &Scalar::List(vec![Scalar::from("ann"), Scalar::from("cy")])
    );
    // Ties on count keep first-seen group order.
    assert_eq!(strings(&hashed.records, "city"), vec!["oslo", "rome", "lima"]);
}

#[test]
fn group_join_gives_every_outer_row_a_result() {
    let plan = plan_yaml(
        r#"
sources: [ { name: people }, { name: pets } ]
steps:
  - { op: scan, source: people }
  - op: group_join
    source: pets
    left: id
    right: owner
    aggregates: [ { func: count, as: pets }, { func: max, field: name } ]
"#,
    )
    .unwrap();
    let out = engine(EngineConfig::default()).run(&plan).unwrap();
    assert_eq!(out.records.len(), people().len());
    let counts: Vec<&Scalar> = out.records.iter().map(|r| r.get("pets")).collect();
    assert_eq!(
        counts,
        vec![&Scalar::Int(1), &Scalar::Int(2), &Scalar::Int(0), &Scalar::Int(1)]
    );
    assert_eq!(out.records[1].get("max_name"), &Scalar::from("tom"));
    assert_eq!(out.records[2].get("max_name"), &Scalar::Null);
}

#[test]
fn set_steps_and_type_filters() {
    let mut engine = engine(EngineConfig::default());
    engine
        .register(
            "mixed",
            vec![
                Record::new().with("v", 1i64),
                Record::new().with("v", "one"),
                Record::new().with("v", 2.5f64),
                Record::new().with("v", Scalar::Null),
                Record::new().with("v", 1i64),
            ],
        )
        .unwrap();
    engine
        .register("seen", vec![Record::new().with("v", 2.5f64)])
        .unwrap();

    let plan = plan_yaml(
        r#"
sources: [ { name: mixed }, { name: seen } ]
steps:
  - { op: scan, source: mixed }
  - { op: of_type, field: v, type: number }
  - { op: distinct }
  - { op: except, source: seen, field: v }
"#,
    )
    .unwrap();
    let out = engine.run(&plan).unwrap();
    assert_eq!(out.records, vec![Record::new().with("v", 1i64)]);
    let steps: Vec<(&str, usize)> = out
        .summary
        .stages
        .iter()
        .map(|s| (s.stage.as_str(), s.rows))
        .collect();
    assert_eq!(
        steps,
        vec![("scan", 5), ("of_type", 3), ("distinct", 2), ("except", 1)]
    );

    let exclusive = plan_yaml(
        r#"
sources: [ { name: mixed }, { name: seen } ]
steps:
  - { op: scan, source: seen }
  - { op: exclusive, source: mixed, field: v }
"#,
    )
    .unwrap();
    let out = engine.run(&exclusive).unwrap();
    assert_eq!(
        out.records,
        vec![
            Record::new().with("v", 1i64),
            Record::new().with("v", "one"),
            Record::new().with("v", Scalar::Null),
        ]
    );
}

#[test]
fn json_numbers_compare_by_value() {
    let dir = scratch_dir("numbers");
    fs::write(
        dir.join("prices.json"),
        r#"[{"sku": "a", "price": 3}, {"sku": "b", "price": 2.5}, {"sku": "c", "price": 10}, {"sku": "d", "price": 1.0}]"#,
    )
    .unwrap();
    let plan = plan_yaml(
        r#"
sources: [ { name: prices } ]
steps:
  - { op: scan, source: prices }
  - { op: order_by, field: price }
"#,
    )
    .unwrap();
    let summary = plan_yaml(
        r#"
sources: [ { name: prices } ]
steps:
  - { op: scan, source: prices }
  - op: group_by
    field: none
    aggregates: [ { func: min, field: price }, { func: max, field: price } ]
"#,
    )
    .unwrap();
    let join = plan_yaml(
        r#"
sources: [ { name: prices }, { name: tiers } ]
steps:
  - { op: scan, source: prices }
  - { op: join, source: tiers, left: price, right: level }
"#,
    )
    .unwrap();

    for cfg in [EngineConfig::default(), scanned()] {
        let mut engine = Engine::new(cfg);
        engine.register_json_file("prices", dir.join("prices.json")).unwrap();
        engine
            .register("tiers", vec![Record::new().with("level", 1i64).with("label", "basic")])
            .unwrap();

        let out = engine.run(&plan).unwrap();
        assert_eq!(strings(&out.records, "sku"), vec!["d", "b", "a", "c"]);

        let out = engine.run(&summary).unwrap();
        assert_eq!(out.records[0].get("min_price"), &Scalar::Float(1.0));
        assert_eq!(out.records[0].get("max_price"), &Scalar::Int(10));

        let out = engine.run(&join).unwrap();
        assert_eq!(strings(&out.records, "sku"), vec!["d"]);
        assert_eq!(strings(&out.records, "tiers.label"), vec!["basic"]);
    }
}

#[test]
fn json_sources_resolve_against_the_base_dir() {
    let dir = scratch_dir("files");
    fs::write(
        dir.join("people.json"),
        r#"[{"name": "ann", "age": 41}, {"name": "bob", "age": 19}, {"name": "cy", "age": 33}]"#,
    )
    .unwrap();
    fs::write(dir.join("banned.json"), r#"[{"name": "cy"}]"#).unwrap();

    let plan = plan_yaml(
        r#"
sources:
  - { name: people, path: people.json }
  - { name: banned, path: banned.json }
steps:
  - { op: scan, source: people }
  - { op: except, source: banned, field: name }
  - { op: order_by, field: age }
"#,
    )
    .unwrap();

    let out = Engine::new(EngineConfig::default())
        .with_base_dir(&dir)
        .run(&plan)
        .unwrap();
    assert_eq!(strings(&out.records, "name"), vec!["bob", "ann"]);

    let summary: serde_json::Value =
        serde_json::from_str(&out.summary.to_json_pretty().unwrap()).unwrap();
    assert_eq!(summary["key_path"], "hashed");
    assert_eq!(summary["rows_out"], 2);
    assert_eq!(summary["source_rows"][0]["stage"], "people");
    assert_eq!(summary["source_rows"][1]["rows"], 1);
    assert_eq!(summary["stages"][1]["stage"], "except");
    assert!(out.summary.finished_ms >= out.summary.started_ms);

    // Registered rows win over the declared path.
    let mut engine = Engine::new(EngineConfig::default()).with_base_dir(&dir);
    engine.register("banned", Vec::new()).unwrap();
    assert_eq!(engine.run(&plan).unwrap().records.len(), 3);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn load_failures_name_the_source() {
    let dir = scratch_dir("broken");
    fs::write(dir.join("bad.json"), "{ not json").unwrap();
    let plan = plan_yaml(
        "sources: [ { name: bad, path: bad.json } ]\nsteps:\n  - { op: scan, source: bad }\n",
    )
    .unwrap();
    let err = Engine::new(EngineConfig::default())
        .with_base_dir(&dir)
        .run(&plan)
        .unwrap_err();
    assert!(matches!(err, ExecError::Load { ref name, .. } if name == "bad"));

    let capped = Engine::new(EngineConfig {
        max_source_rows: Some(2),
        ..EngineConfig::default()
    });
    fs::write(dir.join("bad.json"), "[{}, {}, {}]").unwrap();
    let err = capped.with_base_dir(&dir).run(&plan).unwrap_err();
    assert!(matches!(err, ExecError::TooManyRows { rows: 3, limit: 2, .. }));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn pipeline_config_block_merges_into_the_engine_config() {
    let plan = plan_yaml(
        r#"
config: { hash_fast_path: false, max_source_rows: 100 }
sources: [ { name: people } ]
steps:
  - { op: scan, source: people }
  - { op: distinct, field: city }
"#,
    )
    .unwrap();
    let mut cfg = EngineConfig::default();
    plan.config.apply(&mut cfg);
    assert!(!cfg.hash_fast_path);
    assert_eq!(cfg.max_source_rows, Some(100));

    let out = engine(cfg).run(&plan).unwrap();
    assert_eq!(out.summary.key_path, KeyPath::Scanned);
    assert_eq!(strings(&out.records, "city"), vec!["oslo", "rome", "lima"]);
}

#[test]
fn prepared_pipelines_run_per_session() {
    let plan = plan_yaml(
        r#"
sources: [ { name: people } ]
steps:
  - { op: scan, source: people }
  - { op: order_by, field: city }
  - { op: then_by, field: age, descending: true }
  - { op: take, count: 3 }
"#,
    )
    .unwrap();
    let seq = engine(EngineConfig::default()).prepare(&plan).unwrap();
    let first = seq.to_vec().unwrap();
    assert_eq!(strings(&first, "name"), vec!["ann-again", "ann", "cy"]);
    assert_eq!(first, seq.to_vec().unwrap());
    assert_eq!(seq.count().unwrap(), 3);
}

#[test]
fn explain_lists_every_stage() {
    let plan = plan_yaml(
        r#"
sources: [ { name: people, path: people.json }, { name: pets } ]
steps:
  - { op: scan, source: people }
  - { op: join, source: pets, left: id, right: owner, mode: once }
  - { op: order_by, field: age, descending: true }
  - { op: then_by, field: name }
  - { op: take, count: 5 }
"#,
    )
    .unwrap();
    let text = explain(&plan);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "scan people (people.json)");
    assert!(lines[1].contains("join pets on id = owner (inner rows match once)"));
    assert!(lines[2].contains("order_by age desc, name asc"));
    assert!(lines[3].contains("take 5"));

    let json: serde_json::Value = serde_json::from_str(&plan.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["stages"][0]["stage"], "join");
    assert_eq!(json["stages"][0]["mode"], "once");
}

#[test]
fn planning_errors() {
    let bad_then = plan_yaml(
        "sources: [ { name: a } ]\nsteps:\n  - { op: scan, source: a }\n  - { op: then_by, field: x }\n",
    );
    assert!(matches!(bad_then, Err(PlanError::Invalid(_))));

    let unknown = plan_yaml(
        "sources: [ { name: a } ]\nsteps:\n  - { op: scan, source: a }\n  - { op: union, source: b }\n",
    );
    assert!(matches!(unknown, Err(PlanError::UnknownSource(ref n)) if n == "b"));

    let bad_agg = plan_yaml(
        "sources: [ { name: a } ]\nsteps:\n  - { op: scan, source: a }\n  - { op: group_by, field: k, aggregates: [ { func: median, field: x } ] }\n",
    );
    assert!(matches!(bad_agg, Err(PlanError::Invalid(_))));

    let err: ExecError = plan_yaml("steps: [ { op: bogus } ]").unwrap_err().into();
    assert!(matches!(err, ExecError::Plan(PlanError::Yaml(_))));
}
