//! lazyq CLI: run, validate, and explain YAML record pipelines.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use lazyq_core::config::EngineConfig;
use lazyq_exec::Engine;
use lazyq_planner::{explain, plan_yaml, Plan, PipelineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lazyq")]
#[command(about = "Deferred LINQ-style queries over JSON record sources", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. `info`, `lazyq_exec=trace`)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline and print the resulting rows as JSON
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Rows for a declared source, as `name=file.json` (repeatable)
        #[arg(short, long = "source", value_parser = parse_source_arg)]
        sources: Vec<(String, PathBuf)>,

        /// Write rows here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the run summary to stderr as JSON
        #[arg(long)]
        summary: bool,

        /// Compare keys by scanning instead of hashing (overrides config)
        #[arg(long)]
        no_hash_fast_path: bool,

        /// Reject sources with more rows than this (overrides config)
        #[arg(long)]
        max_source_rows: Option<usize>,

        /// Emit one metrics event per step (overrides config)
        #[arg(long)]
        trace_steps: bool,
    },

    /// Validate a pipeline YAML file
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the validated stages of a pipeline
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Print the plan as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Flags that take precedence over both the environment and the pipeline.
#[derive(Debug, Default)]
struct Overrides {
    no_hash_fast_path: bool,
    max_source_rows: Option<usize>,
    trace_steps: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Run {
            pipeline,
            sources,
            output,
            summary,
            no_hash_fast_path,
            max_source_rows,
            trace_steps,
        } => {
            let overrides = Overrides {
                no_hash_fast_path,
                max_source_rows,
                trace_steps,
            };
            run_pipeline(&pipeline, &sources, output.as_deref(), summary, &overrides)?;
        }
        Commands::Validate { pipeline } => {
            let plan = load_plan(&pipeline).context("validation failed")?;
            println!(
                "pipeline is valid: {} stage(s) over {}",
                plan.stages.len(),
                plan.referenced_sources().join(", ")
            );
        }
        Commands::Explain { pipeline, json } => {
            let plan = load_plan(&pipeline)?;
            if json {
                println!("{}", plan.to_json_pretty()?);
            } else {
                print!("{}", explain(&plan));
            }
        }
    }
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_source_arg(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected `name=file.json`, got `{arg}`")),
    }
}

fn load_plan(path: &Path) -> anyhow::Result<Plan> {
    let yaml = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(plan_yaml(&yaml)?)
}

/// Environment, then the pipeline's `config:` block, then flags.
fn effective_config(doc: &PipelineConfig, overrides: &Overrides) -> EngineConfig {
    let mut cfg = EngineConfig::from_env();
    doc.apply(&mut cfg);
    if overrides.no_hash_fast_path {
        cfg.hash_fast_path = false;
    }
    if let Some(limit) = overrides.max_source_rows {
        cfg.max_source_rows = Some(limit);
    }
    if overrides.trace_steps {
        cfg.trace_steps = true;
    }
    cfg
}

fn run_pipeline(
    pipeline_path: &Path,
    sources: &[(String, PathBuf)],
    output: Option<&Path>,
    print_summary: bool,
    overrides: &Overrides,
) -> anyhow::Result<()> {
    let plan = load_plan(pipeline_path)?;
    for (name, _) in sources {
        if plan.source(name).is_none() {
            bail!("--source {name}: the pipeline declares no such source");
        }
    }

    let cfg = effective_config(&plan.config, overrides);
    tracing::info!(?cfg, pipeline = %pipeline_path.display(), "running pipeline");

    let base_dir = pipeline_path.parent().unwrap_or_else(|| Path::new("."));
    let mut engine = Engine::new(cfg).with_base_dir(base_dir);
    for (name, path) in sources {
        engine.register_json_file(name.clone(), path)?;
    }

    let out = engine.run(&plan)?;
    let rows = serde_json::to_string_pretty(&out.records)?;
    match output {
        Some(path) => {
            fs::write(path, rows + "\n").with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{rows}"),
    }

    if print_summary {
        eprintln!("{}", out.summary.to_json_pretty()?);
    } else {
        eprintln!(
            "{} row(s) in {}ms ({:?} keys)",
            out.summary.rows_out,
            out.summary.elapsed_ms(),
            out.summary.key_path
        );
    }
    Ok(())
}
