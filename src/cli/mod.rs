//! aq-train CLI module
//!
//! Command-line interface for training, prediction and data inspection.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::data::{load_and_clean, CleaningConfig};
use crate::evaluation::MetricsReport;
use crate::export::{ModelRegistry, ModelVersion};
use crate::inference::InferenceAdapter;
use crate::pipeline::TrainingPipeline;
use crate::presets;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "aq-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and query air-quality regression models")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model and register the (model, scaler) pair
    Train {
        /// Built-in configuration (health, weather)
        #[arg(long, conflicts_with = "config")]
        preset: Option<String>,

        /// JSON pipeline configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input CSV (overrides the configured path)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Registry directory (overrides the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model name in the registry
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Predict one feature row with a registered model
    Predict {
        /// Registry directory
        #[arg(short, long)]
        registry: PathBuf,

        /// Model name
        #[arg(short, long)]
        name: String,

        /// Version (latest when omitted)
        #[arg(short, long)]
        version: Option<String>,

        /// Comma-separated feature values, in schema order
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        features: Vec<f64>,
    },

    /// List the versions and schema of a registered model
    Inspect {
        #[arg(short, long)]
        registry: PathBuf,

        #[arg(short, long)]
        name: String,
    },

    /// Clean a dataset and summarize what remains
    InspectData {
        #[arg(short, long)]
        data: PathBuf,

        /// Use a preset's cleaning options (health, weather)
        #[arg(long)]
        preset: Option<String>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

fn resolve_config(preset: Option<&str>, config: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match (preset, config) {
        (Some(p), None) => Ok(presets::by_name(p)?),
        (None, Some(path)) => Ok(PipelineConfig::from_file(path)?),
        (None, None) => anyhow::bail!("either --preset or --config is required"),
        (Some(_), Some(_)) => anyhow::bail!("--preset and --config are mutually exclusive"),
    }
}

fn print_metrics(metrics: &MetricsReport) {
    println!(
        "  {:<36} {:>10} {:>10} {:>10} {:>8}",
        muted("target"),
        muted("MSE"),
        muted("RMSE"),
        muted("MAE"),
        muted("R²")
    );
    for (target, m) in metrics.iter() {
        println!(
            "  {:<36} {:>10.4} {:>10.4} {:>10.4} {:>8.4}",
            target, m.mse, m.rmse, m.mae, m.r2
        );
    }
}

pub fn cmd_train(
    preset: Option<&str>,
    config_path: Option<&Path>,
    data: Option<&Path>,
    output: Option<&Path>,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let mut config = resolve_config(preset, config_path)?;
    if let Some(path) = data {
        config = config.with_data_path(path);
    }
    if let Some(dir) = output {
        config = config.with_registry_dir(dir);
    }
    if let Some(n) = name {
        config = config.with_name(n);
    }

    section(&format!("Train {}", config.name));
    let pipeline = TrainingPipeline::new(config)?;

    step_run("Loading and cleaning data");
    let start = Instant::now();
    let dataset = pipeline.load()?;
    step_done(&format!("{} rows in {:?}", dataset.height(), start.elapsed()));

    step_run(&format!("Searching {} candidates", pipeline.config().training.grid.len()));
    let start = Instant::now();
    let trained = pipeline.fit(&dataset)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run("Registering artifact pair");
    let run = pipeline.persist(trained)?;
    step_done(&run.registered.paths.model.display().to_string());
    let report = &run.report;

    section("Result");
    kv("Version", &run.registered.entry.version.to_string());
    kv("Best params", &report.best_params.to_string());
    kv("CV score", &format!("{:.4} (neg MSE)", report.best_cv_score));
    kv("Rows", &format!("{} train / {} test", report.n_train, report.n_test));
    println!();
    print_metrics(&report.metrics);
    println!();
    Ok(())
}

pub fn cmd_predict(registry: &Path, name: &str, version: Option<&str>, features: &[f64]) -> anyhow::Result<()> {
    let registry = ModelRegistry::open(registry)?;
    let pair = match version {
        Some(v) => registry.load_version(name, &ModelVersion::parse(v)?)?,
        None => registry.load_latest(name)?,
    };
    let version = pair.metadata().version;
    let adapter = InferenceAdapter::new(Arc::new(pair));
    let prediction = adapter.predict_named(features)?;

    section(&format!("Predict {} v{}", name, version));
    for (target, value) in prediction.iter() {
        kv(target, &format!("{:.4}", value));
    }
    println!();
    Ok(())
}

pub fn cmd_inspect(registry: &Path, name: &str) -> anyhow::Result<()> {
    let registry = ModelRegistry::open(registry)?;
    let latest = registry.latest(name)?;

    section(&format!("Model {}", name));
    let versions: Vec<String> = registry.list_versions(name).iter().map(|v| v.to_string()).collect();
    kv("Versions", &versions.join(", "));
    kv("Latest", &latest.version.to_string());
    kv("Pair id", &latest.pair_id.to_string());
    kv("Params", &latest.params.to_string());
    kv("CV score", &format!("{:.4}", latest.cv_score));
    kv("Registered", &latest.registered_at.to_rfc3339());

    println!();
    println!("  {}", muted("features"));
    for (i, f) in latest.features.iter().enumerate() {
        println!("  {:>3}  {}", dim(&i.to_string()), f);
    }
    println!("  {}", muted("targets"));
    for (i, t) in latest.targets.iter().enumerate() {
        println!("  {:>3}  {}", dim(&i.to_string()), t);
    }
    println!();
    Ok(())
}

pub fn cmd_inspect_data(data: &Path, preset: Option<&str>) -> anyhow::Result<()> {
    let cleaning = match preset {
        Some(p) => presets::by_name(p)?.data.cleaning,
        None => CleaningConfig::default(),
    };

    section("Inspect data");
    step_run("Loading and cleaning");
    let start = Instant::now();
    let dataset = load_and_clean(data, &cleaning)?;
    step_done(&format!("{} rows in {:?}", dataset.height(), start.elapsed()));

    println!();
    println!(
        "  {:<48} {:>12} {:>12} {:>12}",
        muted("column"),
        muted("min"),
        muted("max"),
        muted("mean")
    );
    for col in dataset.summary()? {
        println!("  {:<48} {:>12.3} {:>12.3} {:>12.3}", col.name, col.min, col.max, col.mean);
    }
    println!();
    Ok(())
}
