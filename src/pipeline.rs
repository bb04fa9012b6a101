//! End-to-end training run
//!
//! load → clean → frame → split → scale (train rows only) → grid search →
//! evaluate on the scaled test rows → register the (model, scaler) pair.
//! Nothing is written to the registry unless every earlier stage succeeded.

use crate::config::PipelineConfig;
use crate::data::{frame, load_and_clean, train_test_split, Dataset};
use crate::error::{PipelineError, Result};
use crate::evaluation::{evaluate, MetricsReport};
use crate::export::{ArtifactPair, ModelRegistry, RegisteredArtifact};
use crate::preprocessing::StandardScaler;
use crate::training::{CandidateResult, EstimatorParams, GridSearch};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Summary of a finished training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub name: String,
    pub rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub best_params: EstimatorParams,
    pub best_cv_score: f64,
    pub candidates: Vec<CandidateResult>,
    pub metrics: MetricsReport,
    pub elapsed_ms: u64,
}

/// A trained pair and its report, before persistence
#[derive(Debug, Clone)]
pub struct TrainedPair {
    pub pair: ArtifactPair,
    pub report: TrainingReport,
}

/// A persisted run
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub report: TrainingReport,
    pub registered: RegisteredArtifact,
    pub metrics_path: Option<PathBuf>,
}

pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the configured source and clean it
    pub fn load(&self) -> Result<Dataset> {
        let path = self
            .config
            .data
            .path
            .as_ref()
            .ok_or_else(|| PipelineError::Config("no data path configured".to_string()))?;
        load_and_clean(path, &self.config.data.cleaning)
    }

    /// Train and evaluate on an already cleaned dataset
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainedPair> {
        self.fit_inner(dataset).map_err(|e| {
            error!(error = %e, model = %self.config.name, "Training failed; no artifact written");
            e
        })
    }

    fn fit_inner(&self, dataset: &Dataset) -> Result<TrainedPair> {
        let start = Instant::now();
        let features = self.config.feature_schema()?;
        let targets = self.config.target_schema()?;
        let training = &self.config.training;

        let (x, y) = frame(dataset, &features, &targets)?;
        let split = train_test_split(&x, &y, training.test_ratio, training.seed)?;
        info!(
            rows = x.nrows(),
            train = split.x_train.nrows(),
            test = split.x_test.nrows(),
            features = features.len(),
            targets = targets.len(),
            "Dataset framed and split"
        );

        let scaler = StandardScaler::fit(&split.x_train)?;
        let x_train = scaler.transform(&split.x_train)?;
        let x_test = scaler.transform(&split.x_test)?;

        let outcome = GridSearch::new(training.grid.clone(), training.cv_folds)
            .with_n_jobs(training.n_jobs)
            .fit(&x_train, &split.y_train)?;

        let metrics = evaluate(&outcome.model, &x_test, &split.y_test, &targets)?;
        for (target, m) in metrics.iter() {
            info!(
                target = %target,
                mse = m.mse,
                rmse = m.rmse,
                mae = m.mae,
                r2 = m.r2,
                "Test metrics"
            );
        }

        let report = TrainingReport {
            name: self.config.name.clone(),
            rows: x.nrows(),
            n_train: split.x_train.nrows(),
            n_test: split.x_test.nrows(),
            best_params: outcome.best_params,
            best_cv_score: outcome.best_score,
            candidates: outcome.candidates,
            metrics,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        let pair = ArtifactPair::new(
            self.config.name.clone(),
            features,
            targets,
            outcome.model,
            scaler,
            outcome.best_score,
        )?;

        Ok(TrainedPair { pair, report })
    }

    /// Register a trained pair and optionally write `metrics.json` beside it.
    /// The report is informational, so failing to write it only logs a warning.
    pub fn persist(&self, trained: TrainedPair) -> Result<TrainingRun> {
        let mut registry = ModelRegistry::open(&self.config.output.registry_dir)?;
        let registered = registry.register(trained.pair).map_err(|e| {
            error!(
                error = %e,
                model = %self.config.name,
                mean_test_mse = trained.report.metrics.mean_mse(),
                "Saving the trained pair failed; previous versions are untouched"
            );
            e
        })?;

        let metrics_path = if self.config.output.write_metrics {
            let dir = registered
                .paths
                .model
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| registry.root().to_path_buf());
            match write_report(&dir, &trained.report) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, dir = %dir.display(), "Failed to write metrics report");
                    None
                }
            }
        } else {
            None
        };

        Ok(TrainingRun {
            report: trained.report,
            registered,
            metrics_path,
        })
    }

    /// Full run: load, train, register
    pub fn run(&self) -> Result<TrainingRun> {
        let dataset = self.load()?;
        let trained = self.fit(&dataset)?;
        self.persist(trained)
    }
}

/// Write the informational report as `metrics.json` in `dir`
pub fn write_report(dir: &Path, report: &TrainingReport) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("metrics.json");
    fs::write(&path, serde_json::to_vec_pretty(report)?)?;
    Ok(path)
}
