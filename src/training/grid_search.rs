//! Exhaustive hyperparameter search with k-fold cross-validation

use super::cross_validation::{CVResults, KFold};
use super::estimator::{EstimatorParams, HyperparameterGrid};
use super::multi_output::MultiOutputRegressor;
use crate::error::{PipelineError, Result};
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Cross-validated score of one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: EstimatorParams,
    /// Fold scores are negative MSE averaged over targets
    pub cv: CVResults,
    /// 1 = best; equal means share a rank
    pub rank: usize,
}

/// Result of a search, including the best candidate refit on all rows
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_index: usize,
    pub best_params: EstimatorParams,
    pub best_score: f64,
    pub candidates: Vec<CandidateResult>,
    pub model: MultiOutputRegressor,
}

/// Grid search over one estimator family
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: HyperparameterGrid,
    cv_folds: usize,
    n_jobs: Option<usize>,
}

impl GridSearch {
    pub fn new(grid: HyperparameterGrid, cv_folds: usize) -> Self {
        Self {
            grid,
            cv_folds,
            n_jobs: None,
        }
    }

    /// Bound the worker pool; None uses the global rayon pool
    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Search the grid on `(x, y)`. Any failure is reported as
    /// `TrainingFailed`.
    pub fn fit(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<SearchOutcome> {
        let outcome = match self.n_jobs {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n.max(1))
                    .build()
                    .map_err(PipelineError::training)?;
                pool.install(|| self.search(x, y))
            }
            None => self.search(x, y),
        };

        outcome.map_err(|e| match e {
            PipelineError::TrainingFailed(_) => e,
            other => PipelineError::training(other),
        })
    }

    fn search(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<SearchOutcome> {
        let start = Instant::now();
        self.grid.validate()?;
        if x.nrows() != y.nrows() {
            return Err(PipelineError::Validation(format!(
                "features have {} rows but targets have {}",
                x.nrows(),
                y.nrows()
            )));
        }

        let candidates = self.grid.candidates();
        let splits = KFold::new(self.cv_folds).split(x.nrows())?;
        let n_folds = splits.len();

        info!(
            candidates = candidates.len(),
            folds = n_folds,
            rows = x.nrows(),
            targets = y.ncols(),
            "Starting grid search"
        );

        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..n_folds).map(move |f| (c, f)))
            .collect();

        let fold_scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| -> Result<f64> {
                let split = &splits[f];
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = y.select(Axis(0), &split.train_indices);
                let x_val = x.select(Axis(0), &split.test_indices);
                let y_val = y.select(Axis(0), &split.test_indices);

                let model = MultiOutputRegressor::fit(candidates[c], &x_train, &y_train)?;
                let preds = model.predict(&x_val)?;
                Ok(-mean_squared_error(&y_val, &preds))
            })
            .collect::<Result<_>>()?;

        let mut results: Vec<CandidateResult> = candidates
            .iter()
            .zip(fold_scores.chunks(n_folds))
            .map(|(params, scores)| CandidateResult {
                params: *params,
                cv: CVResults::from_scores(scores.to_vec()),
                rank: 0,
            })
            .collect();

        let means: Vec<f64> = results.iter().map(|r| r.cv.mean_score).collect();
        if let Some(bad) = means.iter().position(|m| !m.is_finite()) {
            return Err(PipelineError::training(format!(
                "candidate {} produced a non-finite score",
                candidates[bad]
            )));
        }
        for result in results.iter_mut() {
            result.rank = 1 + means.iter().filter(|&&m| m > result.cv.mean_score).count();
        }

        // strict comparison keeps the earliest of equal scores
        let mut best_index = 0;
        for (i, &m) in means.iter().enumerate() {
            if m > means[best_index] {
                best_index = i;
            }
        }

        for result in &results {
            debug!(
                params = %result.params,
                mean = result.cv.mean_score,
                std = result.cv.std_score,
                rank = result.rank,
                "Candidate scored"
            );
        }

        let best_params = candidates[best_index];
        let best_score = means[best_index];
        let model = MultiOutputRegressor::fit(best_params, x, y)?;

        info!(
            best = %best_params,
            score = best_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Grid search finished"
        );

        Ok(SearchOutcome {
            best_index,
            best_params,
            best_score,
            candidates: results,
            model,
        })
    }
}

/// Mean squared error averaged uniformly over target columns
fn mean_squared_error(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> f64 {
    let per_target: Vec<f64> = y_true
        .columns()
        .into_iter()
        .zip(y_pred.columns())
        .map(|(t, p)| {
            let n = t.len() as f64;
            t.iter().zip(p.iter()).map(|(a, b)| (a - b).powi(2)).sum::<f64>() / n
        })
        .collect();
    per_target.iter().sum::<f64>() / per_target.len() as f64
}

/// Search `grid` with `cv_folds`-fold CV and refit the winner on all rows
pub fn train(
    x_train: &Array2<f64>,
    y_train: &Array2<f64>,
    grid: &HyperparameterGrid,
    cv_folds: usize,
) -> Result<SearchOutcome> {
    GridSearch::new(grid.clone(), cv_folds).fit(x_train, y_train)
}
