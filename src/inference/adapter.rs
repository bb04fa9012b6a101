//! Raw feature row in, named target values out

use crate::error::{PipelineError, Result};
use crate::export::ArtifactPair;
use crate::schema::{FeatureSchema, TargetSchema};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Batches at least this large are scaled and predicted in parallel chunks
const PARALLEL_BATCH_ROWS: usize = 1024;

/// Predicted values keyed by target name, in target-schema order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    targets: TargetSchema,
    values: Vec<f64>,
}

impl Prediction {
    /// Value of a named target
    pub fn get(&self, target: &str) -> Result<f64> {
        Ok(self.values[self.targets.index_of(target)?])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.targets
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Inference statistics snapshot
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InferenceStats {
    pub rows_predicted: u64,
    pub rejected: u64,
}

/// Stateless predictor over one artifact pair: the row is scaled with the
/// pair's own scaler and passed to the pair's model.
#[derive(Debug)]
pub struct InferenceAdapter {
    pair: Arc<ArtifactPair>,
    rows_predicted: AtomicU64,
    rejected: AtomicU64,
}

impl InferenceAdapter {
    pub fn new(pair: Arc<ArtifactPair>) -> Self {
        Self {
            pair,
            rows_predicted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn pair(&self) -> &Arc<ArtifactPair> {
        &self.pair
    }

    pub fn features(&self) -> &FeatureSchema {
        self.pair.features()
    }

    pub fn targets(&self) -> &TargetSchema {
        self.pair.targets()
    }

    fn track<T>(&self, rows: usize, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.rows_predicted.fetch_add(rows as u64, Ordering::Relaxed),
            Err(_) => self.rejected.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    /// One value per target, in target-schema order
    pub fn predict(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.track(1, predict(row, &self.pair))
    }

    pub fn predict_named(&self, row: &[f64]) -> Result<Prediction> {
        let values = self.predict(row)?;
        Ok(Prediction {
            targets: self.pair.targets().clone(),
            values,
        })
    }

    /// Predict a `(rows, features)` matrix into `(rows, targets)`
    pub fn predict_batch(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let result = self.predict_batch_inner(x);
        self.track(x.nrows(), result)
    }

    fn predict_batch_inner(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.pair.features().check_width(x.ncols())?;
        let scaler = self.pair.scaler();
        let model = self.pair.model();

        if x.nrows() < PARALLEL_BATCH_ROWS {
            return model.predict(&scaler.transform(x)?);
        }

        let chunks: Vec<Array2<f64>> = x
            .axis_chunks_iter(ndarray::Axis(0), PARALLEL_BATCH_ROWS)
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|chunk| model.predict(&scaler.transform(&chunk.to_owned())?))
            .collect::<Result<_>>()?;

        let views: Vec<_> = chunks.iter().map(|c| c.view()).collect();
        ndarray::concatenate(ndarray::Axis(0), &views).map_err(PipelineError::from)
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            rows_predicted: self.rows_predicted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Scale `row` with the pair's scaler and predict every target. A row whose
/// length differs from the feature schema is rejected before scaling.
pub fn predict(row: &[f64], pair: &ArtifactPair) -> Result<Vec<f64>> {
    pair.features().check_width(row.len())?;
    if let Some(i) = row.iter().position(|v| !v.is_finite()) {
        return Err(PipelineError::Validation(format!(
            "feature '{}' is not a finite number",
            pair.features().names()[i]
        )));
    }
    let scaled = pair.scaler().transform_row(row)?;
    pair.model().predict_row(&scaled)
}
