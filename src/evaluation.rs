//! Regression metrics on the held-out partition

use crate::error::{PipelineError, Result};
use crate::schema::TargetSchema;
use crate::training::MultiOutputRegressor;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Metrics of one target column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl MetricsRecord {
    /// Compute regression metrics. R² is 1 for a perfect fit of a constant
    /// target and 0 for any other fit of one.
    pub fn compute(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: y_true.len(),
                actual: y_pred.len(),
            });
        }
        if y_true.is_empty() {
            return Err(PipelineError::Validation("cannot score an empty partition".to_string()));
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true.iter().zip(y_pred.iter()).map(|(t, p)| t - p).collect();

        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
        })
    }
}

/// Per-target metrics in target-schema order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    entries: Vec<(String, MetricsRecord)>,
}

impl MetricsReport {
    pub fn get(&self, target: &str) -> Option<&MetricsRecord> {
        self.entries.iter().find(|(name, _)| name == target).map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricsRecord)> {
        self.entries.iter().map(|(name, m)| (name.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Uniform average of the per-target MSE
    pub fn mean_mse(&self) -> f64 {
        self.entries.iter().map(|(_, m)| m.mse).sum::<f64>() / self.entries.len().max(1) as f64
    }
}

/// Score `model` on the scaled test partition
pub fn evaluate(
    model: &MultiOutputRegressor,
    x_test: &Array2<f64>,
    y_test: &Array2<f64>,
    targets: &TargetSchema,
) -> Result<MetricsReport> {
    if y_test.ncols() != targets.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: targets.len(),
            actual: y_test.ncols(),
        });
    }
    if x_test.nrows() != y_test.nrows() {
        return Err(PipelineError::DimensionMismatch {
            expected: x_test.nrows(),
            actual: y_test.nrows(),
        });
    }

    let y_pred = model.predict(x_test)?;
    if y_pred.ncols() != targets.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: targets.len(),
            actual: y_pred.ncols(),
        });
    }

    let entries = targets
        .names()
        .iter()
        .enumerate()
        .map(|(j, name)| -> Result<(String, MetricsRecord)> {
            Ok((name.clone(), MetricsRecord::compute(y_test.column(j), y_pred.column(j))?))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MetricsReport { entries })
}
