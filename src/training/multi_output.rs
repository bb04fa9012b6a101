//! One regressor per target column

use super::estimator::{EstimatorParams, FittedEstimator, Regressor};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered sub-models, index `j` predicting target column `j`. All share
/// the same hyperparameters and input features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiOutputRegressor {
    params: EstimatorParams,
    estimators: Vec<FittedEstimator>,
    n_features: usize,
}

impl MultiOutputRegressor {
    /// Fit one estimator per column of `y`
    pub fn fit(params: EstimatorParams, x: &Array2<f64>, y: &Array2<f64>) -> Result<Self> {
        if x.nrows() != y.nrows() {
            return Err(PipelineError::Validation(format!(
                "features have {} rows but targets have {}",
                x.nrows(),
                y.nrows()
            )));
        }
        if y.ncols() == 0 {
            return Err(PipelineError::Validation("at least one target column is required".to_string()));
        }

        let estimators = (0..y.ncols())
            .into_par_iter()
            .map(|j| {
                let column: Array1<f64> = y.column(j).to_owned();
                params.fit(x, &column)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            params,
            estimators,
            n_features: x.ncols(),
        })
    }

    pub fn params(&self) -> &EstimatorParams {
        &self.params
    }

    pub fn estimators(&self) -> &[FittedEstimator] {
        &self.estimators
    }

    pub fn n_outputs(&self) -> usize {
        self.estimators.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predict an `(n_rows, n_outputs)` matrix
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }

        let columns = self
            .estimators
            .iter()
            .map(|e| e.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut out = Array2::zeros((x.nrows(), self.estimators.len()));
        for (j, col) in columns.iter().enumerate() {
            out.column_mut(j).assign(col);
        }
        Ok(out)
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        let x = Array1::from_vec(row.to_vec()).insert_axis(Axis(0));
        Ok(self.predict(&x)?.row(0).to_vec())
    }
}
