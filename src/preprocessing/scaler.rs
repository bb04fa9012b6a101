//! Feature standardization

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Standard scaling (z-score normalization): `(x - mean) / std`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScaler;

impl StandardScaler {
    /// Fit per-column mean and population standard deviation.
    ///
    /// Only training features may be passed here; statistics from test or
    /// inference rows would leak into the model.
    pub fn fit(x: &Array2<f64>) -> Result<ScalerState> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(PipelineError::Validation(format!(
                "cannot fit scaler on a {}x{} matrix",
                x.nrows(),
                x.ncols()
            )));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::Validation("empty feature matrix".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        Ok(ScalerState { mean, scale })
    }
}

/// Fitted scaling statistics; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl ScalerState {
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    pub fn scale(&self) -> ArrayView1<'_, f64> {
        self.scale.view()
    }

    fn check(&self, actual: usize) -> Result<()> {
        if actual != self.n_features() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features(),
                actual,
            });
        }
        Ok(())
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check(x.ncols())?;
        let mut out = x.clone();
        for row in out.rows_mut() {
            Zip::from(row)
                .and(&self.mean)
                .and(&self.scale)
                .for_each(|v, &m, &s| *v = (*v - m) / s);
        }
        Ok(out)
    }

    /// Scale a single raw feature row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check(x.ncols())?;
        let mut out = x.clone();
        for row in out.rows_mut() {
            Zip::from(row)
                .and(&self.mean)
                .and(&self.scale)
                .for_each(|v, &m, &s| *v = *v * s + m);
        }
        Ok(out)
    }
}
