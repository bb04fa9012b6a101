//! Estimator families, their hyperparameters and search grids

use super::random_forest::RandomForest;
use super::ridge::RidgeRegression;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-target regressor
pub trait Regressor: Send + Sync {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    fn n_features(&self) -> usize;
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RandomForest::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RandomForest::predict(self, x)
    }

    fn n_features(&self) -> usize {
        RandomForest::n_features(self)
    }
}

impl Regressor for RidgeRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RidgeRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RidgeRegression::predict(self, x)
    }

    fn n_features(&self) -> usize {
        RidgeRegression::n_features(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub random_state: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RidgeParams {
    pub alpha: f64,
}

/// One point of a hyperparameter grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorParams {
    RandomForest(ForestParams),
    Ridge(RidgeParams),
}

impl EstimatorParams {
    /// Build an unfitted estimator for these parameters
    pub fn build(&self) -> FittedEstimator {
        match *self {
            EstimatorParams::RandomForest(p) => FittedEstimator::RandomForest(
                RandomForest::new(p.n_estimators)
                    .with_max_depth(p.max_depth)
                    .with_min_samples_split(p.min_samples_split)
                    .with_random_state(p.random_state),
            ),
            EstimatorParams::Ridge(p) => FittedEstimator::Ridge(RidgeRegression::new(p.alpha)),
        }
    }

    /// Fit a fresh estimator on one target column
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedEstimator> {
        let mut estimator = self.build();
        estimator.fit(x, y)?;
        Ok(estimator)
    }

    pub fn family(&self) -> &'static str {
        match self {
            EstimatorParams::RandomForest(_) => "random_forest",
            EstimatorParams::Ridge(_) => "ridge",
        }
    }
}

impl fmt::Display for EstimatorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorParams::RandomForest(p) => {
                let depth = p.max_depth.map_or_else(|| "None".to_string(), |d| d.to_string());
                write!(
                    f,
                    "random_forest(n_estimators={}, max_depth={}, min_samples_split={})",
                    p.n_estimators, depth, p.min_samples_split
                )
            }
            EstimatorParams::Ridge(p) => write!(f, "ridge(alpha={})", p.alpha),
        }
    }
}

/// A fitted single-target estimator of either family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedEstimator {
    RandomForest(RandomForest),
    Ridge(RidgeRegression),
}

impl FittedEstimator {
    fn inner(&self) -> &dyn Regressor {
        match self {
            FittedEstimator::RandomForest(m) => m,
            FittedEstimator::Ridge(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            FittedEstimator::RandomForest(m) => m,
            FittedEstimator::Ridge(m) => m,
        }
    }
}

impl Regressor for FittedEstimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }
}

fn default_random_state() -> u64 {
    42
}

/// Typed search grid per estimator family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "estimator", rename_all = "snake_case")]
pub enum HyperparameterGrid {
    RandomForest {
        n_estimators: Vec<usize>,
        max_depth: Vec<Option<usize>>,
        min_samples_split: Vec<usize>,
        #[serde(default = "default_random_state")]
        random_state: u64,
    },
    Ridge {
        alpha: Vec<f64>,
    },
}

impl HyperparameterGrid {
    /// Cartesian product of the grid, parameter names taken in alphabetical
    /// order with the last one varying fastest
    pub fn candidates(&self) -> Vec<EstimatorParams> {
        match self {
            HyperparameterGrid::RandomForest {
                n_estimators,
                max_depth,
                min_samples_split,
                random_state,
            } => {
                let mut out = Vec::with_capacity(n_estimators.len() * max_depth.len() * min_samples_split.len());
                for &depth in max_depth {
                    for &split in min_samples_split {
                        for &n in n_estimators {
                            out.push(EstimatorParams::RandomForest(ForestParams {
                                n_estimators: n,
                                max_depth: depth,
                                min_samples_split: split,
                                random_state: *random_state,
                            }));
                        }
                    }
                }
                out
            }
            HyperparameterGrid::Ridge { alpha } => alpha
                .iter()
                .map(|&a| EstimatorParams::Ridge(RidgeParams { alpha: a }))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HyperparameterGrid::RandomForest { n_estimators, max_depth, min_samples_split, .. } => {
                n_estimators.len() * max_depth.len() * min_samples_split.len()
            }
            HyperparameterGrid::Ridge { alpha } => alpha.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(PipelineError::Config("hyperparameter grid has no candidates".to_string()));
        }
        match self {
            HyperparameterGrid::RandomForest { n_estimators, max_depth, min_samples_split, .. } => {
                if n_estimators.contains(&0) {
                    return Err(PipelineError::Config("n_estimators must be at least 1".to_string()));
                }
                if max_depth.contains(&Some(0)) {
                    return Err(PipelineError::Config("max_depth must be at least 1".to_string()));
                }
                if min_samples_split.iter().any(|&s| s < 2) {
                    return Err(PipelineError::Config("min_samples_split must be at least 2".to_string()));
                }
            }
            HyperparameterGrid::Ridge { alpha } => {
                if let Some(a) = alpha.iter().find(|a| !(**a >= 0.0 && a.is_finite())) {
                    return Err(PipelineError::Config(format!("ridge alpha must be finite and >= 0, got {}", a)));
                }
            }
        }
        Ok(())
    }
}

/// `num` values evenly spaced in log10 space from `10^start` to `10^stop`
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| 10f64.powf(start + step * i as f64)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn forest_grid() -> HyperparameterGrid {
        HyperparameterGrid::RandomForest {
            n_estimators: vec![50, 100],
            max_depth: vec![None, Some(10)],
            min_samples_split: vec![2, 5],
            random_state: 42,
        }
    }

    #[test]
    fn test_forest_grid_order() {
        let candidates = forest_grid().candidates();
        assert_eq!(candidates.len(), 8);

        let first = match candidates[0] {
            EstimatorParams::RandomForest(p) => p,
            _ => unreachable!(),
        };
        let second = match candidates[1] {
            EstimatorParams::RandomForest(p) => p,
            _ => unreachable!(),
        };
        assert_eq!((first.max_depth, first.min_samples_split, first.n_estimators), (None, 2, 50));
        assert_eq!((second.max_depth, second.min_samples_split, second.n_estimators), (None, 2, 100));
    }

    #[test]
    fn test_logspace() {
        let alphas = logspace(-3.0, 3.0, 7);
        let expected = [1e-3, 1e-2, 1e-1, 1.0, 1e1, 1e2, 1e3];
        assert_eq!(alphas.len(), 7);
        for (a, e) in alphas.iter().zip(expected.iter()) {
            assert!((a / e - 1.0).abs() < 1e-12);
        }
        assert!(logspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_grid_validation() {
        assert!(forest_grid().validate().is_ok());
        assert!(HyperparameterGrid::Ridge { alpha: vec![] }.validate().is_err());
        assert!(HyperparameterGrid::Ridge { alpha: vec![-1.0] }.validate().is_err());
        let bad_split = HyperparameterGrid::RandomForest {
            n_estimators: vec![10],
            max_depth: vec![None],
            min_samples_split: vec![1],
            random_state: 0,
        };
        assert!(bad_split.validate().is_err());
    }

    #[test]
    fn test_grid_json_shape() {
        let json = r#"{"estimator":"ridge","alpha":[0.1,1.0]}"#;
        let grid: HyperparameterGrid = serde_json::from_str(json).unwrap();
        assert_eq!(grid.len(), 2);

        let json = r#"{"estimator":"random_forest","n_estimators":[10],"max_depth":[null,3],"min_samples_split":[2]}"#;
        let grid: HyperparameterGrid = serde_json::from_str(json).unwrap();
        assert_eq!(grid.len(), 2);
        match grid {
            HyperparameterGrid::RandomForest { random_state, .. } => assert_eq!(random_state, 42),
            _ => panic!("wrong family"),
        }
    }

    #[test]
    fn test_params_fit_dispatch() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let params = EstimatorParams::Ridge(RidgeParams { alpha: 0.5 });
        let model = params.fit(&x, &y).unwrap();
        assert_eq!(model.n_features(), 1);
        let preds = model.predict(&x).unwrap();
        assert!(preds[3] > preds[0]);
        assert_eq!(params.to_string(), "ridge(alpha=0.5)");
    }
}
