//! Seeded train/test partitioning

use crate::error::{PipelineError, Result};
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row partition of a framed dataset
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array2<f64>,
    pub y_test: Array2<f64>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Shuffle rows with a seeded permutation, then take the first
/// `ceil(n * test_ratio)` rows as the test partition.
///
/// The same inputs and seed always produce the same partition.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array2<f64>,
    test_ratio: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    let n = x.nrows();
    if n != y.nrows() {
        return Err(PipelineError::Validation(format!(
            "features have {} rows but targets have {}",
            n,
            y.nrows()
        )));
    }
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(PipelineError::Config(format!("test ratio must be in (0, 1), got {}", test_ratio)));
    }

    let n_test = (n as f64 * test_ratio).ceil() as usize;
    if n < 2 || n_test == 0 || n_test >= n {
        return Err(PipelineError::Validation(format!(
            "cannot split {} rows with test ratio {}",
            n, test_ratio
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_train: y.select(Axis(0), &train_indices),
        y_test: y.select(Axis(0), &test_indices),
        train_indices,
        test_indices,
    })
}
