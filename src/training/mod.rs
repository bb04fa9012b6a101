//! Model training module
//!
//! Provides the regressors searched by the pipeline:
//! - CART regression trees and bootstrap random forests
//! - Ridge regression
//! - A multi-output wrapper fitting one model per target
//! - K-fold grid search with refit of the best candidate

pub mod cross_validation;
pub mod decision_tree;
pub mod estimator;
pub mod grid_search;
pub mod multi_output;
pub mod random_forest;
pub mod ridge;

pub use cross_validation::{CVResults, CVSplit, KFold};
pub use decision_tree::{DecisionTree, TreeNode};
pub use estimator::{
    logspace, EstimatorParams, FittedEstimator, ForestParams, HyperparameterGrid, Regressor, RidgeParams,
};
pub use grid_search::{train, CandidateResult, GridSearch, SearchOutcome};
pub use multi_output::MultiOutputRegressor;
pub use random_forest::RandomForest;
pub use ridge::RidgeRegression;
