//! Air-quality regression pipeline
//!
//! This crate trains tabular multi-output regressors on air-quality data:
//! - Dataset loading with missing-value and IQR outlier removal
//! - Seeded train/test split and standard scaling
//! - Grid search with k-fold CV over random forest and ridge models
//! - Held-out evaluation (MSE, RMSE, MAE, R²)
//! - Versioned (model, scaler) artifact pairs and an inference adapter
//!
//! # Modules
//!
//! ## Data
//! - [`data`] - Loading, cleaning, framing and splitting
//! - [`schema`] - Ordered feature and target column names
//! - [`preprocessing`] - Standard scaling
//!
//! ## Models
//! - [`training`] - Estimators, cross-validation and grid search
//! - [`evaluation`] - Regression metrics
//!
//! ## Persistence and serving
//! - [`export`] - Artifact pairs and the model registry
//! - [`inference`] - Prediction from a loaded pair
//!
//! ## Orchestration
//! - [`config`] - Run configuration
//! - [`presets`] - The health and weather configurations
//! - [`pipeline`] - End-to-end training run
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod data;
pub mod schema;
pub mod preprocessing;

// Models
pub mod training;
pub mod evaluation;

// Persistence and serving
pub mod export;
pub mod inference;

// Orchestration
pub mod config;
pub mod presets;
pub mod pipeline;
pub mod cli;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result};

    // Data
    pub use crate::data::{frame, load_and_clean, train_test_split, CleaningConfig, Dataset, TrainTestSplit};
    pub use crate::schema::{FeatureSchema, TargetSchema};
    pub use crate::preprocessing::StandardScaler;

    // Training
    pub use crate::training::{
        EstimatorParams, GridSearch, HyperparameterGrid, MultiOutputRegressor, SearchOutcome,
    };
    pub use crate::evaluation::{evaluate, MetricsRecord, MetricsReport};

    // Persistence and serving
    pub use crate::export::{ArtifactPair, ArtifactPaths, ModelRegistry, ModelVersion};
    pub use crate::inference::{InferenceAdapter, ModelSlot, Prediction};

    // Orchestration
    pub use crate::config::PipelineConfig;
    pub use crate::pipeline::{TrainingPipeline, TrainingReport, TrainingRun};
}
