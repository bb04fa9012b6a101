//! Pipeline configuration
//!
//! A training run is fully described by a [`PipelineConfig`], read from a JSON
//! file or built from one of the [`presets`](crate::presets).

use crate::data::CleaningConfig;
use crate::error::{PipelineError, Result};
use crate::schema::{FeatureSchema, TargetSchema};
use crate::training::HyperparameterGrid;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the data comes from and how it is cleaned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Source CSV; may be supplied on the command line instead
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(flatten)]
    pub cleaning: CleaningConfig,
}

/// Feature and target column names, in model order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub features: Vec<String>,
    pub targets: Vec<String>,
}

fn default_cv_folds() -> usize {
    5
}

fn default_test_ratio() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

/// Search and split settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub grid: HyperparameterGrid,

    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,

    /// Fraction of rows held out for evaluation
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,

    /// Seed of the train/test shuffle
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Worker threads for the search (None = all cores)
    #[serde(default)]
    pub n_jobs: Option<usize>,
}

impl TrainingConfig {
    pub fn new(grid: HyperparameterGrid) -> Self {
        Self {
            grid,
            cv_folds: default_cv_folds(),
            test_ratio: default_test_ratio(),
            seed: default_seed(),
            n_jobs: None,
        }
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_test_ratio(mut self, ratio: f64) -> Self {
        self.test_ratio = ratio;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }
}

fn default_registry_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_write_metrics() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root of the model registry
    #[serde(default = "default_registry_dir")]
    pub registry_dir: PathBuf,

    /// Write `metrics.json` next to the saved pair
    #[serde(default = "default_write_metrics")]
    pub write_metrics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            registry_dir: default_registry_dir(),
            write_metrics: default_write_metrics(),
        }
    }
}

/// Complete description of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Registry name of the trained model
    pub name: String,

    #[serde(default)]
    pub data: DataConfig,

    pub schema: SchemaConfig,

    pub training: TrainingConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl PipelineConfig {
    pub fn new(name: impl Into<String>, schema: SchemaConfig, training: TrainingConfig) -> Self {
        Self {
            name: name.into(),
            data: DataConfig::default(),
            schema,
            training,
            output: OutputConfig::default(),
        }
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data.path = Some(path.into());
        self
    }

    pub fn with_cleaning(mut self, cleaning: CleaningConfig) -> Self {
        self.data.cleaning = cleaning;
        self
    }

    pub fn with_registry_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.registry_dir = dir.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_write_metrics(mut self, write: bool) -> Self {
        self.output.write_metrics = write;
        self
    }

    pub fn feature_schema(&self) -> Result<FeatureSchema> {
        FeatureSchema::new(self.schema.features.iter().cloned())
    }

    pub fn target_schema(&self) -> Result<TargetSchema> {
        TargetSchema::new(self.schema.targets.iter().cloned())
    }

    /// Check everything that can be checked before touching the data
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::Config("model name must not be empty".to_string()));
        }
        self.feature_schema()?;
        self.target_schema()?;
        self.training.grid.validate()?;

        let t = &self.training;
        if t.cv_folds < 2 {
            return Err(PipelineError::Config(format!("cv_folds must be at least 2, got {}", t.cv_folds)));
        }
        if !(t.test_ratio > 0.0 && t.test_ratio < 1.0) {
            return Err(PipelineError::Config(format!("test_ratio must be in (0, 1), got {}", t.test_ratio)));
        }
        if t.n_jobs == Some(0) {
            return Err(PipelineError::Config("n_jobs must be at least 1".to_string()));
        }
        let factor = self.data.cleaning.iqr_factor;
        if !(factor >= 0.0 && factor.is_finite()) {
            return Err(PipelineError::Config(format!("iqr_factor must be >= 0, got {}", factor)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig::new(
            "unit",
            SchemaConfig {
                features: vec!["a".into(), "b".into()],
                targets: vec!["y".into()],
            },
            TrainingConfig::new(HyperparameterGrid::Ridge { alpha: vec![1.0] }),
        )
    }

    #[test]
    fn test_defaults() {
        let c = config();
        assert_eq!(c.training.cv_folds, 5);
        assert_eq!(c.training.test_ratio, 0.2);
        assert_eq!(c.training.seed, 42);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_with_partial_fields() {
        let json = r#"{
            "name": "weather",
            "data": { "path": "w.csv", "date_column": "date", "thousands_separator": null },
            "schema": { "features": ["t", "p"], "targets": ["o3"] },
            "training": { "grid": { "estimator": "ridge", "alpha": [0.1, 1.0] }, "cv_folds": 3 }
        }"#;
        let c: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.data.cleaning.date_column.as_deref(), Some("date"));
        assert_eq!(c.data.cleaning.thousands_separator, None);
        assert_eq!(c.data.cleaning.iqr_factor, 1.5);
        assert_eq!(c.training.cv_folds, 3);
        assert_eq!(c.output.registry_dir, PathBuf::from("models"));
        assert!(c.validate().is_ok());

        let again: PipelineConfig = serde_json::from_str(&c.to_json().unwrap()).unwrap();
        assert_eq!(again.schema.features, c.schema.features);
    }

    #[test]
    fn test_validation_failures() {
        let mut c = config();
        c.training.cv_folds = 1;
        assert!(matches!(c.validate(), Err(PipelineError::Config(_))));

        let mut c = config();
        c.training.test_ratio = 0.0;
        assert!(c.validate().is_err());

        let mut c = config();
        c.schema.features = vec!["a".into(), "a".into()];
        assert!(c.validate().is_err());

        let mut c = config();
        c.schema.targets.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, config().to_json().unwrap()).unwrap();
        let loaded = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(loaded.name, "unit");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PipelineConfig::from_file(&path), Err(PipelineError::Config(_))));
    }
}
