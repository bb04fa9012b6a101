//! Ready-made configurations for the two supported models
//!
//! - [`health`]: London pollutant means → respiratory health outcomes,
//!   random forest grid, 3-fold CV
//! - [`weather`]: weather plus pollutant readings → three pollutant targets,
//!   ridge over `alpha = 10^-3 .. 10^3`, 5-fold CV

use crate::config::{PipelineConfig, SchemaConfig, TrainingConfig};
use crate::data::CleaningConfig;
use crate::error::{PipelineError, Result};
use crate::training::{logspace, HyperparameterGrid};

pub const HEALTH_FEATURES: [&str; 10] = [
    "London Mean Roadside:Nitrogen Dioxide (ug/m3)",
    "London Mean Roadside:PM10 Particulate (ug/m3)",
    "London Mean Roadside:PM2.5 Particulate (ug/m3)",
    "London Mean Roadside:Ozone (ug/m3)",
    "London Mean Roadside:Sulphur Dioxide (ug/m3)",
    "London Mean Background:Nitrogen Dioxide (ug/m3)",
    "London Mean Background:Ozone (ug/m3)",
    "London Mean Background:PM10 Particulate (ug/m3)",
    "London Mean Background:PM2.5 Particulate (ug/m3)",
    "London Mean Background:Sulphur Dioxide (ug/m3)",
];

pub const HEALTH_TARGETS: [&str; 3] = ["All respiratory deaths", "Bronchiectasis", "COPD"];

pub const WEATHER_FEATURES: [&str; 13] = [
    "mean_temp",
    "wspd",
    "wdir",
    "precipitation",
    "pressure",
    "Roadside_Nitrogen_Dioxide (ug/m3)",
    "Roadside_Ozone (ug/m3)",
    "Roadside_PM10_Particulate (ug/m3)",
    "Roadside_PM2.5_Particulate (ug/m3)",
    "Background_Nitrogen_Dioxide (ug/m3)",
    "Background_Ozone (ug/m3)",
    "Background_PM10_Particulate (ug/m3)",
    "Background_PM2.5_Particulate (ug/m3)",
];

pub const WEATHER_TARGETS: [&str; 3] = [
    "Roadside_PM2.5_Particulate (ug/m3)",
    "Background_Nitrogen_Dioxide (ug/m3)",
    "Roadside_Ozone (ug/m3)",
];

fn names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

/// Random forest over health outcomes; numbers may carry `,` separators
pub fn health() -> PipelineConfig {
    let grid = HyperparameterGrid::RandomForest {
        n_estimators: vec![50, 100],
        max_depth: vec![None, Some(10)],
        min_samples_split: vec![2, 5],
        random_state: 42,
    };
    PipelineConfig::new(
        "aq_health",
        SchemaConfig {
            features: names(&HEALTH_FEATURES),
            targets: names(&HEALTH_TARGETS),
        },
        TrainingConfig::new(grid).with_cv_folds(3),
    )
    .with_cleaning(CleaningConfig::default().with_thousands_separator(Some(',')))
}

/// Ridge over pollutant targets; monthly `date` column, plain numbers, and
/// no outlier filtering so rainfall extremes stay in the training data
pub fn weather() -> PipelineConfig {
    let grid = HyperparameterGrid::Ridge {
        alpha: logspace(-3.0, 3.0, 7),
    };
    PipelineConfig::new(
        "aq_weather",
        SchemaConfig {
            features: names(&WEATHER_FEATURES),
            targets: names(&WEATHER_TARGETS),
        },
        TrainingConfig::new(grid).with_cv_folds(5),
    )
    .with_cleaning(
        CleaningConfig::default()
            .with_date_column("date")
            .with_date_format("%Y-%m")
            .with_thousands_separator(None)
            .with_outlier_filter(false),
    )
}

/// Look a preset up by name
pub fn by_name(name: &str) -> Result<PipelineConfig> {
    match name {
        "health" => Ok(health()),
        "weather" => Ok(weather()),
        other => Err(PipelineError::Config(format!(
            "unknown preset '{}' (expected 'health' or 'weather')",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load_and_clean;

    #[test]
    fn test_presets_validate() {
        for config in [health(), weather()] {
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_health_preset_shape() {
        let c = health();
        assert_eq!(c.feature_schema().unwrap().len(), 10);
        assert_eq!(c.target_schema().unwrap().len(), 3);
        assert_eq!(c.training.grid.len(), 8);
        assert_eq!(c.training.cv_folds, 3);
        assert_eq!(c.data.cleaning.thousands_separator, Some(','));
        assert!(c.data.cleaning.outlier_filter);
    }

    #[test]
    fn test_weather_preset_shape() {
        let c = weather();
        assert_eq!(c.feature_schema().unwrap().len(), 13);
        assert_eq!(c.training.grid.len(), 7);
        assert_eq!(c.training.cv_folds, 5);
        assert_eq!(c.data.cleaning.date_column.as_deref(), Some("date"));
        assert!(!c.data.cleaning.outlier_filter);
        // targets are also inputs of this model
        let features = c.feature_schema().unwrap();
        for t in WEATHER_TARGETS {
            assert!(features.index_of(t).is_ok());
        }
    }

    #[test]
    fn test_weather_keeps_precipitation_spikes() {
        let mut csv = String::from("date,precipitation,mean_temp\n");
        for i in 0..40 {
            let rain = if i % 10 == 0 { 180.0 } else { 40.0 + (i % 5) as f64 };
            csv.push_str(&format!("{}-{:02},{},{}\n", 2010 + i / 12, i % 12 + 1, rain, 10 + i % 3));
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.csv");
        std::fs::write(&path, csv).unwrap();

        let kept = load_and_clean(&path, &weather().data.cleaning).unwrap();
        assert_eq!(kept.height(), 40);
        assert_eq!(kept.summary().unwrap()[0].max, 180.0);

        let filtering = weather().data.cleaning.with_outlier_filter(true);
        let filtered = load_and_clean(&path, &filtering).unwrap();
        assert_eq!(filtered.height(), 36);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(by_name("health").is_ok());
        assert!(matches!(by_name("traffic"), Err(PipelineError::Config(_))));
    }
}
