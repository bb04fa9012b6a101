//! Integration test: full pipeline (load → clean → split → search → evaluate → register)

mod common;

use aq_regression::config::PipelineConfig;
use aq_regression::export::{ModelRegistry, ModelVersion};
use aq_regression::inference::InferenceAdapter;
use aq_regression::pipeline::{TrainingPipeline, TrainingReport};
use aq_regression::presets::{self, HEALTH_TARGETS, WEATHER_FEATURES, WEATHER_TARGETS};
use aq_regression::training::{EstimatorParams, HyperparameterGrid};
use std::path::Path;
use std::sync::Arc;

/// Health preset with a smaller forest grid
fn health_config(data: &Path, registry: &Path) -> PipelineConfig {
    let mut config = presets::health().with_data_path(data).with_registry_dir(registry);
    config.training.grid = HyperparameterGrid::RandomForest {
        n_estimators: vec![10, 20],
        max_depth: vec![None, Some(6)],
        min_samples_split: vec![2, 5],
        random_state: 42,
    };
    config
}

#[test]
fn test_health_forest_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_health_csv(dir.path(), 150, 21);
    let registry_dir = dir.path().join("models");

    // preset grid as shipped: 2 x 2 x 2 forests, 3-fold CV
    let config = presets::health().with_data_path(&data).with_registry_dir(&registry_dir);
    let pipeline = TrainingPipeline::new(config).unwrap();
    let run = pipeline.run().unwrap();

    assert_eq!(run.report.rows, 150);
    assert_eq!(run.report.n_test, 30);
    assert_eq!(run.report.candidates.len(), 8);
    assert!(matches!(run.report.best_params, EstimatorParams::RandomForest(_)));
    assert!(run.report.candidates.iter().all(|c| c.cv.n_folds == 3));

    assert_eq!(run.report.metrics.len(), 3);
    for (target, m) in run.report.metrics.iter() {
        assert!(HEALTH_TARGETS.contains(&target));
        assert!(m.mse >= 0.0);
        assert!(m.r2 <= 1.0);
        assert!((m.rmse * m.rmse - m.mse).abs() < 1e-6 * m.mse.max(1.0));
    }
    assert!(run.report.metrics.get("All respiratory deaths").unwrap().r2 > 0.5);

    assert_eq!(run.registered.entry.version, ModelVersion::new(1, 0, 0));
    assert!(run.registered.paths.model.exists());
    assert!(run.registered.paths.scaler.exists());

    let metrics_path = run.metrics_path.unwrap();
    let report: TrainingReport = serde_json::from_slice(&std::fs::read(metrics_path).unwrap()).unwrap();
    assert_eq!(report.best_params, run.report.best_params);
}

#[test]
fn test_weather_ridge_pipeline_beats_default_penalty() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_weather_csv(dir.path(), 120, 8);
    let registry_dir = dir.path().join("models");

    let searched = TrainingPipeline::new(
        presets::weather().with_data_path(&data).with_registry_dir(&registry_dir),
    )
    .unwrap();
    let dataset = searched.load().unwrap();
    let best = searched.fit(&dataset).unwrap();
    assert_eq!(best.report.candidates.len(), 7);
    assert!(best.report.candidates.iter().all(|c| c.cv.n_folds == 5));

    let mut baseline_config = presets::weather().with_data_path(&data);
    baseline_config.training.grid = HyperparameterGrid::Ridge { alpha: vec![1.0] };
    let baseline = TrainingPipeline::new(baseline_config).unwrap().fit(&dataset).unwrap();

    // same seed, same split
    assert_eq!(best.report.n_test, baseline.report.n_test);
    assert!(best.report.metrics.mean_mse() <= baseline.report.metrics.mean_mse() + 1e-12);
    for (_, m) in best.report.metrics.iter() {
        assert!(m.r2 <= 1.0);
        assert!(m.mse >= 0.0);
    }
}

#[test]
fn test_pipeline_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_health_csv(dir.path(), 90, 4);

    let mut config = health_config(&data, &dir.path().join("a"));
    config.training.n_jobs = Some(1);
    let first = TrainingPipeline::new(config).unwrap();
    let dataset = first.load().unwrap();
    let a = first.fit(&dataset).unwrap();

    let mut config = health_config(&data, &dir.path().join("b"));
    config.training.n_jobs = Some(3);
    let b = TrainingPipeline::new(config).unwrap().fit(&dataset).unwrap();

    assert_eq!(a.report.best_params, b.report.best_params);
    assert_eq!(a.report.best_cv_score, b.report.best_cv_score);
    assert_eq!(a.report.metrics, b.report.metrics);
    assert_eq!(a.pair.scaler(), b.pair.scaler());
}

#[test]
fn test_registered_pair_serves_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_weather_csv(dir.path(), 60, 13);
    let registry_dir = dir.path().join("models");
    let config = presets::weather().with_data_path(&data).with_registry_dir(&registry_dir);

    let first = TrainingPipeline::new(config.clone()).unwrap().run().unwrap();
    let second = TrainingPipeline::new(config).unwrap().run().unwrap();
    assert_eq!(second.registered.entry.version, ModelVersion::new(1, 0, 1));
    assert_ne!(first.registered.entry.pair_id, second.registered.entry.pair_id);

    let registry = ModelRegistry::open(&registry_dir).unwrap();
    assert_eq!(registry.list_versions("aq_weather").len(), 2);
    let pair = registry.load_latest("aq_weather").unwrap();
    assert_eq!(pair.metadata().pair_id, second.registered.entry.pair_id);

    let adapter = InferenceAdapter::new(Arc::new(pair));
    let row: Vec<f64> = (0..WEATHER_FEATURES.len()).map(|j| 5.0 * (j + 1) as f64 + 10.0).collect();
    let prediction = adapter.predict_named(&row).unwrap();
    assert_eq!(prediction.values().len(), WEATHER_TARGETS.len());

    // each pollutant target is also an input, so the model nearly echoes it
    for target in WEATHER_TARGETS {
        let j = WEATHER_FEATURES.iter().position(|f| *f == target).unwrap();
        assert!((prediction.get(target).unwrap() - row[j]).abs() < 0.5);
    }
}

#[test]
fn test_failed_training_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("short.csv");
    let mut csv = String::from("mean_temp,o3\n");
    for i in 0..6 {
        csv.push_str(&format!("{},{}\n", i, 2 * i));
    }
    std::fs::write(&data, csv).unwrap();

    let registry_dir = dir.path().join("models");
    let config: PipelineConfig = serde_json::from_value(serde_json::json!({
        "name": "tiny",
        "data": { "path": data },
        "schema": { "features": ["mean_temp"], "targets": ["o3"] },
        "training": { "grid": { "estimator": "ridge", "alpha": [1.0] }, "cv_folds": 10 },
        "output": { "registry_dir": registry_dir }
    }))
    .unwrap();

    let pipeline = TrainingPipeline::new(config).unwrap();
    assert!(pipeline.run().is_err());
    let registry = ModelRegistry::open(&registry_dir).unwrap();
    assert!(registry.list_models().is_empty());
}
