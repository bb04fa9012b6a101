//! Integration test: loading, cleaning, framing and splitting

mod common;

use aq_regression::data::{frame, load_and_clean, train_test_split, CleaningConfig, IqrFilter};
use aq_regression::error::PipelineError;
use aq_regression::preprocessing::StandardScaler;
use aq_regression::presets;
use aq_regression::schema::{FeatureSchema, TargetSchema};
use ndarray::Axis;

#[test]
fn test_health_csv_survives_cleaning() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_health_csv(dir.path(), 120, 7);
    let config = presets::health();

    let ds = load_and_clean(&path, &config.data.cleaning).unwrap();
    assert_eq!(ds.height(), 120);

    // grouped numbers were parsed, not left as text
    let deaths = ds.numeric_values("All respiratory deaths").unwrap();
    assert!(deaths.iter().all(|&d| (1000.0..=6000.0).contains(&d)));
    assert!(!ds.numeric_columns().contains(&"Month".to_string()));
}

#[test]
fn test_cleaned_values_lie_within_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from("no2,o3\n");
    for i in 0..40 {
        csv.push_str(&format!("{},{}\n", 20 + i % 7, 50 + i % 5));
    }
    csv.push_str("400,52\n");
    csv.push_str("21,-300\n");
    csv.push_str(",51\n");
    let path = dir.path().join("pollutants.csv");
    std::fs::write(&path, csv).unwrap();

    let ds = load_and_clean(&path, &CleaningConfig::default()).unwrap();
    assert_eq!(ds.height(), 40);

    // bounds recomputed on the cleaned data still hold every value
    let filter = IqrFilter::fit(&ds, 1.5).unwrap();
    for (column, bounds) in filter.bounds() {
        for v in ds.numeric_values(column).unwrap() {
            assert!(v >= bounds.lower && v <= bounds.upper);
        }
    }
    assert!(ds.numeric_values("no2").unwrap().iter().all(|&v| v < 30.0));
}

#[test]
fn test_weather_dates_are_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_weather_csv(dir.path(), 36, 3);
    let config = presets::weather();

    let ds = load_and_clean(&path, &config.data.cleaning).unwrap();
    assert_eq!(ds.height(), 36);
    assert_eq!(ds.date_column(), Some("date"));
    assert!(!ds.numeric_columns().contains(&"date".to_string()));
}

#[test]
fn test_non_matching_date_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "date,mean_temp\n2020-01,4.5\n01/02/2020,5.0\n").unwrap();

    let config = presets::weather();
    assert!(matches!(
        load_and_clean(&path, &config.data.cleaning),
        Err(PipelineError::DataFormat(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_clean(dir.path().join("absent.csv"), &CleaningConfig::default());
    assert!(matches!(result, Err(PipelineError::Io(_))));
}

#[test]
fn test_frame_split_and_scale() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_health_csv(dir.path(), 100, 11);
    let config = presets::health();
    let ds = load_and_clean(&path, &config.data.cleaning).unwrap();

    let features = config.feature_schema().unwrap();
    let targets = config.target_schema().unwrap();
    let (x, y) = frame(&ds, &features, &targets).unwrap();
    assert_eq!(x.dim(), (100, 10));
    assert_eq!(y.dim(), (100, 3));

    let split = train_test_split(&x, &y, 0.2, 42).unwrap();
    assert_eq!(split.x_test.nrows(), 20);
    assert_eq!(split.x_train.nrows(), 80);

    let again = train_test_split(&x, &y, 0.2, 42).unwrap();
    assert_eq!(split.test_indices, again.test_indices);
    let other = train_test_split(&x, &y, 0.2, 43).unwrap();
    assert_ne!(split.test_indices, other.test_indices);

    let mut all: Vec<usize> = split.train_indices.iter().chain(&split.test_indices).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..100).collect::<Vec<_>>());

    // scaled training features are centred with unit spread
    let scaler = StandardScaler::fit(&split.x_train).unwrap();
    let scaled = scaler.transform(&split.x_train).unwrap();
    let means = scaled.mean_axis(Axis(0)).unwrap();
    let stds = scaled.std_axis(Axis(0), 0.0);
    for j in 0..10 {
        assert!(means[j].abs() < 1e-9);
        assert!((stds[j] - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_unknown_column_is_reported_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_weather_csv(dir.path(), 24, 5);
    let ds = load_and_clean(&path, &presets::weather().data.cleaning).unwrap();

    let features = FeatureSchema::new(["mean_temp", "humidity"]).unwrap();
    let targets = TargetSchema::new(["Roadside_Ozone (ug/m3)"]).unwrap();
    assert!(matches!(
        frame(&ds, &features, &targets),
        Err(PipelineError::ColumnMissing(name)) if name == "humidity"
    ));
}
