//! Synthetic CSV fixtures shared by the integration tests

#![allow(dead_code)]

use aq_regression::presets::{HEALTH_FEATURES, HEALTH_TARGETS, WEATHER_FEATURES};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Integer with a `,` grouping separator, quoted for CSV
fn grouped(value: u64) -> String {
    if value >= 1000 {
        format!("\"{},{:03}\"", value / 1000, value % 1000)
    } else {
        value.to_string()
    }
}

/// Monthly health CSV: ten pollutant means and three outcome counts.
///
/// Every feature is uniform on its range and each outcome is dominated by
/// one feature, so no generated row lies outside the IQR bounds.
pub fn write_health_csv(dir: &Path, rows: usize, seed: u64) -> PathBuf {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = String::new();

    let header: Vec<String> = std::iter::once("Month".to_string())
        .chain(HEALTH_FEATURES.iter().map(|c| quote(c)))
        .chain(HEALTH_TARGETS.iter().map(|c| quote(c)))
        .collect();
    writeln!(out, "{}", header.join(",")).unwrap();

    for i in 0..rows {
        let u: Vec<f64> = (0..HEALTH_FEATURES.len()).map(|_| rng.gen::<f64>()).collect();
        let features: Vec<String> = u
            .iter()
            .enumerate()
            .map(|(j, v)| format!("{:.4}", 10.0 + 10.0 * j as f64 + 40.0 * v))
            .collect();

        let deaths = (1000.0 + 4000.0 * u[0] + 1000.0 * u[1]).round() as u64;
        let bronchiectasis = (20.0 + 80.0 * u[2] + 10.0 * u[3]).round() as u64;
        let copd = (300.0 + 600.0 * u[5] + 100.0 * u[7]).round() as u64;

        writeln!(
            out,
            "m{},{},{},{},{}",
            i,
            features.join(","),
            grouped(deaths),
            bronchiectasis,
            grouped(copd)
        )
        .unwrap();
    }

    let path = dir.join("health.csv");
    std::fs::write(&path, out).unwrap();
    path
}

/// Monthly weather CSV with a `date` column and the thirteen weather features.
/// The pollutant targets are themselves feature columns.
pub fn write_weather_csv(dir: &Path, rows: usize, seed: u64) -> PathBuf {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = String::new();

    let header: Vec<String> = std::iter::once("date".to_string())
        .chain(WEATHER_FEATURES.iter().map(|c| quote(c)))
        .collect();
    writeln!(out, "{}", header.join(",")).unwrap();

    for i in 0..rows {
        let year = 2005 + i / 12;
        let month = 1 + i % 12;
        let values: Vec<String> = (0..WEATHER_FEATURES.len())
            .map(|j| format!("{:.4}", 5.0 * (j + 1) as f64 + 20.0 * rng.gen::<f64>()))
            .collect();
        writeln!(out, "{}-{:02},{}", year, month, values.join(",")).unwrap();
    }

    let path = dir.join("weather.csv");
    std::fs::write(&path, out).unwrap();
    path
}
