//! CSV loading and cleaning

use super::outlier::IqrFilter;
use super::{CleaningConfig, Dataset};
use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read `path`, drop rows with missing values, then drop IQR outliers unless
/// `config.outlier_filter` is off.
///
/// Quartiles are computed on the data left after missing-value removal.
pub fn load_and_clean(path: impl AsRef<Path>, config: &CleaningConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let raw = read_csv_as_text(path)?;
    let loaded_rows = raw.height();

    let typed = type_columns(&raw, config)?;
    let dataset = Dataset::new(typed, config.date_column.clone());
    check_required_columns(&dataset, &config.required_columns)?;

    let complete = dataset.drop_nulls()?;
    let filter = if config.outlier_filter {
        Some(IqrFilter::fit(&complete, config.iqr_factor)?)
    } else {
        None
    };
    let cleaned = match &filter {
        Some(filter) => filter.apply(&complete)?,
        None => complete.clone(),
    };

    info!(
        path = %path.display(),
        loaded = loaded_rows,
        missing_removed = loaded_rows - complete.height(),
        outliers_removed = complete.height() - cleaned.height(),
        remaining = cleaned.height(),
        "Dataset cleaned"
    );
    for (column, bounds) in filter.iter().flat_map(|f| f.bounds()) {
        debug!(column = %column, lower = bounds.lower, upper = bounds.upper, "IQR bounds");
    }

    if let Some(dir) = &config.cache_dir {
        // the cache is a convenience copy; losing it never fails a run
        match write_cleaned(&cleaned, path, dir) {
            Ok(cached) => info!(path = %cached.display(), "Cleaned dataset cached"),
            Err(e) => warn!(error = %e, "Failed to cache cleaned dataset"),
        }
    }

    Ok(cleaned)
}

/// Read every field as text so numbers with grouping separators survive
fn read_csv_as_text(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| PipelineError::DataFormat(format!("{}: {}", path.display(), e)))
}

fn is_missing(value: &str) -> bool {
    let v = value.trim();
    v.is_empty()
        || v.eq_ignore_ascii_case("na")
        || v.eq_ignore_ascii_case("nan")
        || v.eq_ignore_ascii_case("null")
}

fn parse_number(value: &str, separator: Option<char>) -> Option<f64> {
    let trimmed = value.trim();
    match separator {
        Some(sep) => trimmed.replace(sep, "").parse().ok(),
        None => trimmed.parse().ok(),
    }
}

/// Parse a date, completing a day-less format to the first of the month
pub fn parse_date(value: &str, format: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if format.contains("%d") || format.contains("%e") || format.contains("%j") {
        NaiveDate::parse_from_str(value, format).ok()
    } else {
        NaiveDate::parse_from_str(&format!("{}-01", value), &format!("{}-%d", format)).ok()
    }
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as i32
}

/// Convert text columns to `Float64` where every present value parses, the
/// configured date column to `Date`, and leave the rest as text
fn type_columns(raw: &DataFrame, config: &CleaningConfig) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(raw.width());

    for column in raw.get_columns() {
        let name = column.name().clone();
        let cells: Vec<Option<&str>> = column
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|cell| cell.filter(|v| !is_missing(v)))
            .collect();

        if config.date_column.as_deref() == Some(name.as_str()) {
            let days = cells
                .iter()
                .map(|cell| match cell {
                    None => Ok(None),
                    Some(v) => parse_date(v, &config.date_format)
                        .map(|d| Some(days_since_epoch(d)))
                        .ok_or_else(|| {
                            PipelineError::DataFormat(format!(
                                "column '{}': '{}' does not match date format '{}'",
                                name, v, config.date_format
                            ))
                        }),
                })
                .collect::<Result<Vec<Option<i32>>>>()?;
            columns.push(Series::new(name, days).cast(&DataType::Date)?.into());
            continue;
        }

        let numbers: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|cell| match cell {
                None => Some(None),
                Some(v) => parse_number(v, config.thousands_separator).map(Some),
            })
            .collect();

        match numbers {
            Some(values) => columns.push(Series::new(name, values).into()),
            None => {
                debug!(column = %name, "Keeping non-numeric column as text");
                columns.push(Series::new(name, cells).into());
            }
        }
    }

    if let Some(date_column) = &config.date_column {
        if raw.column(date_column).is_err() {
            return Err(PipelineError::DataFormat(format!("date column '{}' not found", date_column)));
        }
    }

    Ok(DataFrame::new(columns)?)
}

fn check_required_columns(dataset: &Dataset, required: &[String]) -> Result<()> {
    let numeric = dataset.numeric_columns();
    for name in required {
        if !dataset.has_column(name) {
            return Err(PipelineError::DataFormat(format!("required column '{}' not found", name)));
        }
        if !numeric.contains(name) {
            return Err(PipelineError::DataFormat(format!("required column '{}' is not numeric", name)));
        }
    }
    Ok(())
}

fn write_cleaned(dataset: &Dataset, source: &Path, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    let target = dir.join(format!("{}_cleaned.csv", stem));

    let mut file = File::create(&target)?;
    let mut df = dataset.frame().clone();
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(target)
}
