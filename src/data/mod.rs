//! Dataset loading, cleaning and framing
//!
//! - [`loader`] reads a delimited file and drops missing values and outliers
//! - [`outlier`] holds the conjunctive IQR row filter
//! - [`frame`] turns named columns into feature/target matrices
//! - [`split`] produces the seeded train/test partition

mod config;
pub mod frame;
pub mod loader;
pub mod outlier;
pub mod split;

pub use config::CleaningConfig;
pub use frame::frame;
pub use loader::load_and_clean;
pub use outlier::{IqrFilter, OutlierBounds};
pub use split::{train_test_split, TrainTestSplit};

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A tabular dataset: numeric (`Float64`) columns, at most one date column,
/// and any text columns that did not parse as numbers
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    date_column: Option<String>,
}

/// Per-column statistics reported by [`Dataset::summary`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Dataset {
    pub fn new(df: DataFrame, date_column: Option<String>) -> Self {
        Self { df, date_column }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn date_column(&self) -> Option<&str> {
        self.date_column.as_deref()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Names of the numeric columns, in file order
    pub fn numeric_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|col| col.dtype() == &DataType::Float64)
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Borrow a numeric column as a chunked array
    pub fn numeric_chunked(&self, name: &str) -> Result<&Float64Chunked> {
        let column = self
            .df
            .column(name)
            .map_err(|_| PipelineError::ColumnMissing(name.to_string()))?;

        if column.dtype() != &DataType::Float64 {
            return Err(PipelineError::DataFormat(format!(
                "column '{}' is {:?}, expected numeric",
                name,
                column.dtype()
            )));
        }

        Ok(column.as_materialized_series().f64()?)
    }

    /// Values of a numeric column; nulls are a format error
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        self.numeric_chunked(name)?
            .into_iter()
            .map(|v| {
                v.ok_or_else(|| {
                    PipelineError::DataFormat(format!("column '{}' contains missing values", name))
                })
            })
            .collect()
    }

    /// Keep the rows where `mask` is true; null mask entries drop the row
    pub fn retain_rows(&self, mask: &BooleanChunked) -> Result<Self> {
        if mask.len() != self.height() {
            return Err(PipelineError::Validation(format!(
                "row mask has {} entries for {} rows",
                mask.len(),
                self.height()
            )));
        }
        Ok(Self {
            df: self.df.filter(mask)?,
            date_column: self.date_column.clone(),
        })
    }

    /// Drop every row holding a null in any column
    pub fn drop_nulls(&self) -> Result<Self> {
        Ok(Self {
            df: self.df.drop_nulls::<String>(None)?,
            date_column: self.date_column.clone(),
        })
    }

    /// Min/max/mean of every numeric column
    pub fn summary(&self) -> Result<Vec<ColumnSummary>> {
        self.numeric_columns()
            .into_iter()
            .map(|name| -> Result<ColumnSummary> {
                let ca = self.numeric_chunked(&name)?;
                Ok(ColumnSummary {
                    count: ca.len() - ca.null_count(),
                    min: ca.min().unwrap_or(f64::NAN),
                    max: ca.max().unwrap_or(f64::NAN),
                    mean: ca.mean().unwrap_or(f64::NAN),
                    name,
                })
            })
            .collect()
    }
}
