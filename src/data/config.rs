//! Cleaning configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options controlling how a raw CSV becomes a cleaned [`Dataset`](super::Dataset)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Column holding a date string, parsed with `date_format`
    pub date_column: Option<String>,

    /// chrono format of the date column; a year-month format is completed
    /// to the first day of the month
    pub date_format: String,

    /// Grouping separator stripped from numeric fields before parsing
    pub thousands_separator: Option<char>,

    /// Columns that must exist and be numeric
    pub required_columns: Vec<String>,

    /// Drop rows outside the IQR bounds of any numeric column
    pub outlier_filter: bool,

    /// IQR multiplier for the outlier bounds
    pub iqr_factor: f64,

    /// Directory the cleaned dataset is written to as `<stem>_cleaned.csv`
    pub cache_dir: Option<PathBuf>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            date_column: None,
            date_format: "%Y-%m".to_string(),
            thousands_separator: Some(','),
            required_columns: Vec::new(),
            outlier_filter: true,
            iqr_factor: 1.5,
            cache_dir: None,
        }
    }
}

impl CleaningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(column.into());
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_thousands_separator(mut self, separator: Option<char>) -> Self {
        self.thousands_separator = separator;
        self
    }

    pub fn with_required_columns(mut self, columns: Vec<String>) -> Self {
        self.required_columns = columns;
        self
    }

    pub fn with_outlier_filter(mut self, enabled: bool) -> Self {
        self.outlier_filter = enabled;
        self
    }

    pub fn with_iqr_factor(mut self, factor: f64) -> Self {
        self.iqr_factor = factor;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }
}
