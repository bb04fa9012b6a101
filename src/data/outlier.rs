//! IQR outlier filter
//!
//! Bounds are computed per numeric column as `[Q1 - k*IQR, Q3 + k*IQR]` with
//! linearly interpolated quartiles. A row survives only if *every* numeric
//! column is inside its bounds, so loosely correlated columns can remove a
//! large share of the rows.

use super::Dataset;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fitted bounds for a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Conjunctive row filter over all numeric columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IqrFilter {
    factor: f64,
    bounds: Vec<(String, OutlierBounds)>,
}

impl IqrFilter {
    /// Compute bounds for every numeric column of `dataset`
    pub fn fit(dataset: &Dataset, factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor >= 0.0) {
            return Err(PipelineError::Config(format!("IQR factor must be a non-negative number, got {}", factor)));
        }

        let mut bounds = Vec::new();
        for name in dataset.numeric_columns() {
            let ca = dataset.numeric_chunked(&name)?;
            let q1 = ca.quantile(0.25, QuantileMethod::Linear)?;
            let q3 = ca.quantile(0.75, QuantileMethod::Linear)?;
            let (Some(q1), Some(q3)) = (q1, q3) else {
                continue;
            };
            let iqr = q3 - q1;
            bounds.push((
                name,
                OutlierBounds {
                    q1,
                    q3,
                    lower: q1 - factor * iqr,
                    upper: q3 + factor * iqr,
                },
            ));
        }

        Ok(Self { factor, bounds })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn bounds(&self) -> &[(String, OutlierBounds)] {
        &self.bounds
    }

    /// `true` for each row whose numeric values are all within bounds
    pub fn mask(&self, dataset: &Dataset) -> Result<BooleanChunked> {
        let mut keep = BooleanChunked::full("keep".into(), true, dataset.height());
        for (name, bounds) in &self.bounds {
            let ca = dataset.numeric_chunked(name)?;
            let inside = &ca.gt_eq(bounds.lower) & &ca.lt_eq(bounds.upper);
            keep = &keep & &inside;
        }
        Ok(keep)
    }

    /// Drop every row with at least one out-of-bounds numeric value
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        let mask = self.mask(dataset)?;
        dataset.retain_rows(&mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quartiles_are_linearly_interpolated() {
        let ds = Dataset::new(df!("no2" => &[4.0, 1.0, 3.0, 2.0]).unwrap(), None);
        let filter = IqrFilter::fit(&ds, 1.5).unwrap();
        let (name, bounds) = &filter.bounds()[0];
        assert_eq!(name, "no2");
        assert!((bounds.q1 - 1.75).abs() < 1e-12);
        assert!((bounds.q3 - 3.25).abs() < 1e-12);
        assert!((bounds.lower - (1.75 - 1.5 * 1.5)).abs() < 1e-12);
        assert!((bounds.upper - (3.25 + 1.5 * 1.5)).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_column() {
        let ds = Dataset::new(df!("o3" => &[7.0]).unwrap(), None);
        let filter = IqrFilter::fit(&ds, 1.5).unwrap();
        assert_eq!(filter.bounds()[0].1.q1, 7.0);
        assert_eq!(filter.bounds()[0].1.q3, 7.0);
    }

    #[test]
    fn test_filter_is_conjunctive() {
        // row 4 is an outlier only in `a`, row 5 only in `b`
        let df = df!(
            "a" => &[1.0, 2.0, 3.0, 2.0, 100.0, 2.0],
            "b" => &[5.0, 6.0, 5.0, 6.0, 5.0, -90.0],
            "label" => &["x", "y", "z", "x", "y", "z"]
        )
        .unwrap();
        let ds = Dataset::new(df, None);

        let filter = IqrFilter::fit(&ds, 1.5).unwrap();
        assert_eq!(filter.bounds().len(), 2, "text columns are not filtered");

        let mask: Vec<bool> = filter.mask(&ds).unwrap().into_no_null_iter().collect();
        assert_eq!(mask, vec![true, true, true, true, false, false]);

        let cleaned = filter.apply(&ds).unwrap();
        assert_eq!(cleaned.height(), 4);
    }

    #[test]
    fn test_constant_column_keeps_equal_values() {
        let df = df!("c" => &[3.0, 3.0, 3.0]).unwrap();
        let ds = Dataset::new(df, None);
        let cleaned = IqrFilter::fit(&ds, 1.5).unwrap().apply(&ds).unwrap();
        assert_eq!(cleaned.height(), 3);
    }

    #[test]
    fn test_rejects_negative_factor() {
        let ds = Dataset::new(df!("c" => &[1.0]).unwrap(), None);
        assert!(matches!(IqrFilter::fit(&ds, -1.0), Err(PipelineError::Config(_))));
    }
}
