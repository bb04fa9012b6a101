//! Feature/target framing

use super::Dataset;
use crate::error::Result;
use crate::schema::{FeatureSchema, TargetSchema};
use ndarray::Array2;

/// Select feature and target columns, in schema order, into row-major
/// matrices. An absent column is a `ColumnMissing` error; no default is
/// substituted.
pub fn frame(
    dataset: &Dataset,
    features: &FeatureSchema,
    targets: &TargetSchema,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let x = columns_to_array2(dataset, features.names())?;
    let y = columns_to_array2(dataset, targets.names())?;
    Ok((x, y))
}

/// Collect named columns as contiguous vectors, then lay them out row-major
fn columns_to_array2(dataset: &Dataset, names: &[String]) -> Result<Array2<f64>> {
    let col_data: Vec<Vec<f64>> = names
        .iter()
        .map(|name| dataset.numeric_values(name))
        .collect::<Result<_>>()?;

    let n_rows = dataset.height();
    Ok(Array2::from_shape_fn((n_rows, names.len()), |(r, c)| col_data[c][r]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use polars::prelude::*;

    fn dataset() -> Dataset {
        let df = df!(
            "o3" => &[1.0, 2.0, 3.0],
            "no2" => &[4.0, 5.0, 6.0],
            "copd" => &[7.0, 8.0, 9.0]
        )
        .unwrap();
        Dataset::new(df, None)
    }

    #[test]
    fn test_frame_follows_schema_order() {
        let features = FeatureSchema::new(["no2", "o3"]).unwrap();
        let targets = TargetSchema::new(["copd"]).unwrap();
        let (x, y) = frame(&dataset(), &features, &targets).unwrap();

        assert_eq!(x.dim(), (3, 2));
        assert_eq!(x.row(0).to_vec(), vec![4.0, 1.0]);
        assert_eq!(y.column(0).to_vec(), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_missing_column_is_reported_by_name() {
        let features = FeatureSchema::new(["no2", "pm10"]).unwrap();
        let targets = TargetSchema::new(["copd"]).unwrap();
        let err = frame(&dataset(), &features, &targets).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnMissing(name) if name == "pm10"));
    }
}
