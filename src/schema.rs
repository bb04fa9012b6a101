//! Column schemas bound to a trained artifact
//!
//! A [`FeatureSchema`] fixes the name, count and order of the input columns a
//! model was trained on; a [`TargetSchema`] does the same for its outputs.
//! Both are validated when constructed, so a schema that exists is always
//! non-empty and free of duplicates.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered list of column names, validated at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
struct ColumnList(Vec<String>);

impl ColumnList {
    fn new(kind: &str, names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(PipelineError::Config(format!("{} schema must name at least one column", kind)));
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(PipelineError::Config(format!("{} schema contains an empty column name", kind)));
            }
            if !seen.insert(name.as_str()) {
                return Err(PipelineError::Config(format!("{} schema lists '{}' twice", kind, name)));
            }
        }
        Ok(Self(names))
    }
}

impl TryFrom<Vec<String>> for ColumnList {
    type Error = PipelineError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new("column", names)
    }
}

impl From<ColumnList> for Vec<String> {
    fn from(list: ColumnList) -> Self {
        list.0
    }
}

/// Input columns of a model, in the exact order the scaler was fitted on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: ColumnList,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect();
        Ok(Self { columns: ColumnList::new("feature", names)? })
    }

    pub fn names(&self) -> &[String] {
        &self.columns.0
    }

    pub fn len(&self) -> usize {
        self.columns.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.0.is_empty()
    }

    /// Position of a feature in the model input vector
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .0
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::ColumnMissing(name.to_string()))
    }

    /// Fail unless a row or matrix width matches this schema
    pub fn check_width(&self, actual: usize) -> Result<()> {
        if actual != self.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.len(),
                actual,
            });
        }
        Ok(())
    }
}

/// Output columns of a model; output index `i` is the target `names()[i]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSchema {
    columns: ColumnList,
}

impl TargetSchema {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect();
        Ok(Self { columns: ColumnList::new("target", names)? })
    }

    pub fn names(&self) -> &[String] {
        &self.columns.0
    }

    pub fn len(&self) -> usize {
        self.columns.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.0.is_empty()
    }

    /// Position of a target in the model output vector
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .0
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::ColumnMissing(name.to_string()))
    }
}
