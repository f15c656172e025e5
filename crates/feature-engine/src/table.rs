//! Labeled feature table

use crate::error::{ExtractionError, Result};
use crate::resolver::ResolvedPlan;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Default channel labels `ch0, ch1, ...`
pub fn channel_labels(n_channels: usize) -> Vec<String> {
    (0..n_channels).map(|i| format!("ch{}", i)).collect()
}

/// Feature matrix with one label per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureTable {
    /// Pair a matrix with its column labels
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(ExtractionError::InvalidShape {
                shape: values.shape().to_vec(),
                reason: format!("{} column labels for {} columns", columns.len(), values.ncols()),
            });
        }
        Ok(Self { columns, values })
    }

    /// Label the output of a plan run over `channels`
    pub fn from_matrix<S: AsRef<str>>(values: Array2<f64>, channels: &[S], plan: &ResolvedPlan) -> Result<Self> {
        Self::new(plan.column_labels(channels), values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Values of the column labeled `name`
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values.index_axis(Axis(1), i))
    }

    /// Header line plus one line per epoch
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", self.columns.join(","))?;
        for row in self.values.rows() {
            let line: Vec<String> = row.iter().map(f64::to_string).collect();
            writeln!(writer, "{}", line.join(","))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Compact binary encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let table: Self = postcard::from_bytes(bytes)?;
        Self::new(table.columns, table.values)
    }
}
