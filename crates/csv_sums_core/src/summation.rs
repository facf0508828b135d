use std::io;

use csv::{Terminator, WriterBuilder};

use crate::error::ProcessError;
use crate::matrix::{NumericMatrix, Shape};

/// Per-column totals, always rendered as exactly one CSV row.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSums(Vec<f64>);

impl ColumnSums {
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-separated values terminated by `\n`, using the shortest
    /// representation that round-trips each `f64`. `Display` never switches
    /// to exponent notation, so `1e300` renders as all 301 digits.
    pub fn to_csv_row(&self) -> Result<Vec<u8>, ProcessError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(self.0.iter().map(f64::to_string))
            .map_err(io::Error::from)?;
        let row = writer
            .into_inner()
            .map_err(|error| io::Error::new(error.error().kind(), error.to_string()))?;
        Ok(row)
    }
}

impl NumericMatrix {
    pub fn column_sums(&self) -> ColumnSums {
        match self.shape() {
            Shape::Vector => ColumnSums(vec![self.values().iter().sum()]),
            Shape::Table => {
                let mut sums = vec![0.0; self.columns()];
                for row in self.values().chunks_exact(self.columns()) {
                    for (total, value) in sums.iter_mut().zip(row) {
                        *total += value;
                    }
                }
                ColumnSums(sums)
            }
        }
    }
}
