//! Parsing of comma-separated numeric text into a dense row-major matrix.

use csv::{ReaderBuilder, Trim};

use crate::error::MalformedInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single value or a single column of values.
    Vector,
    /// Rows by columns, including a lone row with several columns.
    Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericMatrix {
    rows: usize,
    columns: usize,
    values: Vec<f64>,
}

impl NumericMatrix {
    /// Parses CSV text without a header row.
    ///
    /// Cells are trimmed, blank lines and `#` comment lines are skipped, and
    /// every remaining cell must hold a finite number. Rows must all have the
    /// width of the first row.
    pub fn parse(input: &[u8]) -> Result<Self, MalformedInput> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .comment(Some(b'#'))
            .from_reader(input);

        let mut rows = 0usize;
        let mut columns = 0usize;
        let mut values = Vec::new();

        for (index, record) in reader.byte_records().enumerate() {
            let record = record.map_err(|error| MalformedInput::Csv(error.to_string()))?;
            if is_blank(&record) {
                continue;
            }

            let line = record
                .position()
                .map(|position| position.line())
                .unwrap_or(index as u64 + 1);

            if rows == 0 {
                columns = record.len();
            } else if record.len() != columns {
                return Err(MalformedInput::RaggedRow {
                    line,
                    expected: columns,
                    found: record.len(),
                });
            }

            for (column, cell) in record.iter().enumerate() {
                values.push(parse_cell(cell, line, column + 1)?);
            }
            rows += 1;
        }

        if rows == 0 {
            return Err(MalformedInput::Empty);
        }

        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn shape(&self) -> Shape {
        if self.columns == 1 {
            Shape::Vector
        } else {
            Shape::Table
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.columns;
        Some(&self.values[start..start + self.columns])
    }
}

fn is_blank(record: &csv::ByteRecord) -> bool {
    record.len() == 1 && record[0].is_empty()
}

fn parse_cell(cell: &[u8], line: u64, column: usize) -> Result<f64, MalformedInput> {
    let non_numeric = || MalformedInput::NonNumericCell {
        line,
        column,
        value: String::from_utf8_lossy(cell).into_owned(),
    };

    let text = std::str::from_utf8(cell).map_err(|_| non_numeric())?;
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(non_numeric()),
    }
}
