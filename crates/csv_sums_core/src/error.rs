use std::io;

use thiserror::Error;

/// The input could not be read as a rectangular block of numbers.
///
/// `line` is the 1-based physical line of the offending record, counting
/// skipped blank and `#` comment lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedInput {
    #[error("input contains no numeric rows")]
    Empty,

    #[error("line {line}, column {column}: `{value}` is not a finite number")]
    NonNumericCell {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("line {line} has {found} columns, expected {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("malformed csv: {0}")]
    Csv(String),

    /// Reported by an external processor that rejected its input.
    #[error("input rejected by external processor: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    MalformedInput(#[from] MalformedInput),

    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    #[error("external processor `{program}` failed: {detail}")]
    External { program: String, detail: String },
}

impl ProcessError {
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedInput(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("output prefix `{output_prefix}` falls under input prefix `{input_prefix}`; results would re-trigger processing")]
    OutputUnderInputPrefix {
        input_prefix: String,
        output_prefix: String,
    },

    #[error("{name} must be `true`, `false`, `1` or `0`, got `{value}`")]
    InvalidFlag { name: &'static str, value: String },
}
