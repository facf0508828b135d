//! The processing capability invoked once per object.
//!
//! Two implementations share one contract: read CSV from a source, write a
//! single CSV row of column sums to a sink. Nothing reaches the sink unless
//! the whole transform succeeded.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{MalformedInput, ProcessError};
use crate::matrix::NumericMatrix;

/// Exit code used by `csv-sums` for rejected input (`EX_DATAERR`).
pub const EXIT_MALFORMED_INPUT: i32 = 65;
/// Exit code used by `csv-sums` for unreadable input or unwritable output (`EX_IOERR`).
pub const EXIT_IO_FAILURE: i32 = 74;

pub trait Processor: Send + Sync {
    fn name(&self) -> &str;

    fn transform(&self, source: &mut dyn Read, sink: &mut dyn Write) -> Result<(), ProcessError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnSumProcessor;

impl Processor for ColumnSumProcessor {
    fn name(&self) -> &str {
        "in_process"
    }

    fn transform(&self, source: &mut dyn Read, sink: &mut dyn Write) -> Result<(), ProcessError> {
        let mut input = Vec::new();
        source.read_to_end(&mut input)?;

        let matrix = NumericMatrix::parse(&input)?;
        let sums = matrix.column_sums();
        debug!(
            rows = matrix.rows(),
            columns = matrix.columns(),
            "computed column sums"
        );

        sink.write_all(&sums.to_csv_row()?)?;
        sink.flush()?;
        Ok(())
    }
}

/// Runs `program [args..] <input path> <output path>` against spilled copies
/// of the source, following the `csv-sums` exit code convention.
#[derive(Debug, Clone)]
pub struct ExternalCommandProcessor {
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalCommandProcessor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn failure(&self, detail: impl Into<String>) -> ProcessError {
        ProcessError::External {
            program: self.program.display().to_string(),
            detail: detail.into(),
        }
    }
}

impl Processor for ExternalCommandProcessor {
    fn name(&self) -> &str {
        "external_command"
    }

    fn transform(&self, source: &mut dyn Read, sink: &mut dyn Write) -> Result<(), ProcessError> {
        let workspace = tempfile::tempdir()?;
        let input_path = workspace.path().join("input.csv");
        let output_path = workspace.path().join("output.csv");

        {
            let mut input_file = File::create(&input_path)?;
            io::copy(source, &mut input_file)?;
            input_file.flush()?;
        }

        debug!(program = %self.program.display(), "running external processor");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&input_path)
            .arg(&output_path)
            .output()
            .map_err(|error| self.failure(format!("failed to spawn: {error}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if output.status.code() == Some(EXIT_MALFORMED_INPUT) {
                return Err(MalformedInput::Rejected(stderr).into());
            }
            return Err(self.failure(format!("{}: {stderr}", output.status)));
        }

        let body = fs::read(&output_path)
            .map_err(|error| self.failure(format!("no output produced: {error}")))?;
        sink.write_all(&body)?;
        sink.flush()?;
        Ok(())
    }
}
