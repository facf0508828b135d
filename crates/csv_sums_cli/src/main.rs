use std::fs::{self, File};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use csv_sums_core::processor::{EXIT_IO_FAILURE, EXIT_MALFORMED_INPUT};
use csv_sums_core::{ColumnSumProcessor, ProcessError, Processor};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "csv-sums",
    about = "Sum each column of a numeric CSV file into a single CSV row"
)]
struct Cli {
    /// Filesystem path to the input CSV file
    input: PathBuf,
    /// Filesystem path where the output CSV file will be written
    output: PathBuf,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "CSV_SUMS_LOG", default_value = "warn")]
    log_level: String,
}

fn run(cli: &Cli) -> Result<(), ProcessError> {
    let mut source = File::open(&cli.input)?;
    let mut output = Vec::new();
    ColumnSumProcessor.transform(&mut source, &mut output)?;

    // Only create the output file once the whole input has been summed.
    fs::write(&cli.output, &output)?;
    debug!(output = %cli.output.display(), bytes = output.len(), "wrote column sums");
    Ok(())
}

fn exit_code(error: &ProcessError) -> u8 {
    let code = match error {
        ProcessError::MalformedInput(_) => EXIT_MALFORMED_INPUT,
        ProcessError::Io(_) => EXIT_IO_FAILURE,
        ProcessError::External { .. } => 1,
    };
    code as u8
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match run(&cli) {
        Ok(()) => {
            println!("complete");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}: {error}", cli.input.display());
            ExitCode::from(exit_code(&error))
        }
    }
}
