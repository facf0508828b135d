use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const DIST_DIR: &str = "infra/aws_csv_sums/dist";
const ARTIFACT: &str = "dispatch.zip";

/// (package, binary, path inside the Lambda zip)
const LAMBDA_BINARIES: [(&str, &str, &str); 2] = [
    ("csv_sums_lambda", "dispatch_lambda", "bootstrap"),
    ("csv_sums_cli", "csv-sums", "bin/csv-sums"),
];

const TESTED_PACKAGES: [&str; 3] = ["csv_sums_core", "csv_sums_cli", "csv_sums_lambda"];

#[derive(Parser)]
#[command(name = "xtask", about = "Task runner for the csv-sums workspace")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Sum the columns of a local CSV file with the csv-sums binary
    Sum { input: String, output: String },
    /// Run formatting, clippy and tests
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the Lambda binaries and zip them for deployment
    ServerlessPackage {
        /// Target triple of the Lambda runtime
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build without optimisations
        #[arg(long)]
        debug: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CiJob {
    Lint,
    Test,
    Check,
}

fn cargo(args: &[&str]) {
    eprintln!("$ cargo {}", args.join(" "));
    match Command::new("cargo").args(args).status() {
        Ok(status) if status.success() => {}
        Ok(status) => exit(status.code().unwrap_or(1)),
        Err(error) => {
            eprintln!("could not run cargo: {error}");
            exit(1);
        }
    }
}

fn lint() {
    cargo(&["fmt", "--all", "--", "--check"]);
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]);
}

fn test() {
    for package in TESTED_PACKAGES {
        cargo(&["test", "-p", package]);
    }
}

fn package(target: &str, debug: bool) -> io::Result<PathBuf> {
    for (package, bin, _) in LAMBDA_BINARIES {
        let mut args = vec!["build", "-p", package, "--bin", bin, "--target", target];
        if !debug {
            args.push("--release");
        }
        cargo(&args);
    }

    let build_dir = Path::new("target")
        .join(target)
        .join(if debug { "debug" } else { "release" });
    fs::create_dir_all(DIST_DIR)?;
    let zip_path = Path::new(DIST_DIR).join(ARTIFACT);

    let mut zip = ZipWriter::new(File::create(&zip_path)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    for (_, bin, entry) in LAMBDA_BINARIES {
        let binary = fs::read(build_dir.join(bin)).map_err(|error| {
            io::Error::new(error.kind(), format!("{bin} was not built: {error}"))
        })?;
        zip.start_file(entry, options)?;
        zip.write_all(&binary)?;
    }
    zip.finish()?;
    Ok(zip_path)
}

fn main() {
    match Cli::parse().command {
        Task::Sum { input, output } => {
            cargo(&["run", "-q", "-p", "csv_sums_cli", "--", &input, &output]);
        }
        Task::Ci { job } => {
            if matches!(job, CiJob::Lint | CiJob::Check) {
                lint();
            }
            if matches!(job, CiJob::Test | CiJob::Check) {
                test();
            }
        }
        Task::ServerlessPackage { target, debug } => match package(&target, debug) {
            Ok(zip_path) => eprintln!(
                "wrote {}; set PROCESSOR_COMMAND=/var/task/bin/csv-sums to sum out of process",
                zip_path.display()
            ),
            Err(error) => {
                eprintln!("packaging failed: {error}");
                exit(1);
            }
        },
    }
}
