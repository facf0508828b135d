//! Column summation over numeric CSV and the routing rules around it.
//!
//! This crate owns the processing contract and the pure parts of event
//! dispatch. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod config;
pub mod contract;
pub mod error;
pub mod matrix;
pub mod object_keys;
pub mod processor;
pub mod summation;

pub use config::{DispatchConfig, ProcessorSelection, StorageSettings};
pub use error::{ConfigError, MalformedInput, ProcessError};
pub use matrix::{NumericMatrix, Shape};
pub use processor::{ColumnSumProcessor, ExternalCommandProcessor, Processor};
pub use summation::ColumnSums;
