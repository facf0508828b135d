use crate::error::ConfigError;
use crate::processor::{ColumnSumProcessor, ExternalCommandProcessor, Processor};

pub const DEFAULT_INPUT_PREFIX: &str = "try-lambda/in/";
pub const DEFAULT_OUTPUT_PREFIX: &str = "try-lambda/out/";

pub const INPUT_PREFIX_VAR: &str = "IN_PREFIX";
pub const OUTPUT_PREFIX_VAR: &str = "OUT_PREFIX";
pub const PROCESSOR_COMMAND_VAR: &str = "PROCESSOR_COMMAND";
pub const PROCESSOR_ARGS_VAR: &str = "PROCESSOR_ARGS";
pub const S3_ENDPOINT_URL_VAR: &str = "S3_ENDPOINT_URL";
pub const S3_FORCE_PATH_STYLE_VAR: &str = "S3_FORCE_PATH_STYLE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorSelection {
    InProcess,
    External { program: String, args: Vec<String> },
}

impl ProcessorSelection {
    pub fn build(&self) -> Box<dyn Processor> {
        match self {
            Self::InProcess => Box::new(ColumnSumProcessor),
            Self::External { program, args } => {
                Box::new(ExternalCommandProcessor::new(program).with_args(args.clone()))
            }
        }
    }
}

/// Connection parameters handed to the storage client. Credentials and
/// region come from the client's own default provider chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSettings {
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub input_prefix: String,
    pub output_prefix: String,
    pub processor: ProcessorSelection,
    pub storage: StorageSettings,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            input_prefix: DEFAULT_INPUT_PREFIX.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            processor: ProcessorSelection::InProcess,
            storage: StorageSettings::default(),
        }
    }
}

impl DispatchConfig {
    pub fn new(
        input_prefix: impl Into<String>,
        output_prefix: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            input_prefix: input_prefix.into(),
            output_prefix: output_prefix.into(),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let processor = match non_blank(lookup(PROCESSOR_COMMAND_VAR)) {
            Some(program) => ProcessorSelection::External {
                program,
                args: lookup(PROCESSOR_ARGS_VAR)
                    .map(|value| value.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
            },
            None => ProcessorSelection::InProcess,
        };

        let force_path_style = match non_blank(lookup(S3_FORCE_PATH_STYLE_VAR)) {
            Some(value) => parse_flag(S3_FORCE_PATH_STYLE_VAR, &value)?,
            None => false,
        };

        let config = Self {
            input_prefix: lookup(INPUT_PREFIX_VAR)
                .unwrap_or_else(|| DEFAULT_INPUT_PREFIX.to_string()),
            output_prefix: lookup(OUTPUT_PREFIX_VAR)
                .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
            processor,
            storage: StorageSettings {
                endpoint_url: non_blank(lookup(S3_ENDPOINT_URL_VAR)),
                force_path_style,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Results written under the input prefix would trigger another run on
    /// their own output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_prefix.starts_with(&self.input_prefix) {
            return Err(ConfigError::OutputUnderInputPrefix {
                input_prefix: self.input_prefix.clone(),
                output_prefix: self.output_prefix.clone(),
            });
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}
