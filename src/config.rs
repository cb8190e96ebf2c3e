use serde::Deserialize;
use thiserror::Error;

/// Knobs for the checker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckOptions {
    /// Record an informational entry for every accepted check step.
    pub trace: bool,
    /// Reject index expressions that are not integer literals instead of
    /// deferring their bounds check to runtime.
    pub literal_indices_only: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub typecheck: CheckOptions,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {message}")]
    Parse { message: String },
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|error| ConfigError::Parse {
            message: error.to_string(),
        })
    }
}
