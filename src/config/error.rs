use std::path::PathBuf;
use thiserror::Error;

use crate::context::HostError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),

    #[error("section '{section}' extends unknown section '{parent}'")]
    UnknownSection { section: String, parent: String },

    #[error("circular section inheritance detected at '{0}'")]
    CircularSection(String),

    #[error("factory method is not specified for service {key}")]
    MissingFactory { key: String },

    #[error("invalid definition for service {key}: {reason}")]
    InvalidService { key: String, reason: String },

    #[error("configuration value for directive '{key}' is not scalar")]
    InvalidSettingValue { key: String },

    #[error("cannot apply directive '{key}': runtime settings are disabled")]
    SettingsDisabled { key: String },

    #[error("state of mode '{mode}' is not scalar")]
    InvalidModeValue { mode: String },

    #[error(transparent)]
    Host(#[from] HostError),
}
