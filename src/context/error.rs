use thiserror::Error;

/// Failures reported by a [`Host`](super::Host) capability.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HostError {
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("circular reference detected for variable: {0}")]
    CircularVariable(String),

    #[error("cannot expand non-scalar variable: {0}")]
    NonScalarVariable(String),

    #[error("service not found: {0}")]
    UnknownService(String),

    #[error("invalid service key: '{0}'")]
    InvalidServiceKey(String),

    #[error("no constructor registered for '{target}' (service {key})")]
    MissingConstructor { key: String, target: String },

    #[error("failed to construct service {key}: {reason}")]
    ServiceConstruction { key: String, reason: String },

    #[error("constant already defined: {0}")]
    DuplicateConstant(String),

    #[error("invalid value for setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("cannot apply setting '{0}': generic settings mechanism is disabled")]
    SettingsDisabled(String),
}
