use crate::config::ConfigError;
use crate::context::HostError;
use thiserror::Error;

/// Top-level error type for the bootstrap-fnd library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("host error: {0}")]
    Host(#[from] HostError),
}
