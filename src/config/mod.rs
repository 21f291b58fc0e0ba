//! Configuration loading.

mod builder;
mod env;
mod error;
mod file;
mod section;
mod source;

pub use builder::Config;
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::FileSource;
pub use section::{select_section, EXTENDS_KEY};
pub use source::{ConfigEntry, ConfigSource};
