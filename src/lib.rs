pub mod config;
pub mod configurator;
pub mod context;
mod error;
mod value;

pub use config::{Config, ConfigError};
pub use configurator::{AppliedConfig, ConfigInput, Configurator, ServiceSpec};
pub use context::{
    AppContext, Container, Environment, Host, HostError, RuntimeSettings, Service,
    ServiceDefinition, ServiceOptions, ServiceTarget,
};
pub use error::Error;
