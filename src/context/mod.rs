//! Application context: the host that configuration is applied to.

mod container;
mod environment;
mod error;
mod expand;
mod settings;

pub use container::{
    Constructor, Container, Service, ServiceDefinition, ServiceOptions, ServiceTarget,
};
pub use environment::{Environment, ENVIRONMENT_VARIABLE};
pub use error::HostError;
pub use expand::expand;
pub use settings::{KnownSetting, RuntimeSettings};

use toml::Value;

/// Capabilities the configurator needs from the application it configures.
///
/// [`AppContext`] is the in-memory implementation. Hosts are mutated in
/// place and assume exclusive access for the duration of a
/// [`Configurator::apply`](crate::Configurator::apply) call.
pub trait Host {
    /// Name of the running environment, e.g. `production`.
    fn environment_name(&self) -> &str;

    /// Stores a variable, replacing any previous value.
    fn set_variable(&mut self, name: &str, value: Value) -> Result<(), HostError>;

    /// Expands `%name%` placeholders in `input`.
    fn expand(&self, input: &str) -> Result<String, HostError>;

    /// Removes a service registration. Unknown keys are not an error.
    fn remove_service(&mut self, key: &str) -> Result<(), HostError>;

    /// Registers a service under `definition.key`.
    fn add_service(&mut self, definition: ServiceDefinition) -> Result<(), HostError>;

    /// Makes `alias` resolve to the service registered under `key`.
    fn add_alias(&mut self, alias: &str, key: &str) -> Result<(), HostError>;

    /// Returns the service, constructing it if it has not been built yet.
    fn get_service(&mut self, key: &str) -> Result<Service, HostError>;

    /// Applies one flattened runtime setting.
    ///
    /// Hosts report a switched-off settings mechanism with
    /// [`HostError::SettingsDisabled`].
    fn apply_setting(&mut self, key: &str, value: &Value) -> Result<(), HostError>;

    /// Defines a constant. Redefinition is an error.
    fn define_constant(&mut self, name: &str, value: Value) -> Result<(), HostError>;

    /// Turns a mode flag on or off.
    fn set_mode(&mut self, name: &str, state: bool) -> Result<(), HostError>;
}

/// Central application context holding the environment, the service
/// container and the runtime settings.
///
/// ## Example
///
/// ```
/// use bootstrap_fnd::{AppContext, Configurator, RuntimeSettings};
///
/// let mut ctx = AppContext::builder()
///     .with_name("development")
///     .with_variable("appDir", "/srv/app")
///     .with_settings(RuntimeSettings::new())
///     .build();
///
/// let tree: toml::Table = toml::from_str(r#"
///     [php]
///     "date.timezone" = "Europe/Prague"
/// "#)?;
///
/// Configurator::new().apply(tree, &mut ctx)?;
/// assert_eq!(ctx.settings().timezone(), Some("Europe/Prague"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct AppContext {
    environment: Environment,
    container: Container,
    settings: RuntimeSettings,
}

impl AppContext {
    /// Creates a new builder for constructing an `AppContext`.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    /// Returns a reference to the environment.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Returns a mutable reference to the environment.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// Returns a reference to the service container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Returns a mutable reference to the service container.
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Returns a reference to the runtime settings.
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }
}

impl Host for AppContext {
    fn environment_name(&self) -> &str {
        self.environment.name()
    }

    fn set_variable(&mut self, name: &str, value: Value) -> Result<(), HostError> {
        self.environment.set_variable(name, value);
        Ok(())
    }

    fn expand(&self, input: &str) -> Result<String, HostError> {
        self.environment.expand(input)
    }

    fn remove_service(&mut self, key: &str) -> Result<(), HostError> {
        self.container.remove_service(key);
        Ok(())
    }

    fn add_service(&mut self, definition: ServiceDefinition) -> Result<(), HostError> {
        self.container.add_service(definition)
    }

    fn add_alias(&mut self, alias: &str, key: &str) -> Result<(), HostError> {
        self.container.add_alias(alias, key)
    }

    fn get_service(&mut self, key: &str) -> Result<Service, HostError> {
        self.container.get_service(key)
    }

    fn apply_setting(&mut self, key: &str, value: &Value) -> Result<(), HostError> {
        self.settings.apply(key, value)
    }

    fn define_constant(&mut self, name: &str, value: Value) -> Result<(), HostError> {
        self.environment.define_constant(name, value)
    }

    fn set_mode(&mut self, name: &str, state: bool) -> Result<(), HostError> {
        self.environment.set_mode(name, state);
        Ok(())
    }
}

/// Builder for constructing an [`AppContext`].
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder {
    name: Option<String>,
    variables: Vec<(String, Value)>,
    container: Option<Container>,
    settings: Option<RuntimeSettings>,
}

impl AppContextBuilder {
    /// Sets the environment name. Defaults to `production`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Presets a variable, e.g. `appDir`.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Uses a prepared container, typically one with constructors registered.
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Uses the given settings sink, e.g. [`RuntimeSettings::disabled`].
    pub fn with_settings(mut self, settings: RuntimeSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Builds the `AppContext`.
    pub fn build(self) -> AppContext {
        let mut environment = Environment::new(self.name.unwrap_or_else(|| "production".into()));
        for (name, value) in self.variables {
            environment.set_variable(name, value);
        }

        AppContext {
            environment,
            container: self.container.unwrap_or_default(),
            settings: self.settings.unwrap_or_default(),
        }
    }
}
