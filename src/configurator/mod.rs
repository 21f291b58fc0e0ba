//! Applies a configuration tree to a [`Host`].
//!
//! The tree's top-level sections are processed in a fixed order:
//!
//! 1. `variable`: registered into the host's variable store
//! 2. every string in the tree is expanded (`%name%`)
//! 3. `service`: services, aliases and the list of services to start
//! 4. `php` (or legacy `set`): flattened runtime settings
//! 5. `const`: constants
//! 6. `mode`: mode flags
//! 7. services marked `run = true` are instantiated
//!
//! Any error aborts the run. Changes already made to the host are kept.

mod services;
mod settings;
mod variables;

pub use services::{normalize_key, ServiceSpec};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::config::{Config, ConfigError};
use crate::context::{AppContext, Container, Host, HostError, ServiceDefinition, ServiceTarget};
use crate::value::as_flag;

pub const VARIABLE_KEY: &str = "variable";
pub const SERVICE_KEY: &str = "service";
pub const SETTINGS_KEY: &str = "php";
pub const LEGACY_SETTINGS_KEY: &str = "set";
pub const CONST_KEY: &str = "const";
pub const MODE_KEY: &str = "mode";

/// Config file used when [`ConfigInput::File`] carries no path.
pub const DEFAULT_CONFIG_FILE: &str = "%appDir%/config.toml";

/// Replacement for `-` in service keys.
pub const DEFAULT_NAMESPACE_SEPARATOR: &str = "::";

/// Where [`Configurator::load_config`] takes its tree from.
#[derive(Debug, Clone)]
pub enum ConfigInput {
    /// A file path, expanded through the host. `None` uses the default file.
    File(Option<String>),
    /// An already loaded tree.
    Tree(Table),
}

impl From<Table> for ConfigInput {
    fn from(tree: Table) -> Self {
        ConfigInput::Tree(tree)
    }
}

impl From<&str> for ConfigInput {
    fn from(path: &str) -> Self {
        ConfigInput::File(Some(path.to_string()))
    }
}

impl From<String> for ConfigInput {
    fn from(path: String) -> Self {
        ConfigInput::File(Some(path))
    }
}

/// The expanded configuration tree returned by [`Configurator::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedConfig {
    tree: Table,
    started: Vec<String>,
}

impl AppliedConfig {
    /// Returns a reference to the expanded tree.
    pub fn tree(&self) -> &Table {
        &self.tree
    }

    /// Consumes the result and returns the expanded tree.
    pub fn into_tree(self) -> Table {
        self.tree
    }

    /// Returns a top-level section of the expanded tree.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.tree.get(key)
    }

    /// Keys of the services instantiated eagerly, in start order.
    pub fn started_services(&self) -> &[String] {
        &self.started
    }

    /// Deserializes the expanded tree into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        Value::Table(self.tree.clone())
            .try_into()
            .map_err(ConfigError::DeserializeError)
    }
}

/// Loads configuration and applies it to a host.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use bootstrap_fnd::{AppContext, Configurator, Container, Service};
///
/// struct Widget;
///
/// let mut container = Container::new();
/// container.register_constructor("Widget", |_| Ok(Arc::new(Widget) as Service));
/// let mut ctx = AppContext::builder().with_container(container).build();
///
/// let tree: toml::Table = toml::from_str(r#"
///     [service.widget]
///     class = "Widget"
///     run = true
/// "#)?;
///
/// let applied = Configurator::new().apply(tree, &mut ctx)?;
/// assert_eq!(applied.started_services(), ["widget"]);
/// assert_eq!(ctx.container().instantiations("widget"), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
#[must_use = "a configurator does nothing until .apply() or .load_config() is called"]
pub struct Configurator {
    default_config_file: String,
    namespace_separator: String,
    default_services: IndexMap<String, ServiceTarget>,
    env_overlay: Option<(String, String)>,
}

impl Default for Configurator {
    fn default() -> Self {
        Self {
            default_config_file: DEFAULT_CONFIG_FILE.to_string(),
            namespace_separator: DEFAULT_NAMESPACE_SEPARATOR.to_string(),
            default_services: IndexMap::new(),
            env_overlay: None,
        }
    }
}

impl Configurator {
    /// Creates a configurator with the default file and separator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the file loaded by `ConfigInput::File(None)`. May contain placeholders.
    pub fn with_default_config_file(mut self, path: impl Into<String>) -> Self {
        self.default_config_file = path.into();
        self
    }

    /// Sets the replacement for `-` in service keys. Defaults to `::`.
    pub fn with_namespace_separator(mut self, separator: impl Into<String>) -> Self {
        self.namespace_separator = separator.into();
        self
    }

    /// Adds a fallback target for services that name neither `class` nor `factory`.
    pub fn with_default_service(mut self, key: impl Into<String>, target: ServiceTarget) -> Self {
        self.default_services.insert(key.into(), target);
        self
    }

    /// Overlays environment variables on files loaded by [`load_config`](Self::load_config).
    pub fn with_env_overlay(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.env_overlay = Some((prefix.into(), separator.into()));
        self
    }

    /// Returns the fallback targets, keyed by service key.
    pub fn default_services(&self) -> &IndexMap<String, ServiceTarget> {
        &self.default_services
    }

    /// Builds a context whose container already holds every default service.
    pub fn create_context(
        &self,
        name: impl Into<String>,
        container: Container,
    ) -> Result<AppContext, HostError> {
        let mut ctx = AppContext::builder()
            .with_name(name)
            .with_container(container)
            .build();
        for (key, target) in &self.default_services {
            ctx.add_service(ServiceDefinition::new(key.clone(), target.clone()))?;
        }
        Ok(ctx)
    }

    /// Loads the configuration for the host's environment and applies it.
    ///
    /// File paths are expanded through the host before loading, and each
    /// file is narrowed to the section named after the environment.
    pub fn load_config<H: Host + ?Sized>(
        &self,
        input: impl Into<ConfigInput>,
        host: &mut H,
    ) -> Result<AppliedConfig, ConfigError> {
        let tree = match input.into() {
            ConfigInput::Tree(tree) => tree,
            ConfigInput::File(path) => {
                let path = path.unwrap_or_else(|| self.default_config_file.clone());
                let path = host.expand(&path)?;
                tracing::info!(path = %path, environment = host.environment_name(), "loading configuration");

                let mut loader = Config::builder().with_file(&path, true);
                if let Some((prefix, separator)) = &self.env_overlay {
                    loader = loader.with_env(prefix.clone(), separator.clone());
                }
                loader.with_section(host.environment_name()).load()?
            }
        };
        self.apply(tree, host)
    }

    /// Applies `tree` to `host` and returns the expanded tree.
    pub fn apply<H: Host + ?Sized>(
        &self,
        mut tree: Table,
        host: &mut H,
    ) -> Result<AppliedConfig, ConfigError> {
        let span = tracing::debug_span!("apply_config", environment = host.environment_name());
        let _enter = span.enter();

        variables::register(&tree, host)?;
        variables::expand_tree(&mut tree, host)?;
        let run = services::register(
            &tree,
            host,
            &self.default_services,
            &self.namespace_separator,
        )?;
        settings::apply(&mut tree, host)?;
        define_constants(&tree, host)?;
        set_modes(&tree, host)?;

        for key in &run {
            tracing::debug!(key = %key, "starting service");
            host.get_service(key)?;
        }

        tracing::info!(started = run.len(), "configuration applied");
        Ok(AppliedConfig { tree, started: run })
    }
}

fn define_constants<H: Host + ?Sized>(tree: &Table, host: &mut H) -> Result<(), ConfigError> {
    let Some(constants) = section(tree, CONST_KEY) else {
        return Ok(());
    };
    for (name, value) in constants {
        tracing::debug!(name = %name, "constant defined");
        host.define_constant(name, value.clone())?;
    }
    Ok(())
}

fn set_modes<H: Host + ?Sized>(tree: &Table, host: &mut H) -> Result<(), ConfigError> {
    let Some(modes) = section(tree, MODE_KEY) else {
        return Ok(());
    };
    for (mode, state) in modes {
        let state = as_flag(state).ok_or_else(|| ConfigError::InvalidModeValue {
            mode: mode.clone(),
        })?;
        tracing::debug!(mode = %mode, state, "mode set");
        host.set_mode(mode, state)?;
    }
    Ok(())
}

/// Returns a top-level section if it is a table.
fn section<'a>(tree: &'a Table, key: &str) -> Option<&'a Table> {
    match tree.get(key)? {
        Value::Table(table) => Some(table),
        _ => {
            tracing::warn!(section = key, "ignoring section that is not a table");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RuntimeSettings, Service};
    use std::sync::Arc;

    struct Widget;

    fn host() -> AppContext {
        let mut container = Container::new();
        container.register_constructor("Widget", |_| Ok(Arc::new(Widget) as Service));
        AppContext::builder()
            .with_name("test")
            .with_container(container)
            .build()
    }

    fn tree(source: &str) -> Table {
        toml::from_str(source).unwrap()
    }

    #[test]
    fn test_full_pass_order() {
        let mut ctx = host();
        let applied = Configurator::new()
            .apply(
                tree(
                    r#"
                    [variable]
                    zone = "Europe/Prague"

                    [service.widget]
                    class = "Widget"
                    run = true

                    [php.date]
                    timezone = "%zone%"

                    [const]
                    APP_ZONE = "%zone%"

                    [mode]
                    debug = true
                    "#,
                ),
                &mut ctx,
            )
            .unwrap();

        assert_eq!(ctx.settings().timezone(), Some("Europe/Prague"));
        assert_eq!(
            ctx.environment().constant("APP_ZONE").and_then(Value::as_str),
            Some("Europe/Prague")
        );
        assert!(ctx.environment().mode("debug"));
        assert_eq!(ctx.container().instantiations("widget"), 1);
        assert_eq!(applied.started_services(), ["widget"]);
        assert_eq!(applied.tree()["php"]["date.timezone"].as_str(), Some("Europe/Prague"));
    }

    #[test]
    fn test_mode_states_coerced() {
        let mut ctx = host();
        Configurator::new()
            .apply(
                tree(
                    r#"
                    [mode]
                    production = "on"
                    console = 0
                    "#,
                ),
                &mut ctx,
            )
            .unwrap();

        assert!(ctx.environment().mode("production"));
        assert!(!ctx.environment().mode("console"));
    }

    #[test]
    fn test_structured_mode_rejected() {
        let mut ctx = host();
        let result = Configurator::new().apply(tree("mode = { debug = [true] }"), &mut ctx);
        assert!(matches!(result, Err(ConfigError::InvalidModeValue { mode }) if mode == "debug"));
    }

    #[test]
    fn test_malformed_section_skipped() {
        let mut ctx = host();
        let applied = Configurator::new()
            .apply(tree(r#"service = "Widget""#), &mut ctx)
            .unwrap();

        assert_eq!(ctx.container().definitions().count(), 0);
        assert!(applied.started_services().is_empty());
    }

    #[test]
    fn test_duplicate_constant_propagated() {
        let mut ctx = host();
        ctx.environment_mut()
            .define_constant("VERSION", Value::String("1".into()))
            .unwrap();

        let result = Configurator::new().apply(tree("const = { VERSION = \"2\" }"), &mut ctx);
        assert!(matches!(
            result,
            Err(ConfigError::Host(HostError::DuplicateConstant(name))) if name == "VERSION"
        ));
    }

    #[test]
    fn test_create_context_registers_defaults() {
        let configurator = Configurator::new()
            .with_default_service("Nella::Cache", ServiceTarget::Factory("Cache::create".into()));

        let ctx = configurator
            .create_context("production", Container::new())
            .unwrap();

        assert!(ctx.container().has_service("Nella::Cache"));
        assert_eq!(ctx.environment().name(), "production");
    }

    #[test]
    fn test_default_service_overridden_by_config() {
        let configurator = Configurator::new()
            .with_default_service("widget", ServiceTarget::Factory("Widget::create".into()));
        let mut ctx = configurator.create_context("test", Container::new()).unwrap();

        configurator
            .apply(tree("[service.widget]\nclass = \"Widget\""), &mut ctx)
            .unwrap();

        let definition = ctx.container().definition("widget").unwrap();
        assert_eq!(definition.target, ServiceTarget::Class("Widget".into()));
    }

    #[test]
    fn test_settings_disabled_keeps_earlier_mutations() {
        let mut ctx = AppContext::builder()
            .with_settings(RuntimeSettings::disabled())
            .build();

        let result = Configurator::new().apply(
            tree(
                r#"
                [variable]
                seen = "yes"

                [php]
                "session.name" = "sid"
                "#,
            ),
            &mut ctx,
        );

        assert!(matches!(result, Err(ConfigError::SettingsDisabled { .. })));
        assert!(ctx.environment().variable("seen").is_some());
    }
}
