//! Minimal service registry.
//!
//! The registry stores definitions and hands out instances built by
//! constructors registered under a class or factory name. It does not
//! interpret `autowire`, `arguments` or `callMethod`; constructors receive
//! the full [`ServiceDefinition`] and may use them as they see fit.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use toml::Value;

use super::HostError;

/// A constructed service instance.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Builds a service from its definition.
pub type Constructor = Box<dyn Fn(&ServiceDefinition) -> Result<Service, HostError> + Send + Sync>;

/// What a service is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceTarget {
    /// A class name.
    Class(String),
    /// A factory reference.
    Factory(String),
}

impl ServiceTarget {
    /// The name constructors are registered under.
    pub fn name(&self) -> &str {
        match self {
            ServiceTarget::Class(name) | ServiceTarget::Factory(name) => name,
        }
    }
}

/// Optional settings carried alongside a service registration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceOptions {
    pub autowire: Option<bool>,
    pub arguments: Option<Vec<Value>>,
    pub call_method: Option<IndexMap<String, Vec<Value>>>,
}

/// A registered service: key, target, lifetime and options.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    pub key: String,
    pub target: ServiceTarget,
    pub singleton: bool,
    pub options: ServiceOptions,
}

impl ServiceDefinition {
    /// A singleton definition with no options.
    pub fn new(key: impl Into<String>, target: ServiceTarget) -> Self {
        Self {
            key: key.into(),
            target,
            singleton: true,
            options: ServiceOptions::default(),
        }
    }
}

/// Service definitions, aliases and the instances built from them.
#[derive(Default)]
pub struct Container {
    definitions: IndexMap<String, ServiceDefinition>,
    aliases: IndexMap<String, String>,
    constructors: HashMap<String, Constructor>,
    instances: HashMap<String, Service>,
    instantiations: HashMap<String, usize>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.definitions)
            .field("aliases", &self.aliases)
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .field("instances", &self.instances.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Container {
    /// Creates an empty container with no constructors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the constructor used for services targeting `name`.
    pub fn register_constructor<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&ServiceDefinition) -> Result<Service, HostError> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Adds a service definition. Keys must be unique and must not be aliases.
    pub fn add_service(&mut self, definition: ServiceDefinition) -> Result<(), HostError> {
        if definition.key.is_empty() {
            return Err(HostError::InvalidServiceKey(definition.key));
        }
        if self.definitions.contains_key(&definition.key) {
            return Err(HostError::InvalidServiceKey(format!(
                "{} (already registered)",
                definition.key
            )));
        }
        if self.aliases.contains_key(&definition.key) {
            return Err(HostError::InvalidServiceKey(format!(
                "{} (already an alias)",
                definition.key
            )));
        }
        tracing::debug!(key = %definition.key, target = definition.target.name(), "service added");
        self.definitions.insert(definition.key.clone(), definition);
        Ok(())
    }

    /// Removes a service, an alias with the same name, and any instance
    /// built from the service. Unknown keys are ignored.
    pub fn remove_service(&mut self, key: &str) {
        if self.definitions.shift_remove(key).is_some() {
            tracing::debug!(key, "service removed");
        }
        if self.aliases.shift_remove(key).is_some() {
            tracing::debug!(key, "alias removed");
        }
        self.instances.remove(key);
    }

    /// Makes `alias` resolve to the service `key`.
    ///
    /// An alias cannot take over the key of a registered service. Aliasing a
    /// service to its own key is a no-op.
    pub fn add_alias(&mut self, alias: &str, key: &str) -> Result<(), HostError> {
        if alias.is_empty() {
            return Err(HostError::InvalidServiceKey(alias.to_string()));
        }
        if alias == key {
            return Ok(());
        }
        if self.definitions.contains_key(alias) {
            return Err(HostError::InvalidServiceKey(format!(
                "{alias} (alias collides with a registered service)"
            )));
        }
        self.aliases.insert(alias.to_string(), key.to_string());
        Ok(())
    }

    /// Follows an alias to the key it points at. Non-aliases resolve to themselves.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Returns `true` if `key` or the service it aliases is registered.
    pub fn has_service(&self, key: &str) -> bool {
        self.definitions.contains_key(self.resolve(key))
    }

    /// Returns the definition registered under `key` or its alias target.
    pub fn definition(&self, key: &str) -> Option<&ServiceDefinition> {
        self.definitions.get(self.resolve(key))
    }

    /// Returns the definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.definitions.values()
    }

    /// Returns the service, building it if needed.
    ///
    /// Singletons are built once and cached; other services are built on
    /// every call.
    pub fn get_service(&mut self, key: &str) -> Result<Service, HostError> {
        let key = self.resolve(key).to_string();
        if let Some(instance) = self.instances.get(&key) {
            return Ok(Arc::clone(instance));
        }

        let definition = self
            .definitions
            .get(&key)
            .ok_or_else(|| HostError::UnknownService(key.clone()))?;
        let constructor = self
            .constructors
            .get(definition.target.name())
            .ok_or_else(|| HostError::MissingConstructor {
                key: key.clone(),
                target: definition.target.name().to_string(),
            })?;

        let instance = constructor(definition)?;
        tracing::debug!(key = %key, "service instantiated");
        *self.instantiations.entry(key.clone()).or_default() += 1;
        if definition.singleton {
            self.instances.insert(key, Arc::clone(&instance));
        }
        Ok(instance)
    }

    /// How many times the service has been built.
    pub fn instantiations(&self, key: &str) -> usize {
        self.instantiations
            .get(self.resolve(key))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mailer;

    fn container_with_mailer() -> Container {
        let mut container = Container::new();
        container.register_constructor("Mailer", |_| Ok(Arc::new(Mailer) as Service));
        container
    }

    #[test]
    fn test_singleton_built_once() {
        let mut container = container_with_mailer();
        container
            .add_service(ServiceDefinition::new("mailer", ServiceTarget::Class("Mailer".into())))
            .unwrap();

        let first = container.get_service("mailer").unwrap();
        let second = container.get_service("mailer").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.downcast_ref::<Mailer>().is_some());
        assert_eq!(container.instantiations("mailer"), 1);
    }

    #[test]
    fn test_non_singleton_built_each_time() {
        let mut container = container_with_mailer();
        let mut definition = ServiceDefinition::new("mailer", ServiceTarget::Class("Mailer".into()));
        definition.singleton = false;
        container.add_service(definition).unwrap();

        container.get_service("mailer").unwrap();
        container.get_service("mailer").unwrap();

        assert_eq!(container.instantiations("mailer"), 2);
    }

    #[test]
    fn test_alias_resolves_to_service() {
        let mut container = container_with_mailer();
        container
            .add_service(ServiceDefinition::new("mailer", ServiceTarget::Class("Mailer".into())))
            .unwrap();
        container.add_alias("mail", "mailer").unwrap();

        assert!(container.has_service("mail"));
        let via_alias = container.get_service("mail").unwrap();
        let direct = container.get_service("mailer").unwrap();
        assert!(Arc::ptr_eq(&via_alias, &direct));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut container = Container::new();
        let definition = ServiceDefinition::new("cache", ServiceTarget::Class("Cache".into()));
        container.add_service(definition.clone()).unwrap();

        let result = container.add_service(definition.clone());
        assert!(matches!(result, Err(HostError::InvalidServiceKey(_))));

        container.remove_service("cache");
        container.add_service(definition).unwrap();
    }

    #[test]
    fn test_alias_cannot_shadow_service() {
        let mut container = container_with_mailer();
        for key in ["mailer", "backup"] {
            container
                .add_service(ServiceDefinition::new(key, ServiceTarget::Class("Mailer".into())))
                .unwrap();
        }

        let result = container.add_alias("mailer", "backup");
        assert!(matches!(result, Err(HostError::InvalidServiceKey(_))));
        assert_eq!(container.resolve("mailer"), "mailer");

        container.add_alias("mailer", "mailer").unwrap();
        assert_eq!(container.resolve("mailer"), "mailer");
    }

    #[test]
    fn test_service_key_cannot_be_alias() {
        let mut container = container_with_mailer();
        container
            .add_service(ServiceDefinition::new("mailer", ServiceTarget::Class("Mailer".into())))
            .unwrap();
        container.add_alias("mail", "mailer").unwrap();

        let shadow = ServiceDefinition::new("mail", ServiceTarget::Class("Mailer".into()));
        let result = container.add_service(shadow.clone());
        assert!(matches!(result, Err(HostError::InvalidServiceKey(_))));

        container.remove_service("mail");
        container.add_service(shadow).unwrap();
        assert_eq!(container.resolve("mail"), "mail");
    }

    #[test]
    fn test_missing_constructor() {
        let mut container = Container::new();
        container
            .add_service(ServiceDefinition::new("cache", ServiceTarget::Factory("Cache::create".into())))
            .unwrap();

        let result = container.get_service("cache");
        assert!(matches!(result, Err(HostError::MissingConstructor { target, .. }) if target == "Cache::create"));
    }

    #[test]
    fn test_unknown_service() {
        let mut container = Container::new();
        assert!(matches!(container.get_service("nope"), Err(HostError::UnknownService(_))));
    }
}
