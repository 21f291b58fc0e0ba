//! Service registration from the `service` section.

use indexmap::IndexMap;
use toml::{Table, Value};

use super::{section, SERVICE_KEY};
use crate::config::ConfigError;
use crate::context::{Host, ServiceDefinition, ServiceOptions, ServiceTarget};
use crate::value::as_flag;

/// A service entry after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub key: String,
    pub singleton: bool,
    pub options: ServiceOptions,
    pub target: ServiceTarget,
    pub run: bool,
    pub aliases: Vec<String>,
}

impl ServiceSpec {
    /// Builds a spec from one `service` entry.
    ///
    /// A plain string entry names the class directly. Otherwise the target is
    /// taken from `class`, then `factory`, then `defaults`.
    pub fn parse(
        name: &str,
        entry: &Value,
        defaults: &IndexMap<String, ServiceTarget>,
        separator: &str,
    ) -> Result<Self, ConfigError> {
        let key = normalize_key(name, separator);
        let empty = Table::new();
        let fields = match entry {
            Value::Table(fields) => fields,
            _ => &empty,
        };

        let singleton = optional_flag(&key, fields, "singleton")?.unwrap_or(true);
        let run = optional_flag(&key, fields, "run")?.unwrap_or(false);
        let options = ServiceOptions {
            autowire: optional_flag(&key, fields, "autowire")?,
            arguments: fields.get("argument").map(to_sequence),
            call_method: fields
                .get("callMethod")
                .map(|methods| call_methods(&key, methods))
                .transpose()?,
        };

        let target = match entry {
            Value::String(class) => ServiceTarget::Class(class.clone()),
            _ => {
                if let Some(class) = fields.get("class") {
                    ServiceTarget::Class(identifier(&key, "class", class)?)
                } else if let Some(factory) = fields.get("factory") {
                    ServiceTarget::Factory(identifier(&key, "factory", factory)?)
                } else if let Some(default) = defaults.get(&key) {
                    default.clone()
                } else {
                    return Err(ConfigError::MissingFactory { key });
                }
            }
        };

        let aliases = match fields.get("alias") {
            None => Vec::new(),
            Some(Value::String(alias)) => vec![alias.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(alias) => Ok(alias.clone()),
                    _ => Err(invalid(&key, "aliases must be strings")),
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(invalid(&key, "alias must be a string or an array")),
        };

        Ok(Self {
            key,
            singleton,
            options,
            target,
            run,
            aliases,
        })
    }

    pub fn definition(&self) -> ServiceDefinition {
        ServiceDefinition {
            key: self.key.clone(),
            target: self.target.clone(),
            singleton: self.singleton,
            options: self.options.clone(),
        }
    }
}

/// Registers every service of the `service` section.
///
/// Returns the keys marked `run = true`, in registration order.
pub(super) fn register<H: Host + ?Sized>(
    tree: &Table,
    host: &mut H,
    defaults: &IndexMap<String, ServiceTarget>,
    separator: &str,
) -> Result<Vec<String>, ConfigError> {
    let Some(services) = section(tree, SERVICE_KEY) else {
        return Ok(Vec::new());
    };

    let mut run = Vec::new();
    for (name, entry) in services {
        let spec = ServiceSpec::parse(name, entry, defaults, separator)?;

        host.remove_service(&spec.key)?;
        host.add_service(spec.definition())?;
        for alias in &spec.aliases {
            host.add_alias(alias, &spec.key)?;
        }
        tracing::debug!(
            key = %spec.key,
            target = spec.target.name(),
            aliases = spec.aliases.len(),
            "service registered"
        );

        if spec.run {
            run.push(spec.key);
        }
    }
    Ok(run)
}

/// Service keys cannot contain the namespace separator in the source format,
/// so `-` stands in for it.
pub fn normalize_key(name: &str, separator: &str) -> String {
    name.replace('-', separator)
}

fn to_sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Table(table) => table.values().cloned().collect(),
        scalar => vec![scalar.clone()],
    }
}

fn call_methods(key: &str, value: &Value) -> Result<IndexMap<String, Vec<Value>>, ConfigError> {
    match value {
        Value::Table(methods) => Ok(methods
            .iter()
            .map(|(method, args)| (method.clone(), to_sequence(args)))
            .collect()),
        Value::String(method) => Ok(IndexMap::from([(method.clone(), Vec::new())])),
        Value::Array(methods) => methods
            .iter()
            .map(|method| match method {
                Value::String(method) => Ok((method.clone(), Vec::new())),
                _ => Err(invalid(key, "callMethod names must be strings")),
            })
            .collect(),
        _ => Err(invalid(key, "callMethod must be a table, a string or an array")),
    }
}

fn optional_flag(key: &str, fields: &Table, field: &str) -> Result<Option<bool>, ConfigError> {
    fields
        .get(field)
        .map(|value| as_flag(value).ok_or_else(|| invalid(key, &format!("{field} must be a flag"))))
        .transpose()
}

fn identifier(key: &str, field: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(name) if !name.is_empty() => Ok(name.clone()),
        _ => Err(invalid(key, &format!("{field} must be a non-empty string"))),
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidService {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
