//! Variables, mode flags and constants of a running application.

use indexmap::IndexMap;
use toml::Value;

use super::expand::expand;
use super::HostError;

/// Variable name under which the environment exposes its own name.
pub const ENVIRONMENT_VARIABLE: &str = "environment";

/// Named environment holding the state that configuration writes into.
///
/// Unlike a process-wide singleton, an `Environment` is an ordinary value:
/// tests can build as many as they need.
#[derive(Debug, Clone)]
pub struct Environment {
    name: String,
    variables: IndexMap<String, Value>,
    modes: IndexMap<String, bool>,
    constants: IndexMap<String, Value>,
}

impl Environment {
    /// Creates an environment called `name` with the `environment` variable set.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut variables = IndexMap::new();
        variables.insert(ENVIRONMENT_VARIABLE.to_string(), Value::String(name.clone()));
        Self {
            name,
            variables,
            modes: IndexMap::new(),
            constants: IndexMap::new(),
        }
    }

    /// Returns the environment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets a variable, replacing any previous value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Returns a variable's raw, unexpanded value.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Returns all variables in definition order.
    pub fn variables(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    /// Expands `%name%` placeholders against the current variables.
    pub fn expand(&self, input: &str) -> Result<String, HostError> {
        expand(input, &self.variables)
    }

    /// Turns a mode on or off.
    pub fn set_mode(&mut self, name: impl Into<String>, state: bool) {
        self.modes.insert(name.into(), state);
    }

    /// Returns the state of a mode; modes never set are off.
    pub fn mode(&self, name: &str) -> bool {
        self.modes.get(name).copied().unwrap_or(false)
    }

    /// Defines a constant. Constants can be defined only once.
    pub fn define_constant(&mut self, name: &str, value: Value) -> Result<(), HostError> {
        if self.constants.contains_key(name) {
            return Err(HostError::DuplicateConstant(name.to_string()));
        }
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    /// Returns the value of a defined constant.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }
}
