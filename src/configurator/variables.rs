use toml::{Table, Value};

use super::{section, VARIABLE_KEY};
use crate::config::ConfigError;
use crate::context::Host;

/// Registers the `variable` section into the host, in file order.
pub(super) fn register<H: Host + ?Sized>(tree: &Table, host: &mut H) -> Result<(), ConfigError> {
    let Some(variables) = section(tree, VARIABLE_KEY) else {
        return Ok(());
    };

    for (name, value) in variables {
        tracing::debug!(name = %name, "variable registered");
        host.set_variable(name, value.clone())?;
    }
    Ok(())
}

/// Expands placeholders in every string of the tree, in a single pass.
///
/// Keys are left alone and non-string scalars are untouched.
pub(super) fn expand_tree<H: Host + ?Sized>(tree: &mut Table, host: &H) -> Result<(), ConfigError> {
    for (_, value) in tree.iter_mut() {
        expand_value(value, host)?;
    }
    Ok(())
}

fn expand_value<H: Host + ?Sized>(value: &mut Value, host: &H) -> Result<(), ConfigError> {
    match value {
        Value::String(s) => {
            if s.contains('%') {
                *s = host.expand(s)?;
            }
        }
        Value::Table(table) => expand_tree(table, host)?,
        Value::Array(items) => {
            for item in items.iter_mut() {
                expand_value(item, host)?;
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => {}
    }
    Ok(())
}
