//! Runtime settings from the `php` section (legacy name `set`).

use toml::{Table, Value};

use super::{LEGACY_SETTINGS_KEY, SETTINGS_KEY};
use crate::config::ConfigError;
use crate::context::{Host, HostError};
use crate::value::is_scalar;

/// Flattens the settings section in place and applies every entry.
pub(super) fn apply<H: Host + ?Sized>(tree: &mut Table, host: &mut H) -> Result<(), ConfigError> {
    if !tree.contains_key(SETTINGS_KEY) {
        if let Some(legacy) = tree.remove(LEGACY_SETTINGS_KEY) {
            tracing::debug!("legacy `set` section treated as `php`");
            tree.insert(SETTINGS_KEY.to_string(), legacy);
        }
    }

    let settings = match tree.get_mut(SETTINGS_KEY) {
        Some(Value::Table(settings)) => settings,
        Some(_) => {
            tracing::warn!(section = SETTINGS_KEY, "ignoring section that is not a table");
            return Ok(());
        }
        None => return Ok(()),
    };

    normalize_include_path(settings);
    *settings = flatten(std::mem::take(settings));

    for (key, value) in settings.iter() {
        let key = key.replace('-', ".");
        if !is_scalar(value) {
            return Err(ConfigError::InvalidSettingValue { key });
        }
        host.apply_setting(&key, value).map_err(|e| match e {
            HostError::SettingsDisabled(key) => ConfigError::SettingsDisabled { key },
            other => other.into(),
        })?;
    }
    Ok(())
}

/// Expands one level of nesting into dotted keys, in place of the parent.
fn flatten(settings: Table) -> Table {
    let mut flat = Table::new();
    for (key, value) in settings {
        match value {
            Value::Table(nested) => {
                for (inner, value) in nested {
                    flat.insert(format!("{key}.{inner}"), value);
                }
            }
            value => {
                flat.insert(key, value);
            }
        }
    }
    flat
}

/// Converts a `;`-separated include path to the platform separator.
#[cfg(not(windows))]
fn normalize_include_path(settings: &mut Table) {
    if let Some(Value::String(path)) = settings.get_mut("include_path") {
        *path = path.replace(';', ":");
    }
}

#[cfg(windows)]
fn normalize_include_path(_settings: &mut Table) {}
