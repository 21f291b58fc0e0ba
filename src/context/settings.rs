//! Runtime settings sink.

use toml::{Table, Value};

use super::HostError;
use crate::value::as_flag;

/// Settings the sink understands natively.
///
/// These are applied even when the generic mechanism is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownSetting {
    Timezone,
    IncludePath,
    IconvInternalEncoding,
    MbstringInternalEncoding,
    ErrorReporting,
    IgnoreUserAbort,
    MaxExecutionTime,
}

impl KnownSetting {
    /// Returns the setting named by a dotted key, if it is a known one.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "date.timezone" => Some(Self::Timezone),
            "include_path" => Some(Self::IncludePath),
            "iconv.internal_encoding" => Some(Self::IconvInternalEncoding),
            "mbstring.internal_encoding" => Some(Self::MbstringInternalEncoding),
            "error_reporting" => Some(Self::ErrorReporting),
            "ignore_user_abort" => Some(Self::IgnoreUserAbort),
            "max_execution_time" => Some(Self::MaxExecutionTime),
            _ => None,
        }
    }

    /// Returns the dotted key of the setting.
    pub fn key(self) -> &'static str {
        match self {
            Self::Timezone => "date.timezone",
            Self::IncludePath => "include_path",
            Self::IconvInternalEncoding => "iconv.internal_encoding",
            Self::MbstringInternalEncoding => "mbstring.internal_encoding",
            Self::ErrorReporting => "error_reporting",
            Self::IgnoreUserAbort => "ignore_user_abort",
            Self::MaxExecutionTime => "max_execution_time",
        }
    }

    fn normalize(self, value: &Value) -> Result<Value, HostError> {
        let invalid = |reason: &str| HostError::InvalidSetting {
            key: self.key().to_string(),
            reason: reason.to_string(),
        };

        match self {
            Self::ErrorReporting | Self::MaxExecutionTime => match value {
                Value::Integer(i) => Ok(Value::Integer(*i)),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| invalid("expected an integer")),
                _ => Err(invalid("expected an integer")),
            },
            Self::IgnoreUserAbort => as_flag(value)
                .map(Value::Boolean)
                .ok_or_else(|| invalid("expected a flag")),
            Self::Timezone
            | Self::IncludePath
            | Self::IconvInternalEncoding
            | Self::MbstringInternalEncoding => match value {
                Value::String(s) if !s.is_empty() => Ok(Value::String(s.clone())),
                _ => Err(invalid("expected a non-empty string")),
            },
        }
    }
}

/// In-memory settings store with a switchable generic mechanism.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    generic_enabled: bool,
    values: Table,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            generic_enabled: true,
            values: Table::new(),
        }
    }
}

impl RuntimeSettings {
    /// Creates a sink with the generic mechanism enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that only accepts [`KnownSetting`]s.
    pub fn disabled() -> Self {
        Self {
            generic_enabled: false,
            values: Table::new(),
        }
    }

    /// Returns `true` if settings other than [`KnownSetting`]s are accepted.
    pub fn is_generic_enabled(&self) -> bool {
        self.generic_enabled
    }

    /// Seeds a current value without going through [`apply`](Self::apply).
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Applies one dotted setting.
    ///
    /// With the generic mechanism disabled, unknown keys are accepted only
    /// when they already hold the requested value.
    pub fn apply(&mut self, key: &str, value: &Value) -> Result<(), HostError> {
        let value = match KnownSetting::from_key(key) {
            Some(known) => known.normalize(value)?,
            None if self.generic_enabled => value.clone(),
            None if self.values.get(key) == Some(value) => return Ok(()),
            None => return Err(HostError::SettingsDisabled(key.to_string())),
        };

        tracing::debug!(key, value = %value, "runtime setting applied");
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Returns the current value of a setting.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the `date.timezone` setting.
    pub fn timezone(&self) -> Option<&str> {
        self.get(KnownSetting::Timezone.key()).and_then(Value::as_str)
    }

    /// Returns the `include_path` setting.
    pub fn include_path(&self) -> Option<&str> {
        self.get(KnownSetting::IncludePath.key()).and_then(Value::as_str)
    }

    /// Returns the `error_reporting` level.
    pub fn error_reporting(&self) -> Option<i64> {
        self.get(KnownSetting::ErrorReporting.key())
            .and_then(Value::as_integer)
    }

    /// Returns the `max_execution_time` limit in seconds.
    pub fn max_execution_time(&self) -> Option<i64> {
        self.get(KnownSetting::MaxExecutionTime.key())
            .and_then(Value::as_integer)
    }
}
