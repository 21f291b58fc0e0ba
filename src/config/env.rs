use toml::Value;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Overlays configuration from process environment variables.
///
/// `APP__PHP__MAX_EXECUTION_TIME=30` with prefix `APP` and separator `__`
/// sets `php.max_execution_time = 30`. Segments are lowercased here and
/// matched case-insensitively against existing keys when merged.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn entries_from<I>(&self, vars: I) -> Vec<ConfigEntry>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let lead = format!("{}{}", self.prefix, self.separator);

        vars.into_iter()
            .filter_map(|(name, raw)| {
                let rest = name.strip_prefix(&lead)?;
                let path: Vec<String> = rest
                    .split(self.separator.as_str())
                    .map(str::to_lowercase)
                    .collect();
                if path.iter().any(String::is_empty) {
                    return None;
                }
                Some(ConfigEntry::at_path(path, coerce_value(&raw)))
            })
            .collect()
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        Ok(self.entries_from(std::env::vars()))
    }
}

/// Picks the most specific type for an environment string.
fn coerce_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }

    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Integer(i);
        }
    }

    if raw.contains('.') {
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefixed_variables_become_paths() {
        let source = EnvSource::new("APP", "__");
        let entries = source.entries_from(vars(&[
            ("APP__PHP__MAX_EXECUTION_TIME", "30"),
            ("APP__MODE__DEBUG", "true"),
            ("OTHER__PHP__X", "1"),
        ]));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, vec!["php", "max_execution_time"]);
        assert_eq!(entries[0].value, Value::Integer(30));
        assert_eq!(entries[1].value, Value::Boolean(true));
    }

    #[test]
    fn test_empty_segments_skipped() {
        let source = EnvSource::new("APP", "__");
        let entries = source.entries_from(vars(&[("APP__", "x"), ("APP__A____B", "y")]));
        assert!(entries.is_empty());
    }

    #[test]
    fn test_coercion() {
        assert_eq!(coerce_value("FALSE"), Value::Boolean(false));
        assert_eq!(coerce_value("-12"), Value::Integer(-12));
        assert_eq!(coerce_value("1.5"), Value::Float(1.5));
        assert_eq!(coerce_value("Europe/Prague"), Value::String("Europe/Prague".into()));
        assert_eq!(coerce_value("1.2.3"), Value::String("1.2.3".into()));
    }
}
