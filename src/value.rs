//! Helpers for inspecting loosely-typed config values.

use toml::Value;

/// Returns `true` for strings, numbers, booleans and datetimes.
pub(crate) fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Table(_))
}

/// Renders a scalar as text. Arrays and tables have no text form.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(dt) => Some(dt.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

/// Interprets a scalar as an on/off flag.
///
/// Strings are on unless empty or one of `0`, `false`, `off`, `no`
/// (case-insensitive). Numbers are on when non-zero.
pub(crate) fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Integer(i) => Some(*i != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            let off = s.is_empty()
                || ["0", "false", "off", "no"]
                    .iter()
                    .any(|word| s.eq_ignore_ascii_case(word));
            Some(!off)
        }
        Value::Datetime(_) => Some(true),
        Value::Array(_) | Value::Table(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_from_strings() {
        assert_eq!(as_flag(&Value::String("On".into())), Some(true));
        assert_eq!(as_flag(&Value::String("yes".into())), Some(true));
        assert_eq!(as_flag(&Value::String("OFF".into())), Some(false));
        assert_eq!(as_flag(&Value::String("0".into())), Some(false));
        assert_eq!(as_flag(&Value::String(String::new())), Some(false));
    }

    #[test]
    fn test_flag_rejects_structures() {
        assert_eq!(as_flag(&Value::Array(vec![])), None);
        assert_eq!(as_flag(&Value::Table(toml::Table::new())), None);
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&Value::Integer(42)).as_deref(), Some("42"));
        assert_eq!(scalar_text(&Value::Boolean(false)).as_deref(), Some("false"));
        assert!(scalar_text(&Value::Array(vec![Value::Integer(1)])).is_none());
    }
}
