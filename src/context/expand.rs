//! Placeholder expansion for config strings.
//!
//! `%name%` is replaced by the value of the variable `name`, `%%` produces a
//! literal `%`. A `%` that does not open a well-formed placeholder is kept
//! as-is, so strings like `100% done` pass through untouched.

use indexmap::IndexMap;
use toml::Value;

use super::HostError;
use crate::value::scalar_text;

/// Expands every placeholder in `input` against `variables`.
///
/// Variable values are expanded recursively. A variable that refers back to
/// itself, directly or through other variables, is reported as circular.
pub fn expand(input: &str, variables: &IndexMap<String, Value>) -> Result<String, HostError> {
    let mut active = Vec::new();
    expand_with(input, variables, &mut active)
}

fn expand_with(
    input: &str,
    variables: &IndexMap<String, Value>,
    active: &mut Vec<String>,
) -> Result<String, HostError> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let name_len = after
            .find(|c: char| !is_name_char(c))
            .unwrap_or(after.len());

        if after[name_len..].starts_with('%') {
            let name = &after[..name_len];
            if name.is_empty() {
                result.push('%');
            } else {
                result.push_str(&lookup(name, variables, active)?);
            }
            rest = &after[name_len + 1..];
        } else {
            // Not a placeholder, keep the percent sign.
            result.push('%');
            rest = after;
        }
    }

    result.push_str(rest);
    Ok(result)
}

fn lookup(
    name: &str,
    variables: &IndexMap<String, Value>,
    active: &mut Vec<String>,
) -> Result<String, HostError> {
    if active.iter().any(|n| n == name) {
        return Err(HostError::CircularVariable(name.to_string()));
    }

    let value = variables
        .get(name)
        .ok_or_else(|| HostError::UnknownVariable(name.to_string()))?;

    match value {
        Value::String(s) => {
            active.push(name.to_string());
            let expanded = expand_with(s, variables, active);
            active.pop();
            expanded
        }
        other => scalar_text(other).ok_or_else(|| HostError::NonScalarVariable(name.to_string())),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}
