//! Environment section selection.
//!
//! A document may hold one top-level table per environment:
//!
//! ```toml
//! [production.php]
//! "date.timezone" = "UTC"
//!
//! [development]
//! extends = "production"
//! mode = { debug = true }
//! ```
//!
//! Selecting `development` yields the production section with the
//! development section merged over it. Documents without a matching
//! section are used whole.

use toml::{Table, Value};

use super::source::deep_merge;
use super::ConfigError;

/// Key naming the section a section inherits from.
pub const EXTENDS_KEY: &str = "extends";

/// Returns the section of `document` named `name`, or the whole document.
pub fn select_section(document: Table, name: &str) -> Result<Table, ConfigError> {
    if let Some(Value::Table(section)) = document.get(name) {
        return resolve_section(&document, name, section, &mut Vec::new());
    }
    Ok(document)
}

fn resolve_section(
    document: &Table,
    name: &str,
    section: &Table,
    chain: &mut Vec<String>,
) -> Result<Table, ConfigError> {
    if chain.iter().any(|s| s == name) {
        return Err(ConfigError::CircularSection(name.to_string()));
    }
    chain.push(name.to_string());

    let mut section = section.clone();
    let parent = match section.remove(EXTENDS_KEY) {
        None => return Ok(section),
        Some(Value::String(parent)) => parent,
        Some(other) => {
            return Err(ConfigError::UnknownSection {
                section: name.to_string(),
                parent: other.to_string(),
            })
        }
    };

    let Some(Value::Table(parent_section)) = document.get(&parent) else {
        return Err(ConfigError::UnknownSection {
            section: name.to_string(),
            parent,
        });
    };

    let mut base = resolve_section(document, &parent, parent_section, chain)?;
    deep_merge(&mut base, section);
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(source: &str) -> Table {
        toml::from_str(source).unwrap()
    }

    #[test]
    fn test_without_section_returns_document() {
        let doc = document(
            r#"
            [php]
            "date.timezone" = "UTC"
            "#,
        );
        let selected = select_section(doc.clone(), "production").unwrap();
        assert_eq!(selected, doc);
    }

    #[test]
    fn test_selects_named_section() {
        let doc = document(
            r#"
            [production.variable]
            tempDir = "/tmp"

            [development.variable]
            tempDir = "/var/tmp"
            "#,
        );
        let selected = select_section(doc, "development").unwrap();
        assert_eq!(selected["variable"]["tempDir"].as_str(), Some("/var/tmp"));
        assert!(!selected.contains_key("production"));
    }

    #[test]
    fn test_extends_merges_parent() {
        let doc = document(
            r#"
            [production.php]
            "date.timezone" = "UTC"
            display_errors = "0"

            [development]
            extends = "production"
            [development.php]
            display_errors = "1"
            "#,
        );
        let selected = select_section(doc, "development").unwrap();

        assert_eq!(selected["php"]["date.timezone"].as_str(), Some("UTC"));
        assert_eq!(selected["php"]["display_errors"].as_str(), Some("1"));
        assert!(!selected.contains_key(EXTENDS_KEY));
    }

    #[test]
    fn test_unknown_parent() {
        let doc = document(
            r#"
            [development]
            extends = "staging"
            "#,
        );
        let result = select_section(doc, "development");
        assert!(matches!(result, Err(ConfigError::UnknownSection { parent, .. }) if parent == "staging"));
    }

    #[test]
    fn test_circular_inheritance() {
        let doc = document(
            r#"
            [a]
            extends = "b"
            [b]
            extends = "a"
            "#,
        );
        assert!(matches!(select_section(doc, "a"), Err(ConfigError::CircularSection(_))));
    }
}
