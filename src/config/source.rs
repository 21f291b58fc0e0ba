use toml::{Table, Value};

use super::ConfigError;

/// A value contributed by a source, placed at `path` in the merged tree.
///
/// An empty path means the value is a whole document.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn document(table: Table) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Table(table),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }

    pub fn is_document(&self) -> bool {
        self.path.is_empty()
    }
}

pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// Merges `value` into `table` at `path`, creating intermediate tables.
///
/// A segment that matches an existing key case-insensitively reuses that
/// key, so `service.nella-cache` reaches `[service.Nella-Cache]`.
pub fn merge_at_path(table: &mut Table, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        if let Value::Table(overlay) = value {
            deep_merge(table, overlay);
        }
        return;
    };
    let key = existing_key(table, first);

    if rest.is_empty() {
        match (table.get_mut(&key), value) {
            (Some(Value::Table(base)), Value::Table(overlay)) => deep_merge(base, overlay),
            (_, value) => {
                table.insert(key, value);
            }
        }
        return;
    }

    if !matches!(table.get(&key), Some(Value::Table(_))) {
        table.insert(key.clone(), Value::Table(Table::new()));
    }
    if let Some(Value::Table(nested)) = table.get_mut(&key) {
        merge_at_path(nested, rest, value);
    }
}

fn existing_key(table: &Table, segment: &str) -> String {
    if table.contains_key(segment) {
        return segment.to_string();
    }
    table
        .keys()
        .find(|key| key.eq_ignore_ascii_case(segment))
        .cloned()
        .unwrap_or_else(|| segment.to_string())
}

/// Recursively merges tables; any other overlay value replaces the base.
pub fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
