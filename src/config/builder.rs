use std::path::Path;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use super::env::EnvSource;
use super::file::FileSource;
use super::section::select_section;
use super::source::{merge_at_path, ConfigSource};
use super::ConfigError;

/// Builder for loading a configuration tree from TOML files and
/// environment variables.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested tables are merged recursively; other values
/// (including arrays) are replaced entirely.
///
/// When a section is set, every file document is narrowed to the table
/// named after the environment before it is merged (see
/// [`with_section`](Self::with_section)).
///
/// ## Example
///
/// ```no_run
/// use bootstrap_fnd::Config;
///
/// let tree = Config::builder()
///     .with_file("config/config.toml", true)
///     .with_file("config/local.toml", false)
///     .with_env("APP", "__")
///     .with_section("production")
///     .load()?;
///
/// assert!(tree.contains_key("service"));
/// # Ok::<(), bootstrap_fnd::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .load() or .build() is called"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
    section: Option<String>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, loading fails when the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Overlays environment variables named `<prefix><separator><path...>`.
    ///
    /// Path segments match existing keys case-insensitively; new keys are
    /// lowercased. Values are coerced to the most specific type: integer,
    /// float, boolean, or string (fallback).
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Adds a custom source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Selects the environment section of each file document.
    pub fn with_section(mut self, name: impl Into<String>) -> Self {
        self.section = Some(name.into());
        self
    }

    /// Loads and merges all sources into one tree.
    pub fn load(self) -> Result<Table, ConfigError> {
        let mut merged = Table::new();

        for source in &self.sources {
            for entry in source.entries()? {
                let value = match (&self.section, entry.is_document(), entry.value) {
                    (Some(section), true, Value::Table(document)) => {
                        Value::Table(select_section(document, section)?)
                    }
                    (_, _, value) => value,
                };
                merge_at_path(&mut merged, &entry.path, value);
            }
        }

        Ok(merged)
    }

    /// Loads the tree and deserializes it into `T`.
    pub fn build<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        let value = Value::Table(self.load()?);
        value.try_into().map_err(ConfigError::DeserializeError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_later_files_override() {
        let base = write_file("[php]\n\"date.timezone\" = \"UTC\"\nmemory_limit = \"128M\"\n");
        let local = write_file("[php]\nmemory_limit = \"512M\"\n");

        let tree = Config::builder()
            .with_file(base.path(), true)
            .with_file(local.path(), true)
            .load()
            .unwrap();

        assert_eq!(tree["php"]["date.timezone"].as_str(), Some("UTC"));
        assert_eq!(tree["php"]["memory_limit"].as_str(), Some("512M"));
    }

    #[test]
    fn test_section_selected_per_file() {
        let file = write_file(
            "[production.mode]\ndebug = false\n\n[development]\nextends = \"production\"\n[development.mode]\ndebug = true\n",
        );

        let tree = Config::builder()
            .with_file(file.path(), true)
            .with_section("development")
            .load()
            .unwrap();

        assert_eq!(tree["mode"]["debug"].as_bool(), Some(true));
    }

    #[test]
    fn test_env_overrides_mixed_case_service() {
        let file = write_file("[service.Nella-Cache]\nclass = \"FileCache\"\n");
        std::env::set_var("BUILDERTEST__SERVICE__NELLA-CACHE__CLASS", "MemoryCache");

        let tree = Config::builder()
            .with_file(file.path(), true)
            .with_env("BUILDERTEST", "__")
            .load()
            .unwrap();
        std::env::remove_var("BUILDERTEST__SERVICE__NELLA-CACHE__CLASS");

        let services = tree["service"].as_table().unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services["Nella-Cache"]["class"].as_str(), Some("MemoryCache"));
    }

    #[test]
    fn test_missing_optional_file() {
        let tree = Config::builder()
            .with_file("/nonexistent/local.toml", false)
            .load()
            .unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_build_deserializes() {
        #[derive(serde::Deserialize)]
        struct Modes {
            mode: std::collections::HashMap<String, bool>,
        }

        let file = write_file("[mode]\nproduction = true\n");
        let modes: Modes = Config::builder()
            .with_file(file.path(), true)
            .build()
            .unwrap();

        assert_eq!(modes.mode.get("production"), Some(&true));
    }
}
