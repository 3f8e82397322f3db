//! Registry configuration.
//!
//! Configuration is optional and lives in a small JSON file:
//!
//! ```json
//! {
//!   "default_debounce_ms": 150,
//!   "disabled_keys": ["F", "G"]
//! }
//! ```
//!
//! A missing file is not an error; the defaults are used instead.

use crate::key::Key;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings applied by the registry to new registrations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeybindConfig {
    /// Debounce used when a request does not set one.
    #[serde(default)]
    pub default_debounce_ms: u64,
    /// Keys whose bindings start out disabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_keys: Vec<Key>,
}

impl KeybindConfig {
    /// Load the configuration from `path`, falling back to defaults if the file
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read keybind config {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to load keybind config {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse keybind config JSON")
    }

    pub fn is_key_disabled(&self, key: Key) -> bool {
        self.disabled_keys.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = KeybindConfig::load(temp_dir.path().join("keybinds.json")).unwrap();
        assert_eq!(config, KeybindConfig::default());
    }

    #[test]
    fn load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keybinds.json");
        fs::write(&path, r#"{ "default_debounce_ms": 150, "disabled_keys": ["f"] }"#).unwrap();

        let config = KeybindConfig::load(&path).unwrap();
        assert_eq!(config.default_debounce_ms, 150);
        assert!(config.is_key_disabled(Key::parse("F").unwrap()));
        assert!(!config.is_key_disabled(Key::parse("E").unwrap()));
    }

    #[test]
    fn partial_file_uses_field_defaults() {
        let config = KeybindConfig::from_json_str("{}").unwrap();
        assert_eq!(config, KeybindConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keybinds.json");
        fs::write(&path, r#"{ "disabled_keys": ["too long"] }"#).unwrap();

        let err = KeybindConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("keybind config"));
    }
}
