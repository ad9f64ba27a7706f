//! # Settings Registry Service
//!
//! A typed, layered settings system for the project manager and the editor
//! toolbar.
//!
//! ## Philosophy
//!
//! - **Typed settings**: All settings have explicit types, not stringly-typed
//! - **Layered**: built-in defaults < settings file < environment
//! - **Deterministic**: Settings are serializable and reproducible
//! - **Testable**: the environment is passed in, never read behind your back
//!
//! ## Example
//!
//! ```
//! use services_settings::{SettingsRegistry, SettingValue, SettingLayer};
//!
//! let mut registry = SettingsRegistry::new();
//! registry.register_default("projects.timeout_secs", SettingValue::Integer(10));
//! registry.set("projects.timeout_secs", SettingValue::Integer(3), SettingLayer::File);
//!
//! assert_eq!(registry.get_integer("projects.timeout_secs"), Some(3));
//! ```

pub mod persistence;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known setting keys
pub mod keys {
    /// Base URL of the projects backend
    pub const PROJECTS_API_URL: &str = "projects.api_url";
    /// HTTP timeout for backend calls, in seconds
    pub const PROJECTS_TIMEOUT_SECS: &str = "projects.timeout_secs";
    /// Pre-filled value of the link URL prompt
    pub const TOOLBAR_LINK_DEFAULT: &str = "toolbar.link_default";
    /// Maximum number of undo steps the editor keeps
    pub const EDITOR_HISTORY_DEPTH: &str = "editor.history_depth";
    /// Minimum level written by the console logger
    pub const LOG_LEVEL: &str = "log.level";
}

/// Setting key (path-like identifier)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SettingKey(String);

impl SettingKey {
    /// Creates a new setting key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks if this key starts with the given prefix
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SettingKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Setting value (strongly typed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValue {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl SettingValue {
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            SettingValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Parses `raw` into a value of the same variant as `self`
    pub fn parse_like(&self, raw: &str) -> Result<SettingValue, SettingsError> {
        let raw = raw.trim();
        match self {
            SettingValue::Boolean(_) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(SettingValue::Boolean(true)),
                "0" | "false" | "no" | "off" => Ok(SettingValue::Boolean(false)),
                _ => Err(SettingsError::InvalidValue {
                    expected: "boolean",
                    raw: raw.to_string(),
                }),
            },
            SettingValue::Integer(_) => raw
                .parse::<i64>()
                .map(SettingValue::Integer)
                .map_err(|_| SettingsError::InvalidValue {
                    expected: "integer",
                    raw: raw.to_string(),
                }),
            SettingValue::String(_) => Ok(SettingValue::String(raw.to_string())),
        }
    }

    fn same_variant(&self, other: &SettingValue) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Boolean(v) => write!(f, "{}", v),
            SettingValue::Integer(v) => write!(f, "{}", v),
            SettingValue::String(v) => write!(f, "{}", v),
        }
    }
}

/// Where a value came from; later layers win
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingLayer {
    Default,
    File,
    Environment,
}

/// Settings errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("Type mismatch for {key}: expected {expected}")]
    TypeMismatch { key: String, expected: String },

    #[error("Invalid {expected} value: {raw:?}")]
    InvalidValue { expected: &'static str, raw: String },

    #[error("Failed to read settings file: {0}")]
    Io(String),

    #[error("Failed to parse settings file: {0}")]
    Parse(String),

    #[error("Unsupported settings version: {0}")]
    UnsupportedVersion(u32),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Environment variable to setting key bindings
pub const ENV_BINDINGS: &[(&str, &str)] = &[
    ("PROJECTS_API_URL", keys::PROJECTS_API_URL),
    ("PROJECTS_TIMEOUT_SECS", keys::PROJECTS_TIMEOUT_SECS),
    ("TOOLBAR_LINK_DEFAULT", keys::TOOLBAR_LINK_DEFAULT),
    ("EDITOR_HISTORY_DEPTH", keys::EDITOR_HISTORY_DEPTH),
    ("LOG_LEVEL", keys::LOG_LEVEL),
];

/// Settings registry
#[derive(Debug)]
pub struct SettingsRegistry {
    defaults: BTreeMap<SettingKey, SettingValue>,
    layers: BTreeMap<SettingLayer, BTreeMap<SettingKey, SettingValue>>,
}

impl SettingsRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            defaults: BTreeMap::new(),
            layers: BTreeMap::new(),
        }
    }

    /// Creates a registry with the built-in defaults registered
    pub fn with_builtin_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_default(keys::PROJECTS_API_URL, SettingValue::String(String::new()));
        registry.register_default(keys::PROJECTS_TIMEOUT_SECS, SettingValue::Integer(10));
        registry.register_default(
            keys::TOOLBAR_LINK_DEFAULT,
            SettingValue::String("https://".to_string()),
        );
        registry.register_default(keys::EDITOR_HISTORY_DEPTH, SettingValue::Integer(100));
        registry.register_default(keys::LOG_LEVEL, SettingValue::String("info".to_string()));
        registry
    }

    /// Registers a default setting
    pub fn register_default(&mut self, key: impl Into<SettingKey>, value: SettingValue) {
        self.defaults.insert(key.into(), value);
    }

    /// Sets a value on a layer above the defaults
    ///
    /// Setting [`SettingLayer::Default`] replaces the default itself.
    pub fn set(&mut self, key: impl Into<SettingKey>, value: SettingValue, layer: SettingLayer) {
        let key = key.into();
        if layer == SettingLayer::Default {
            self.defaults.insert(key, value);
            return;
        }
        self.layers.entry(layer).or_default().insert(key, value);
    }

    /// Sets a value, checking it against the registered default's type
    pub fn set_checked(
        &mut self,
        key: impl Into<SettingKey>,
        value: SettingValue,
        layer: SettingLayer,
    ) -> SettingsResult<()> {
        let key = key.into();
        let default = self
            .defaults
            .get(&key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        if !default.same_variant(&value) {
            return Err(SettingsError::TypeMismatch {
                key: key.to_string(),
                expected: variant_name(default).to_string(),
            });
        }
        self.set(key, value, layer);
        Ok(())
    }

    /// Removes a value from a layer
    pub fn unset(&mut self, key: &SettingKey, layer: SettingLayer) -> bool {
        self.layers
            .get_mut(&layer)
            .map(|values| values.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Gets the effective setting value (highest layer wins)
    pub fn get(&self, key: impl Into<SettingKey>) -> Option<&SettingValue> {
        self.get_with_layer(key).map(|(value, _)| value)
    }

    /// Gets the effective value together with the layer that supplied it
    pub fn get_with_layer(
        &self,
        key: impl Into<SettingKey>,
    ) -> Option<(&SettingValue, SettingLayer)> {
        let key = key.into();
        for (layer, values) in self.layers.iter().rev() {
            if let Some(value) = values.get(&key) {
                return Some((value, *layer));
            }
        }
        self.defaults
            .get(&key)
            .map(|value| (value, SettingLayer::Default))
    }

    pub fn get_string(&self, key: impl Into<SettingKey>) -> Option<&str> {
        self.get(key).and_then(|v| v.as_string())
    }

    pub fn get_integer(&self, key: impl Into<SettingKey>) -> Option<i64> {
        self.get(key).and_then(|v| v.as_integer())
    }

    pub fn get_boolean(&self, key: impl Into<SettingKey>) -> Option<bool> {
        self.get(key).and_then(|v| v.as_boolean())
    }

    /// Gets the default value for a setting
    pub fn get_default(&self, key: &SettingKey) -> Option<&SettingValue> {
        self.defaults.get(key)
    }

    /// Returns all default setting keys
    pub fn list_defaults(&self) -> Vec<SettingKey> {
        self.defaults.keys().cloned().collect()
    }

    /// Returns all effective settings with a given prefix
    pub fn list_with_prefix(&self, prefix: &str) -> Vec<(SettingKey, SettingValue)> {
        let mut merged: BTreeMap<SettingKey, SettingValue> = self
            .defaults
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for values in self.layers.values() {
            for (key, value) in values {
                if key.starts_with(prefix) {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }

        merged.into_iter().collect()
    }

    /// Applies environment variables to the environment layer
    ///
    /// Only variables named in [`ENV_BINDINGS`] are considered. Each raw
    /// value is parsed with the type of the registered default. Returns the
    /// keys that were set.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> SettingsResult<Vec<SettingKey>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut applied = Vec::new();
        for (name, raw) in vars {
            let Some((_, key)) = ENV_BINDINGS.iter().find(|(env, _)| *env == name.as_ref())
            else {
                continue;
            };
            let key = SettingKey::new(*key);
            let default = self
                .defaults
                .get(&key)
                .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
            let value = default.parse_like(raw.as_ref())?;
            self.set(key.clone(), value, SettingLayer::Environment);
            applied.push(key);
        }
        Ok(applied)
    }

    /// Applies the current process environment
    pub fn apply_process_env(&mut self) -> SettingsResult<Vec<SettingKey>> {
        self.apply_env(std::env::vars())
    }

    /// Exports a layer for persistence
    pub fn export_layer(&self, layer: SettingLayer) -> BTreeMap<SettingKey, SettingValue> {
        if layer == SettingLayer::Default {
            return self.defaults.clone();
        }
        self.layers.get(&layer).cloned().unwrap_or_default()
    }

    /// Replaces a layer's contents
    pub fn import_layer(
        &mut self,
        layer: SettingLayer,
        values: BTreeMap<SettingKey, SettingValue>,
    ) {
        if layer == SettingLayer::Default {
            self.defaults = values;
        } else {
            self.layers.insert(layer, values);
        }
    }
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::with_builtin_defaults()
    }
}

fn variant_name(value: &SettingValue) -> &'static str {
    match value {
        SettingValue::Boolean(_) => "boolean",
        SettingValue::Integer(_) => "integer",
        SettingValue::String(_) => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let registry = SettingsRegistry::with_builtin_defaults();
        assert_eq!(registry.get_integer(keys::PROJECTS_TIMEOUT_SECS), Some(10));
        assert_eq!(registry.get_string(keys::TOOLBAR_LINK_DEFAULT), Some("https://"));
        assert_eq!(registry.get_string(keys::PROJECTS_API_URL), Some(""));
    }

    #[test]
    fn test_layer_precedence() {
        let mut registry = SettingsRegistry::with_builtin_defaults();
        registry.set(
            keys::PROJECTS_API_URL,
            SettingValue::String("http://file".into()),
            SettingLayer::File,
        );
        assert_eq!(
            registry.get_with_layer(keys::PROJECTS_API_URL),
            Some((&SettingValue::String("http://file".into()), SettingLayer::File))
        );

        registry.set(
            keys::PROJECTS_API_URL,
            SettingValue::String("http://env".into()),
            SettingLayer::Environment,
        );
        assert_eq!(registry.get_string(keys::PROJECTS_API_URL), Some("http://env"));

        assert!(registry.unset(&SettingKey::new(keys::PROJECTS_API_URL), SettingLayer::Environment));
        assert_eq!(registry.get_string(keys::PROJECTS_API_URL), Some("http://file"));
    }

    #[test]
    fn test_set_checked_rejects_wrong_type() {
        let mut registry = SettingsRegistry::with_builtin_defaults();
        let result = registry.set_checked(
            keys::PROJECTS_TIMEOUT_SECS,
            SettingValue::String("ten".into()),
            SettingLayer::File,
        );
        assert_eq!(
            result,
            Err(SettingsError::TypeMismatch {
                key: keys::PROJECTS_TIMEOUT_SECS.to_string(),
                expected: "integer".to_string(),
            })
        );

        let result = registry.set_checked("nope", SettingValue::Integer(1), SettingLayer::File);
        assert_eq!(result, Err(SettingsError::UnknownKey("nope".to_string())));
    }

    #[test]
    fn test_apply_env_parses_with_default_type() {
        let mut registry = SettingsRegistry::with_builtin_defaults();
        let applied = registry
            .apply_env(vec![
                ("PROJECTS_API_URL", "http://localhost:8000"),
                ("PROJECTS_TIMEOUT_SECS", " 3 "),
                ("UNRELATED", "ignored"),
            ])
            .unwrap();

        assert_eq!(applied.len(), 2);
        assert_eq!(registry.get_string(keys::PROJECTS_API_URL), Some("http://localhost:8000"));
        assert_eq!(registry.get_integer(keys::PROJECTS_TIMEOUT_SECS), Some(3));
    }

    #[test]
    fn test_apply_env_rejects_bad_integer() {
        let mut registry = SettingsRegistry::with_builtin_defaults();
        let err = registry
            .apply_env(vec![("PROJECTS_TIMEOUT_SECS", "soon")])
            .unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidValue {
                expected: "integer",
                raw: "soon".to_string()
            }
        );
    }

    #[test]
    fn test_parse_like_boolean() {
        let template = SettingValue::Boolean(false);
        assert_eq!(template.parse_like("Yes"), Ok(SettingValue::Boolean(true)));
        assert_eq!(template.parse_like("off"), Ok(SettingValue::Boolean(false)));
        assert!(template.parse_like("maybe").is_err());
    }

    #[test]
    fn test_list_with_prefix_merges_layers() {
        let mut registry = SettingsRegistry::with_builtin_defaults();
        registry.set(
            keys::PROJECTS_TIMEOUT_SECS,
            SettingValue::Integer(1),
            SettingLayer::File,
        );

        let projects = registry.list_with_prefix("projects.");
        assert_eq!(projects.len(), 2);
        assert!(projects.contains(&(
            SettingKey::new(keys::PROJECTS_TIMEOUT_SECS),
            SettingValue::Integer(1)
        )));
    }
}
