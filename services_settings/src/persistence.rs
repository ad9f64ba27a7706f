//! Settings persistence layer
//!
//! Loads and saves the file layer of a [`SettingsRegistry`] as versioned
//! JSON. A missing file is not an error; a malformed one is.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::{SettingKey, SettingLayer, SettingValue, SettingsError, SettingsRegistry, SettingsResult};
use serde::{Deserialize, Serialize};

/// Serializable container for the file layer
/// Uses BTreeMap for stable ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFileData {
    /// Version of the settings format (for future migrations)
    pub version: u32,
    #[serde(default)]
    pub values: BTreeMap<String, SettingValue>,
}

impl SettingsFileData {
    /// Current version of the settings format
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            values: BTreeMap::new(),
        }
    }

    pub fn from_layer(values: &BTreeMap<SettingKey, SettingValue>) -> Self {
        let mut data = Self::new();
        for (key, value) in values {
            data.values.insert(key.as_str().to_string(), value.clone());
        }
        data
    }

    pub fn to_layer(&self) -> BTreeMap<SettingKey, SettingValue> {
        self.values
            .iter()
            .map(|(key, value)| (SettingKey::new(key.as_str()), value.clone()))
            .collect()
    }
}

impl Default for SettingsFileData {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes settings to JSON bytes
pub fn serialize_settings(data: &SettingsFileData) -> SettingsResult<Vec<u8>> {
    serde_json::to_vec_pretty(data).map_err(|e| SettingsError::Parse(e.to_string()))
}

/// Deserializes settings from JSON bytes
pub fn deserialize_settings(bytes: &[u8]) -> SettingsResult<SettingsFileData> {
    let data: SettingsFileData =
        serde_json::from_slice(bytes).map_err(|e| SettingsError::Parse(e.to_string()))?;

    if data.version != SettingsFileData::CURRENT_VERSION {
        return Err(SettingsError::UnsupportedVersion(data.version));
    }

    Ok(data)
}

/// Loads `path` into the registry's file layer
///
/// Returns `Ok(false)` when the file does not exist.
pub fn load_file(registry: &mut SettingsRegistry, path: &Path) -> SettingsResult<bool> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(SettingsError::Io(e.to_string())),
    };
    let data = deserialize_settings(&bytes)?;
    registry.import_layer(SettingLayer::File, data.to_layer());
    Ok(true)
}

/// Writes the registry's file layer to `path`
pub fn save_file(registry: &SettingsRegistry, path: &Path) -> SettingsResult<()> {
    let data = SettingsFileData::from_layer(&registry.export_layer(SettingLayer::File));
    let bytes = serialize_settings(&data)?;
    fs::write(path, bytes).map_err(|e| SettingsError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    #[test]
    fn test_unsupported_version() {
        let json = br#"{"version": 9, "values": {}}"#;
        assert_eq!(
            deserialize_settings(json),
            Err(SettingsError::UnsupportedVersion(9))
        );
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            deserialize_settings(b"{not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = SettingsRegistry::with_builtin_defaults();
        let loaded = load_file(&mut registry, &dir.path().join("absent.json")).unwrap();
        assert!(!loaded);
    }

    #[test]
    fn test_save_then_load_file_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut registry = SettingsRegistry::with_builtin_defaults();
        registry.set(
            keys::PROJECTS_API_URL,
            SettingValue::String("http://api.test".into()),
            SettingLayer::File,
        );
        save_file(&registry, &path).unwrap();

        let mut fresh = SettingsRegistry::with_builtin_defaults();
        assert!(load_file(&mut fresh, &path).unwrap());
        assert_eq!(
            fresh.get_with_layer(keys::PROJECTS_API_URL),
            Some((&SettingValue::String("http://api.test".into()), SettingLayer::File))
        );
        assert_eq!(fresh.get_integer(keys::PROJECTS_TIMEOUT_SECS), Some(10));
    }
}
