//! # CLI Console
//!
//! Command-line front end for the project manager and the editor toolbar.
//! It is NOT a shell: every invocation runs one command and exits.
//!
//! ## Design
//!
//! Settings are resolved once, up front, and everything downstream is built
//! from the resulting registry. The process environment is only read by
//! [`load_settings`]; [`load_settings_with_env`] takes it as an argument so
//! tests stay hermetic.

pub mod commands;
pub mod toolbar_demo;

use std::path::PathBuf;
use std::sync::Arc;

use services_logger::{ConsoleLogger, LogLevel, SharedLogger};
use services_settings::{keys, persistence, SettingLayer, SettingValue, SettingsRegistry};

/// Options given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleOptions {
    /// Overrides `projects.api_url`
    pub api_url: Option<String>,
    /// JSON settings file for the file layer
    pub settings_file: Option<PathBuf>,
}

/// Resolves settings from the file, the process environment and `options`
pub fn load_settings(options: &ConsoleOptions) -> Result<SettingsRegistry, String> {
    load_settings_with_env(options, std::env::vars())
}

/// Resolves settings with an explicit environment
///
/// Precedence: built-in defaults < settings file < environment < flags.
pub fn load_settings_with_env<I, K, V>(
    options: &ConsoleOptions,
    env: I,
) -> Result<SettingsRegistry, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut settings = SettingsRegistry::with_builtin_defaults();

    if let Some(path) = &options.settings_file {
        let found = persistence::load_file(&mut settings, path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;
        if !found {
            return Err(format!("Settings file not found: {}", path.display()));
        }
    }

    settings
        .apply_env(env)
        .map_err(|e| format!("Invalid environment: {}", e))?;

    if let Some(url) = &options.api_url {
        settings.set(
            keys::PROJECTS_API_URL,
            SettingValue::String(url.clone()),
            SettingLayer::Environment,
        );
    }

    Ok(settings)
}

/// Console logger at the configured `log.level`, `info` if unset or unknown
pub fn console_logger(settings: &SettingsRegistry) -> SharedLogger {
    let level = settings
        .get_string(keys::LOG_LEVEL)
        .and_then(LogLevel::parse)
        .unwrap_or(LogLevel::Info);
    Arc::new(ConsoleLogger::new(level))
}

/// Undo depth from `editor.history_depth`
pub fn history_depth(settings: &SettingsRegistry) -> usize {
    settings
        .get_integer(keys::EDITOR_HISTORY_DEPTH)
        .filter(|depth| *depth > 0)
        .map(|depth| depth as usize)
        .unwrap_or(editor_core::DEFAULT_HISTORY_DEPTH)
}
