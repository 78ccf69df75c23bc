use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use client_core::{
    gateway::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT},
    routes::{DEFAULT_DETAIL_ROUTE, DEFAULT_ERROR_ROUTE},
};
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "pokedex.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub detail_route: String,
    pub error_route: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            detail_route: DEFAULT_DETAIL_ROUTE.into(),
            error_route: DEFAULT_ERROR_ROUTE.into(),
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then the settings file, then `APP__*` environment variables.
///
/// A missing default file is fine; a missing file that was asked for
/// explicitly is an error.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, path, &raw)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && explicit.is_none() => {}
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path, raw: &str) -> Result<(), SettingsError> {
    let file_cfg: HashMap<String, toml::Value> =
        toml::from_str(raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    for (key, value) in file_cfg {
        let value = match value {
            toml::Value::String(text) => text,
            other => other.to_string(),
        };
        apply_value(settings, &key, value)?;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    for key in [
        "api_base_url",
        "request_timeout_secs",
        "detail_route",
        "error_route",
        "log_filter",
    ] {
        if let Some(value) = lookup(&format!("APP__{}", key.to_ascii_uppercase())) {
            apply_value(settings, key, value)?;
        }
    }
    Ok(())
}

fn apply_value(settings: &mut Settings, key: &str, value: String) -> Result<(), SettingsError> {
    match key {
        "api_base_url" => settings.api_base_url = value,
        "request_timeout_secs" => {
            settings.request_timeout_secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| SettingsError::InvalidValue {
                    key: key.to_string(),
                    value,
                })?;
        }
        "detail_route" => settings.detail_route = value,
        "error_route" => settings.error_route = value,
        "log_filter" => settings.log_filter = value,
        _ => tracing::warn!(key, "settings: ignoring unknown key"),
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
