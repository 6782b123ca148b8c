use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_KEYS: [&str; 3] = ["endpoint", "language", "output_dir"];

/// User defaults, stored as TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Base URL of the model worker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Default language code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Where generated files go when no output path is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| CliError::ConfigError("Could not find config directory".to_string()))?;
    Ok(config_dir.join("polyvox").join("config.toml"))
}

pub fn resolve_config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, format!("# Polyvox configuration\n\n{content}"))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match key {
            "endpoint" => Ok(self.endpoint.clone()),
            "language" => Ok(self.language.clone()),
            "output_dir" => Ok(self
                .output_dir
                .as_ref()
                .map(|dir| dir.display().to_string())),
            _ => Err(unknown_key(key)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CliError::InvalidInput(format!("Value for '{key}' is empty")));
        }
        match key {
            "endpoint" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    return Err(CliError::InvalidInput(format!(
                        "Endpoint must start with http:// or https://, got '{value}'"
                    )));
                }
                self.endpoint = Some(value.trim_end_matches('/').to_string());
            }
            "language" => {
                let language = polyvox_core::languages::resolve(value)?;
                self.language = Some(language.code.to_string());
            }
            "output_dir" => self.output_dir = Some(PathBuf::from(value)),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> CliError {
    CliError::InvalidInput(format!(
        "Unknown config key '{key}' (expected one of: {})",
        CONFIG_KEYS.join(", ")
    ))
}
