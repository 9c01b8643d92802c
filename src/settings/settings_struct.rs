use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::yaml::proxy_group_output::default_rules;

fn default_short_id_length() -> usize {
    8
}

fn default_fallback_marker() -> char {
    '@'
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings for the subscription service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fragment profile; when non-empty, TLS entries skip certificate
    /// verification
    pub fragment: String,
    /// Length of generated Reality short-ids
    #[serde(default = "default_short_id_length")]
    pub short_id_length: usize,
    /// First character of a listen address that marks a fallback inbound
    #[serde(default = "default_fallback_marker")]
    pub fallback_marker: char,
    /// Routing rules appended to every document
    #[serde(default = "default_rules")]
    pub rules: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            fragment: String::new(),
            short_id_length: default_short_id_length(),
            fallback_marker: default_fallback_marker(),
            rules: default_rules(),
        }
    }
}

impl Settings {
    pub fn fragment_enabled(&self) -> bool {
        !self.fragment.is_empty()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, SettingsError> {
        // An empty YAML document deserializes to null, not to a map
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load settings from a file, picking YAML for `.yaml`/`.yml` and TOML
    /// otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let settings = if is_yaml {
            Self::from_yaml_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
