//! Engine Configuration
//!
//! Loaded once from JSON (all fields optional) and refined by CLI flags.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Where composed PNGs are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Preferred bold TrueType face for headlines.
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    /// Rule catalog file or directory. Built-in rules when absent.
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("creatives")
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    pub fn with_rules(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = Some(path.into());
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            font_path: None,
            rules_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.output_dir.ends_with("creatives"));
    }

    #[test]
    fn test_load_and_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{"outputDir": "/srv/creatives", "rulesPath": "rules.json"}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap().with_font("/fonts/Bold.ttf");
        assert_eq!(config.output_dir, PathBuf::from("/srv/creatives"));
        assert_eq!(config.rules_path, Some(PathBuf::from("rules.json")));
        assert_eq!(config.font_path, Some(PathBuf::from("/fonts/Bold.ttf")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
