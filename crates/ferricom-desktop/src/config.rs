//! Front-end configuration.
//!
//! A small TOML file holding the keybinding map and window options:
//!
//! ```toml
//! scale = 3
//!
//! [keys]
//! a = "x"
//! b = "z"
//! start = "enter"
//! select = "rshift"
//! up = "up"
//! down = "down"
//! left = "left"
//! right = "right"
//! ```
//!
//! Looked up at the platform config path
//! (`~/.config/ferricom/config.toml` on Linux) unless overridden on the
//! command line. A missing file means defaults; a malformed file is an
//! error the user should see.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File existed but could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// File did not parse as TOML.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
}

/// The config file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Integer window scale (1-8).
    #[serde(default = "default_scale")]
    pub scale: u32,

    /// Button-name to key-name bindings. Missing buttons keep their
    /// defaults.
    #[serde(default)]
    pub keys: HashMap<String, String>,
}

fn default_scale() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            keys: HashMap::new(),
        }
    }
}

impl Config {
    /// Default bindings: arrows for the D-pad, X/Z for A/B, Enter for
    /// Start, right shift for Select.
    pub const DEFAULT_KEYS: [(&'static str, &'static str); 8] = [
        ("a", "x"),
        ("b", "z"),
        ("select", "rshift"),
        ("start", "enter"),
        ("up", "up"),
        ("down", "down"),
        ("left", "left"),
        ("right", "right"),
    ];

    /// Load from an explicit path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the platform config path; a missing file is the default
    /// config.
    pub fn load_default_location() -> Result<Self, ConfigError> {
        let Some(path) = Self::default_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Platform config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ferricom").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The effective binding for a button: the configured key name or the
    /// built-in default.
    #[must_use]
    pub fn key_for(&self, button: &str) -> Option<&str> {
        if let Some(name) = self.keys.get(button) {
            return Some(name.as_str());
        }
        Self::DEFAULT_KEYS
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, k)| *k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_buttons() {
        let config = Config::default();
        for button in ["a", "b", "select", "start", "up", "down", "left", "right"] {
            assert!(config.key_for(button).is_some(), "no default for {button}");
        }
    }

    #[test]
    fn file_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            scale = 2

            [keys]
            a = "space"
            "#,
        )
        .unwrap();
        assert_eq!(config.scale, 2);
        assert_eq!(config.key_for("a"), Some("space"));
        assert_eq!(config.key_for("b"), Some("z"), "unbound keys fall back");
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "keys = 3").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
