//! CLI configuration.
//!
//! Read from TOML. Every key is optional:
//!
//! ```toml
//! log_level = "info"
//! color = false
//!
//! [bindings]
//! schema = "public"
//! tenants = [1, 2, 3]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BindError, BindResult};
use crate::value::Value;

/// sqlbind configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Colorize terminal output.
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default bindings, overridden by anything given on the command line.
    #[serde(default)]
    pub bindings: toml::Table,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            color: true,
            bindings: toml::Table::new(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> BindResult<Self> {
        toml::from_str(text).map_err(|e| BindError::Config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> BindResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| BindError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// `<config dir>/sqlbind/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sqlbind").join("config.toml"))
    }

    /// Load `explicit` if given, else the default file if it exists, else
    /// fall back to defaults.
    pub fn discover(explicit: Option<&Path>) -> BindResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// The `[bindings]` table converted to bindable values.
    pub fn bindings(&self) -> BindResult<BTreeMap<String, Value>> {
        self.bindings
            .iter()
            .map(|(name, value)| {
                Value::try_from(value.clone())
                    .map(|v| (name.clone(), v))
                    .map_err(|e| BindError::Config(format!("binding '{}': {}", name, e)))
            })
            .collect()
    }
}
