//! Bridge Configuration
//!
//! Loaded from a `sodium-bridge.toml` file. The bridge looks at the path in
//! `SODIUM_BRIDGE_CONFIG` first, then walks up from the current directory.
//! When nothing is found the defaults apply.
//!
//! # Example
//!
//! ```toml
//! [bridge]
//! absent_buffers = "reject"   # or "delegate" (default)
//! trace_calls = true
//!
//! [logging]
//! enabled = true
//! level = "debug"
//! format = "json"             # or "pretty" (default)
//! ```

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::logging::LogFormat;

/// Name of the configuration file searched for
pub const CONFIG_FILE_NAME: &str = "sodium-bridge.toml";

/// Environment variable holding an explicit configuration path
pub const CONFIG_ENV_VAR: &str = "SODIUM_BRIDGE_CONFIG";

static GLOBAL_CONFIG: OnceCell<BridgeConfig> = OnceCell::new();

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub bridge: BridgeSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Marshalling behaviour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// What to do when a required buffer is absent
    #[serde(default)]
    pub absent_buffers: AbsentPolicy,

    /// Log every invocation at debug level
    #[serde(default)]
    pub trace_calls: bool,
}

/// Handling of absent required buffers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentPolicy {
    /// Hand the primitive a null, zero-length argument and let it fail
    #[default]
    Delegate,
    /// Return `ABSENT_REQUIRED` without calling the primitive
    Reject,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Install a subscriber during `init`
    #[serde(default)]
    pub enabled: bool,

    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl BridgeConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find `sodium-bridge.toml` in `start_dir` or any parent and load it
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let mut dir = start_dir.to_path_buf();

        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let config = Self::load(&config_path)?;
                return Ok(Some((config_path, config)));
            }

            if !dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve configuration from the environment variable, then the
    /// directory search, then defaults. Unreadable files fall back to
    /// defaults with a warning.
    pub fn discover() -> Self {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            return match Self::load(&path) {
                Ok(config) => config,
                Err(err) => {
                    warn!(path = %path.display(), %err, "ignoring bridge config");
                    Self::default()
                }
            };
        }

        let Ok(cwd) = std::env::current_dir() else {
            return Self::default();
        };
        match Self::find_and_load(&cwd) {
            Ok(Some((_, config))) => config,
            Ok(None) => Self::default(),
            Err(err) => {
                warn!(%err, "ignoring bridge config");
                Self::default()
            }
        }
    }
}

/// Process-wide configuration, discovered on first use
pub fn global() -> &'static BridgeConfig {
    GLOBAL_CONFIG.get_or_init(BridgeConfig::discover)
}

/// Install an explicit configuration before first use.
///
/// Returns the configuration back if one is already in place.
pub fn install(config: BridgeConfig) -> Result<(), BridgeConfig> {
    GLOBAL_CONFIG.set(config)
}
