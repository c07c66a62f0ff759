//! Configuration loading and config file resolution
//!
//! Configuration file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config directory (`<config_dir>/ckit/config.toml`)
//! 4. Built-in defaults (no file)
//!
//! A missing config file is not an error: a warning is logged and the
//! built-in defaults are used.

use crate::easing::Easing;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "CKIT_CONFIG";

/// Player configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Host loop tick interval in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Playback defaults
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Playback defaults applied when a script does not override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Easing used by actions that don't name one
    #[serde(default)]
    pub default_easing: Easing,

    /// EventBus capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_tick_interval_ms() -> u64 {
    16 // ~60 ticks per second
}

fn default_event_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            playback: PlaybackConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_easing: Easing::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the player cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.playback.event_capacity == 0 {
            return Err(Error::Config(
                "playback.event_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Host loop tick interval as Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Resolve which config file to read
///
/// Returns `None` when no candidate exists, in which case defaults apply.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    default_config_path().filter(|path| path.exists())
}

/// Platform config file location (`~/.config/ckit/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ckit").join("config.toml"))
}

/// Load configuration from `path`, falling back to defaults
///
/// - `None`: defaults
/// - Missing file: warning + defaults
/// - Unreadable or malformed file: error
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        debug!("No config file, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = TomlConfig::parse(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}
