//! Configuration management for opshell
//!
//! Every section is optional in the TOML file; missing values fall back to
//! the defaults below. Durations use humantime notation (`"300ms"`, `"10s"`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::logging::LogFormat;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub navigation: NavigationConfig,
    pub dialogs: DialogConfig,
    pub debounce: DebounceConfig,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Key of the route every failed or unresolved navigation falls back to
    pub default_route: String,

    /// Watchdog for a destination page's `load`; `None` waits forever
    #[serde(with = "opt_duration", skip_serializing_if = "Option::is_none")]
    pub load_timeout: Option<Duration>,

    /// Maximum number of locations kept for back/forward
    pub history_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Exit animation length awaited by animated dialogs before removal
    #[serde(with = "duration")]
    pub close_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    #[serde(with = "duration")]
    pub threshold: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub format: String,
    pub level: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            default_route: String::new(),
            load_timeout: None,
            history_limit: 50,
        }
    }
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            close_delay: Duration::from_millis(150),
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            threshold: Duration::from_millis(300),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            level: "info".to_string(),
        }
    }
}

impl ShellConfig {
    /// Load configuration from the default location
    ///
    /// An explicit `OPSHELL_CONFIG` path must exist. The default XDG location
    /// is optional: when no file is there, defaults are used.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("OPSHELL_CONFIG") {
            let path = PathBuf::from(shellexpand::tilde(&path).to_string());
            return Self::load_from_path(&path);
        }

        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ShellConfig = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.navigation.load_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidValue(
                "navigation.load_timeout must be greater than zero".to_string(),
            )
            .into());
        }
        if self.navigation.history_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "navigation.history_limit must be at least 1".to_string(),
            )
            .into());
        }
        self.log_format()?;
        Ok(())
    }

    /// Parsed logging format
    pub fn log_format(&self) -> Result<LogFormat> {
        self.logging
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::InvalidValue(e).into())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("opshell").join("config.toml"))
}

mod duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

mod opt_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
