//! Configuration for the developer console.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, Result};

/// History configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of remembered lines (default: 100)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: default_max_entries() }
    }
}

/// Script runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Delay after each dispatched line, in milliseconds (default: 50)
    #[serde(default = "default_line_delay_ms")]
    pub line_delay_ms: u64,
    /// Pause used when a `pause(...)` directive cannot be parsed (default: 1.0)
    #[serde(default = "default_pause_secs")]
    pub default_pause_secs: f64,
    /// Lines starting with this prefix are skipped (default: "//")
    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,
    /// Lines starting with this prefix are pause directives (default: "pause(")
    #[serde(default = "default_pause_directive")]
    pub pause_directive: String,
}

fn default_line_delay_ms() -> u64 {
    50
}

fn default_pause_secs() -> f64 {
    1.0
}

fn default_comment_prefix() -> String {
    "//".to_string()
}

fn default_pause_directive() -> String {
    "pause(".to_string()
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            line_delay_ms: default_line_delay_ms(),
            default_pause_secs: default_pause_secs(),
            comment_prefix: default_comment_prefix(),
            pause_directive: default_pause_directive(),
        }
    }
}

impl ScriptConfig {
    /// Delay inserted after every dispatched script line.
    pub fn line_delay(&self) -> Duration {
        Duration::from_millis(self.line_delay_ms)
    }

    /// Fallback pause duration.
    pub fn default_pause(&self) -> Duration {
        Duration::try_from_secs_f64(self.default_pause_secs).unwrap_or(Duration::from_secs(1))
    }
}

/// Root configuration for the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Version shown in the banner.
    #[serde(default = "default_version")]
    pub version: String,
    /// Product name shown in the banner.
    #[serde(default = "default_banner")]
    pub banner: String,
    /// History configuration.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Script configuration.
    #[serde(default)]
    pub script: ScriptConfig,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_banner() -> String {
    "DevConsole".to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            banner: default_banner(),
            history: HistoryConfig::default(),
            script: ScriptConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded console configuration");
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject values the console cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.history.max_entries == 0 {
            return Err(ConsoleError::Config("history.max_entries must be at least 1".to_string()));
        }
        if !self.script.default_pause_secs.is_finite() || self.script.default_pause_secs < 0.0 {
            return Err(ConsoleError::Config(
                "script.default_pause_secs must be a non-negative number".to_string(),
            ));
        }
        if self.script.comment_prefix.trim().is_empty() {
            return Err(ConsoleError::Config("script.comment_prefix must not be empty".to_string()));
        }
        if self.script.pause_directive.trim().is_empty() {
            return Err(ConsoleError::Config(
                "script.pause_directive must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
