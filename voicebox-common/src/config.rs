//! Configuration loading
//!
//! `BotConfig` is the process-wide configuration for the playback engine.
//! Resolution follows a fixed priority order:
//! 1. Explicit path passed by the caller (highest priority)
//! 2. `VOICEBOX_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/voicebox/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing file at priority 3 silently falls through to defaults; an
//! unreadable or malformed file at any earlier priority is an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::types::GuildId;
use crate::{Error, Result};

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_event_capacity() -> usize {
    256
}

/// One-shot scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the one-shot scheduler commands are available at all
    #[serde(default)]
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: false }
    }
}

/// Per-guild overrides, keyed by guild id under `[guilds.<id>]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildConfig {
    /// Overrides the global scheduler enablement for this guild
    #[serde(default)]
    pub scheduler_enabled: Option<bool>,
}

/// Process-wide playback engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bound on how long a voice channel join may take before the attempt is
    /// abandoned and `ConnectionTimeout` is reported
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Event bus buffer size
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub guilds: HashMap<String, GuildConfig>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            event_capacity: default_event_capacity(),
            scheduler: SchedulerConfig::default(),
            guilds: HashMap::new(),
        }
    }
}

impl BotConfig {
    /// Load configuration following the documented priority order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        // Priority 1: explicit path
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        // Priority 2: environment variable
        if let Ok(path) = std::env::var("VOICEBOX_CONFIG") {
            return Self::from_file(Path::new(&path));
        }

        // Priority 3: platform config directory
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // Priority 4: compiled defaults
        Ok(Self::default())
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Default platform config path (`<config_dir>/voicebox/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("voicebox").join("config.toml"))
    }

    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.connect_timeout_secs)
    }

    /// Scheduler availability for a guild, falling back to the global setting
    pub fn scheduler_enabled_for(&self, guild: GuildId) -> bool {
        self.guilds
            .get(&guild.to_string())
            .and_then(|g| g.scheduler_enabled)
            .unwrap_or(self.scheduler.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = BotConfig::default();
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(!config.scheduler.enabled);
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "connect_timeout_secs = 3\n\n[scheduler]\nenabled = true"
        )
        .unwrap();

        let config = BotConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.connect_timeout_secs, 3);
        assert_eq!(config.event_capacity, 256); // default preserved
        assert!(config.scheduler.enabled);
    }

    #[test]
    fn guild_overrides_win_over_the_global_scheduler_setting() {
        let config: BotConfig = toml::from_str(
            "[scheduler]\nenabled = true\n\n[guilds.42]\nscheduler_enabled = false",
        )
        .unwrap();

        assert!(!config.scheduler_enabled_for(GuildId(42)));
        assert!(config.scheduler_enabled_for(GuildId(7))); // global fallback
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "connect_timeout_secs = \"soon\"").unwrap();

        let err = BotConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        let err = BotConfig::load(Some(Path::new("/nonexistent/voicebox.toml"))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
