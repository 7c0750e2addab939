//! Configuration management for hark.

pub mod platform;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::security;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filesystem search used when a name is neither a system command nor learned.
    pub search: SearchConfig,

    /// Shortcut index used for listing and authoring routines.
    pub index: IndexConfig,

    /// Blocked command phrases.
    pub security: SecurityConfig,

    /// Activity log.
    pub activity: ActivityConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;

        let cutoff = config.search.fuzzy_cutoff;
        if !(0.0..=1.0).contains(&cutoff) {
            anyhow::bail!(
                "invalid config {}: search.fuzzy_cutoff must be between 0.0 and 1.0, got {cutoff}",
                path.display()
            );
        }
        Ok(config)
    }

    /// Get the configuration file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the config directory path (`~/.config/hark/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config_home).join("hark"));
        }

        let base = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

        Ok(base.config_dir().join("hark"))
    }

    /// Get the data directory path (`~/.local/share/hark/`).
    ///
    /// Holds the learned-app table, the routine table and the activity log.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined.
    pub fn data_dir() -> anyhow::Result<PathBuf> {
        let base = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("could not determine data directory"))?;

        Ok(base.data_dir().join("hark"))
    }
}

/// Filesystem search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Roots walked in order.
    pub roots: Vec<PathBuf>,

    /// Extensions of shortcut-type entries (ranked first).
    pub shortcut_extensions: Vec<String>,

    /// Extensions of direct executables.
    pub executable_extensions: Vec<String>,

    /// Candidates offered for disambiguation.
    pub max_candidates: usize,

    /// Minimum similarity for a fuzzy name correction (0.0 to 1.0).
    pub fuzzy_cutoff: f64,

    /// Maximum directory depth below each root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            roots: platform::search_roots(),
            shortcut_extensions: platform::shortcut_extensions(),
            executable_extensions: platform::executable_extensions(),
            max_candidates: 5,
            fuzzy_cutoff: 0.7,
            max_depth: None,
        }
    }
}

/// Shortcut index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directories scanned for shortcuts.
    pub directories: Vec<PathBuf>,

    /// Extensions of shortcut files.
    pub extensions: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            directories: platform::index_dirs(),
            extensions: platform::shortcut_extensions(),
        }
    }
}

/// Blocked command configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Phrases that reject a command outright when they appear in it.
    pub blocked: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            blocked: security::default_blocked(),
        }
    }
}

/// Activity log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Append a line per successful launch.
    pub enabled: bool,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
