//! Configuration management for reelscout.
//!
//! Configuration is read from `~/.config/reelscout/config.toml` unless a
//! path is given on the command line. If the file doesn't exist, a default
//! configuration with comments is created.

use crate::crawler::{BrowserConfig, EngineConfig};
use crate::domain::CountryProviderCatalog;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub engine: EngineConfig,
    pub catalog: CountryProviderCatalog,
    pub database: DatabaseConfig,
}

/// Where releases are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file (default: `~/.local/share/reelscout/reelscout.db`)
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, or from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/reelscout/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("reelscout").join("config.toml"))
    }

    /// Render the effective configuration, catalog included.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# reelscout configuration
#
# Every key is optional; missing keys fall back to the values shown here.
# Run `reelscout config` to print the full effective configuration,
# including the built-in country/provider catalog.

[browser]
# Run Chrome without a visible window
headless = true

# CDP request timeout in seconds
timeout_secs = 30

# Wait after a navigation for dynamic content (milliseconds)
wait_after_load_ms = 1000

# Wait after a scroll gesture for lazily loaded titles (milliseconds)
scroll_settle_ms = 1500

# Viewport size; timeline rails only load what fits the viewport
window_width = 1920
window_height = 1080

# user_agent = "Mozilla/5.0 ..."

[engine]
base_url = "https://www.justwatch.com"

# Label of the runtime row on title pages, per site language
runtime_labels = ["Laufzeit", "Runtime"]

# Wait for the cookie overlay before dismissing it (milliseconds)
consent_settle_ms = 5000

# Redirect polling for streaming links
resolve_attempts = 10
resolve_interval_ms = 1000

# Wheel delta of one scroll gesture in pixels
scroll_step_px = 1920.0

# Top titles: how many per provider, and how well known they must be
top_quota = 3
min_num_ratings = 10000

# Grid loading and sampling budget
grid_target_items = 500
grid_max_scrolls = 50
max_sample_rounds = 50

# Fix the sampling seed for reproducible runs
# sample_seed = 42

[database]
# path = "/var/lib/reelscout/reelscout.db"

# Override or extend the catalog, for example:
#
# [catalog.slugs]
# "Netflix" = "netflix"
#
# [catalog.countries."Germany"."Netflix"]
# new_releases_url = "https://www.justwatch.com/de/Anbieter/netflix/Neu/Filme"
# top_rated_url = "https://www.justwatch.com/de/Anbieter/netflix/Filme?sort_by=imdb_score"
# default_link = "https://www.netflix.com/browse"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to render config: {0}")]
    Serialize(#[source] toml::ser::Error),
}
