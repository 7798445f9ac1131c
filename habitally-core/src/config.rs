//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/habitally/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/habitally/` (~/.config/habitally/)
//! - Data: `$XDG_DATA_HOME/habitally/` (~/.local/share/habitally/)
//! - State/Logs: `$XDG_STATE_HOME/habitally/` (~/.local/state/habitally/)

use crate::error::{Error, Result};
use crate::metrics::StreakPolicy;
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Metrics engine options
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Defaults for the goal created with every habit
    #[serde(default)]
    pub goals: GoalsConfig,

    /// Insight generation options
    #[serde(default)]
    pub insights: InsightsConfig,

    /// Password hashing options
    #[serde(default)]
    pub auth: AuthConfig,

    /// Database location override
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metrics engine configuration
#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct MetricsConfig {
    /// Whether a streak survives days without completion
    #[serde(default)]
    pub streak_policy: StreakPolicy,
}

/// Default goal attached to new habits
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct GoalsConfig {
    /// Completions required
    #[serde(default = "default_goal_target")]
    pub default_target: u32,

    /// Days from habit creation until the goal's target date
    #[serde(default = "default_goal_days")]
    pub default_days: u32,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            default_target: default_goal_target(),
            default_days: default_goal_days(),
        }
    }
}

fn default_goal_target() -> u32 {
    7
}

fn default_goal_days() -> u32 {
    7
}

/// Insight generation configuration
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct InsightsConfig {
    /// Probability (0.0-1.0) that a toggle also generates a new insight
    #[serde(default = "default_generate_chance")]
    pub generate_chance: f64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            generate_chance: default_generate_chance(),
        }
    }
}

fn default_generate_chance() -> f64 {
    0.3
}

/// Password hashing configuration
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct AuthConfig {
    /// bcrypt work factor for new password hashes (4-31)
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_bcrypt_cost() -> u32 {
    crate::auth::DEFAULT_COST
}

/// Database configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DatabaseConfig {
    /// Override for the SQLite file location
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.insights.generate_chance) {
            return Err(Error::Config(
                "insights.generate_chance must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.goals.default_target == 0 {
            return Err(Error::Config(
                "goals.default_target must be at least 1".to_string(),
            ));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(Error::Config(
                "auth.bcrypt_cost must be between 4 and 31".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/habitally/config.toml` (~/.config/habitally/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("habitally").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/habitally/` (~/.local/share/habitally/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("habitally")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/habitally/` (~/.local/state/habitally/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("habitally")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/habitally/habits.db` (~/.local/share/habitally/habits.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("habits.db")
    }

    /// Database path honoring `[database] path` when set.
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(Self::database_path)
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/habitally/habitally.log` (~/.local/state/habitally/habitally.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("habitally.log")
    }

    /// Pin the XDG base directory environment variables to their defaults
    /// when unset, so every later path lookup in the process agrees.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
