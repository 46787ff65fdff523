//! Configuration loading for skillgap.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.skillgap/config.toml`)
//! 3. User config (`~/.skillgap/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. A diagnosis runs with the built-in
//! defaults when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FailOpen, Result, SkillGapError};
use crate::stats::{curriculum, DEFAULT_HORIZON_DAYS, DEFAULT_SUBJECT};

/// Name of the per-project configuration directory.
pub const PROJECT_DIR: &str = ".skillgap";

/// Name of the configuration file inside a config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Log level used when neither `SKILLGAP_LOG` nor config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Valid values for the logging level field.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace", "off"];

/// Main configuration struct for skillgap.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Curriculum planner configuration.
    pub planner: PlannerConfig,
    /// Outcome prediction configuration.
    pub prediction: PredictionConfig,
    /// Log output configuration.
    pub logging: LoggingConfig,
}

/// Curriculum planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerConfig {
    /// Objectives/activities per plan when the request does not say.
    pub max_activities: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_activities: curriculum::DEFAULT_MAX_ACTIVITIES as u32,
        }
    }
}

/// Outcome prediction configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PredictionConfig {
    /// Subject label reported on the prediction.
    pub subject: String,
    /// Prediction horizon in days.
    pub horizon_days: u32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl PredictionConfig {
    /// Check if a horizon value is valid (at least one day).
    pub fn is_valid_horizon(value: u32) -> bool {
        value >= 1
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive for the stderr subscriber.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Check if a level value is valid.
    pub fn is_valid_level(value: &str) -> bool {
        VALID_LOG_LEVELS.contains(&value.to_ascii_lowercase().as_str())
    }
}

impl Config {
    /// Load configuration for a working directory.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.skillgap/config.toml` at the project root)
    /// 3. User config (`<skillgap_home>/config.toml`)
    /// 4. Defaults
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();
        config.validate_logging();

        config
    }

    /// Load user config from `<skillgap_home>/config.toml`.
    fn load_user_config() -> Option<Config> {
        let path = skillgap_home()?.join(CONFIG_FILE);
        Self::load_layer(&path)
    }

    /// Load project config from the project root of `cwd`.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_layer(&project_config_path(cwd))
    }

    /// A missing file is silently skipped; a broken one is reported and skipped.
    fn load_layer(path: &Path) -> Option<Config> {
        if !path.is_file() {
            return None;
        }
        Self::load_from_file(path)
            .map(Some)
            .fail_open_with(&format!("loading {}", path.display()), None)
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| SkillGapError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| SkillGapError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // SKILLGAP_MAX_ACTIVITIES
        if let Ok(val) = env::var("SKILLGAP_MAX_ACTIVITIES") {
            match val.trim().parse::<u32>() {
                Ok(n) => self.planner.max_activities = n,
                Err(_) => eprintln!(
                    "Warning: Invalid SKILLGAP_MAX_ACTIVITIES value '{}'. \
                    Expected a non-negative integer. Using '{}'.",
                    val, self.planner.max_activities
                ),
            }
        }

        // SKILLGAP_HORIZON_DAYS
        if let Ok(val) = env::var("SKILLGAP_HORIZON_DAYS") {
            match val.trim().parse::<u32>() {
                Ok(n) if PredictionConfig::is_valid_horizon(n) => {
                    self.prediction.horizon_days = n;
                }
                _ => eprintln!(
                    "Warning: Invalid SKILLGAP_HORIZON_DAYS value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val, self.prediction.horizon_days
                ),
            }
        }
    }

    /// Reset an unknown `logging.level` to the default.
    fn validate_logging(&mut self) {
        if LoggingConfig::is_valid_level(&self.logging.level) {
            self.logging.level = self.logging.level.to_ascii_lowercase();
        } else {
            tracing::warn!(
                level = %self.logging.level,
                "invalid logging.level, expected one of {:?}; using '{}'",
                VALID_LOG_LEVELS,
                DEFAULT_LOG_LEVEL
            );
            self.logging.level = DEFAULT_LOG_LEVEL.to_string();
        }
    }

    /// Merge another config into this one.
    ///
    /// Values from `other` take precedence if they differ from the default.
    /// A layer that explicitly sets a field to its default value therefore
    /// cannot reset a non-default value from a lower layer.
    fn merge(mut self, other: Config) -> Self {
        let default_planner = PlannerConfig::default();
        if other.planner.max_activities != default_planner.max_activities {
            self.planner.max_activities = other.planner.max_activities;
        }

        let default_prediction = PredictionConfig::default();
        if other.prediction.subject != default_prediction.subject {
            self.prediction.subject = other.prediction.subject;
        }
        if other.prediction.horizon_days != default_prediction.horizon_days {
            self.prediction.horizon_days = other.prediction.horizon_days;
        }

        if other.logging.level != LoggingConfig::default().level {
            self.logging.level = other.logging.level;
        }

        self
    }

    /// Save configuration to the project config file.
    ///
    /// Writes `<cwd>/.skillgap/config.toml`, creating the directory if needed.
    /// Uses atomic write (write to temp file, then rename).
    pub fn save_project(&self, cwd: &Path) -> Result<PathBuf> {
        let project_dir = cwd.join(PROJECT_DIR);

        if !project_dir.exists() {
            fs::create_dir_all(&project_dir)
                .map_err(|e| SkillGapError::storage(&project_dir, e))?;
        }

        let config_path = project_dir.join(CONFIG_FILE);

        let content =
            toml::to_string_pretty(self).map_err(|e| SkillGapError::serde(e.to_string()))?;

        let temp_path = project_dir.join(".config.toml.tmp");
        fs::write(&temp_path, &content).map_err(|e| SkillGapError::storage(&temp_path, e))?;

        let file =
            fs::File::open(&temp_path).map_err(|e| SkillGapError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| SkillGapError::storage(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &config_path)
            .map_err(|e| SkillGapError::storage(&config_path, e))?;

        Ok(config_path)
    }
}

/// Get the skillgap home directory.
///
/// Uses `SKILLGAP_HOME` when set to a non-empty value, otherwise
/// `~/.skillgap`. Returns `None` only when no home directory can be found.
pub fn skillgap_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("SKILLGAP_HOME") {
        if home.is_empty() {
            tracing::warn!("SKILLGAP_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("SKILLGAP_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    dirs::home_dir().map(|home| home.join(PROJECT_DIR))
}

/// Find the project root for a given working directory.
///
/// The nearest ancestor (including `cwd` itself) that contains a
/// `.skillgap/` directory wins. Without one, `cwd` is the root.
pub fn find_project_root(cwd: &Path) -> PathBuf {
    cwd.ancestors()
        .find(|ancestor| ancestor.join(PROJECT_DIR).is_dir())
        .unwrap_or(cwd)
        .to_path_buf()
}

/// Get the project config path for a working directory.
///
/// Returns `<project_root>/.skillgap/config.toml`.
pub fn project_config_path(cwd: &Path) -> PathBuf {
    find_project_root(cwd).join(PROJECT_DIR).join(CONFIG_FILE)
}

/// Get the crash log path.
///
/// Returns `<skillgap_home>/crash.log`.
pub fn crash_log_path() -> Option<PathBuf> {
    skillgap_home().map(|h| h.join("crash.log"))
}
