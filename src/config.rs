//! Session configuration, read once at startup.
//!
//! Values come from an optional TOML file; anything missing falls back to the
//! defaults below. Example `.autocommit.toml`:
//!
//! ```toml
//! min_time_between_commits = 300
//! remove_file_extension = true
//! file_whitelist = "assets/"
//!
//! [[rules]]
//! prefix = "assets/scripts"
//! label = "script: "
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::classify::{Classifier, ClassifierRule, default_rules};
use crate::error::ConfigError;

/// Config file looked up at the repository root.
pub const DEFAULT_CONFIG_FILE: &str = ".autocommit.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "AUTOCOMMIT_CONFIG";

/// Environment variable overriding `min_time_between_commits`.
pub const MIN_INTERVAL_ENV_VAR: &str = "AUTOCOMMIT_MIN_INTERVAL";

const DEFAULT_MIN_INTERVAL_SECS: u64 = 60 * 5;
const DEFAULT_WHITELIST: &str = "assets/";
const DEFAULT_DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoCommitConfig {
    /// Minimum seconds between two automatic commits of the same path.
    pub min_time_between_commits: u64,
    /// Drop the final extension from filenames in commit messages.
    pub remove_file_extension: bool,
    /// Only paths starting with this prefix are committed.
    pub file_whitelist: String,
    /// Directory-prefix labels, first match wins.
    pub rules: Vec<ClassifierRule>,
    /// Quiet period before a burst of file events triggers a commit run.
    pub debounce_ms: u64,
}

impl Default for AutoCommitConfig {
    fn default() -> Self {
        Self {
            min_time_between_commits: DEFAULT_MIN_INTERVAL_SECS,
            remove_file_extension: true,
            file_whitelist: DEFAULT_WHITELIST.to_string(),
            rules: default_rules(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl AutoCommitConfig {
    /// Load configuration for the repository at `repo_root`.
    ///
    /// Lookup order: `explicit` path, then `AUTOCOMMIT_CONFIG`, then
    /// `.autocommit.toml` in `repo_root`, then built-in defaults. A file named
    /// explicitly (flag or env var) must exist.
    pub fn load(explicit: Option<&Path>, repo_root: &Path) -> Result<Self, ConfigError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_ENV_VAR).ok().filter(|v| !v.is_empty()).map(PathBuf::from));

        let mut config = match named {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                Self::from_file(&path)?
            }
            None => {
                let path = repo_root.join(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(&path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `AUTOCOMMIT_MIN_INTERVAL` if it holds a valid number of seconds.
    ///
    /// Logs a warning and keeps the current value otherwise.
    fn apply_env_overrides(&mut self) {
        match env::var(MIN_INTERVAL_ENV_VAR) {
            Ok(v) if !v.is_empty() => match v.parse::<u64>() {
                Ok(secs) => self.min_time_between_commits = secs,
                Err(_) => warn!(
                    "Invalid {} value '{}', using {}s",
                    MIN_INTERVAL_ENV_VAR, v, self.min_time_between_commits
                ),
            },
            _ => {}
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rule) = self.rules.iter().find(|r| r.prefix.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "rule with label '{}' has an empty prefix",
                rule.label
            )));
        }
        Ok(())
    }

    /// Build the path classifier described by this config.
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.rules.clone(), self.remove_file_extension)
    }
}
