//! Layered settings.
//!
//! Precedence, lowest to highest: built-in defaults, the JSON settings
//! file under the user config directory, then `RULEKIT_`-prefixed
//! environment variables.

use std::env;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;
use rulekit_session::{DEFAULT_COMPACTION_TTL_MS, DEFAULT_SESSION_CAPACITY};

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "RULEKIT_";

/// Runtime configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RulekitSettings {
    /// Maximum number of tracked sessions.
    pub session_capacity: usize,
    /// How long injection stays suppressed after compaction starts, in ms.
    pub compaction_ttl_ms: u64,
    /// Maximum number of paths listed in a compaction summary.
    pub max_compaction_paths: usize,
    /// Rule directories to scan. Empty means the default global and
    /// project-local roots.
    pub rule_roots: Vec<PathBuf>,
}

impl Default for RulekitSettings {
    fn default() -> Self {
        Self {
            session_capacity: DEFAULT_SESSION_CAPACITY,
            compaction_ttl_ms: DEFAULT_COMPACTION_TTL_MS,
            max_compaction_paths: 20,
            rule_roots: Vec::new(),
        }
    }
}

/// Path of the user settings file, if a config directory can be resolved.
///
/// `$XDG_CONFIG_HOME/rulekit/settings.json`, falling back to
/// `~/.config/rulekit/settings.json`.
#[must_use]
pub fn settings_path() -> Option<PathBuf> {
    let config_home = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(config_home.join("rulekit").join("settings.json"))
}

/// Load settings from the default file location plus the environment.
///
/// # Errors
///
/// Returns an error when no config directory can be resolved or when a
/// layer fails to parse. A missing settings file is not an error.
pub fn load_settings() -> Result<RulekitSettings, SettingsError> {
    let path = settings_path().ok_or(SettingsError::NoConfigDir)?;
    load_settings_from_path(&path)
}

/// Load settings from an explicit file path plus the environment.
///
/// # Errors
///
/// Returns an error when a layer fails to parse.
pub fn load_settings_from_path(path: &Path) -> Result<RulekitSettings, SettingsError> {
    let settings = Figment::from(Serialized::defaults(RulekitSettings::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    Ok(settings)
}
