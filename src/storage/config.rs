use super::Result;
use crate::error::{ConfigError, StorageError};
use crate::utils::validation::validate_url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Keys accepted by `config set`
pub const PROFILE_KEYS: [&str; 4] = [
    "server_url",
    "timeout_seconds",
    "default_connection",
    "use_colors",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    pub server_url: String,
    pub timeout_seconds: Option<u64>,
    /// Connection id used when none is given on the command line
    pub default_connection: Option<String>,
    pub use_colors: Option<bool>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_seconds: None,
            default_connection: None,
            use_colors: None,
        }
    }
}

impl Profile {
    /// `(key, value)` pairs for display; unset values read "(not set)"
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let unset = || "(not set)".to_string();
        vec![
            ("server_url", self.server_url.clone()),
            (
                "timeout_seconds",
                self.timeout_seconds.map_or_else(unset, |t| t.to_string()),
            ),
            (
                "default_connection",
                self.default_connection.clone().unwrap_or_else(unset),
            ),
            (
                "use_colors",
                self.use_colors.map_or_else(unset, |c| c.to_string()),
            ),
        ]
    }
}

impl Config {
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if !config_path.exists() {
            log::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
                message: format!("{}: {}", config_path.display(), e),
            })?;

        Ok(config)
    }

    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::FileIo {
                path: parent.to_string_lossy().to_string(),
                source,
            })?;
        }

        let toml_content = toml::to_string(self).map_err(|e| StorageError::ConfigSaveFailed {
            message: e.to_string(),
        })?;

        fs::write(&config_path, toml_content).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        Ok(())
    }

    /// `<config dir>/askdb/config.toml`
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(StorageError::ConfigDirNotFound)?;
        Ok(Self::file_in(&config_dir.join("askdb")))
    }

    pub fn file_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Requested name, else the configured default, else `default`
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or(DEFAULT_PROFILE)
            .to_string()
    }

    /// Profile to run with. An explicitly requested profile must exist;
    /// otherwise a missing profile falls back to defaults.
    pub fn resolve(&self, requested: Option<&str>) -> std::result::Result<Profile, ConfigError> {
        let name = self.active_profile_name(requested);
        match (self.get_profile(&name), requested) {
            (Some(profile), _) => Ok(profile.clone()),
            (None, Some(_)) => Err(ConfigError::ProfileNotFound { name }),
            (None, None) => Ok(Profile::default()),
        }
    }

    /// Update one key of a profile, creating the profile if needed
    pub fn set_profile_field(
        &mut self,
        profile: &str,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        // Validate before touching the profile so a bad value creates nothing
        let mut updated = self.profiles.get(profile).cloned().unwrap_or_default();
        match key {
            "server_url" => {
                validate_url(value).map_err(|_| invalid("must be an http(s) URL"))?;
                updated.server_url = value.trim_end_matches('/').to_string();
            }
            "timeout_seconds" => {
                let seconds: u64 = value
                    .parse()
                    .map_err(|_| invalid("must be a whole number of seconds"))?;
                if seconds == 0 {
                    return Err(invalid("must be greater than zero"));
                }
                updated.timeout_seconds = Some(seconds);
            }
            "default_connection" => {
                let value = value.trim();
                updated.default_connection = (!value.is_empty()).then(|| value.to_string());
            }
            "use_colors" => {
                let enabled = parse_bool(value).ok_or_else(|| invalid("must be true or false"))?;
                updated.use_colors = Some(enabled);
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                });
            }
        }

        self.profiles.insert(profile.to_string(), updated);
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
