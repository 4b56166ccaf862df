use super::Result;
use crate::error::{ConfigError, StorageError};
use crate::map_io_error;
use crate::utils::validation::validate_url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    pub api_url: String,
    pub timeout_seconds: Option<u64>,
    pub search_debounce_ms: Option<u64>,
    pub download_dir: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: None,
            search_debounce_ms: None,
            download_dir: None,
        }
    }
}

impl Profile {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(
            self.search_debounce_ms
                .unwrap_or(DEFAULT_SEARCH_DEBOUNCE_MS),
        )
    }

    /// Directory exported reports are written to; falls back to the
    /// user's download directory, then the working directory.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Apply a `config set <key> <value>` assignment.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        match key {
            "api_url" => {
                validate_url(value).map_err(|e| ConfigError::InvalidValue {
                    field: key.to_string(),
                    value: value.to_string(),
                    reason: e.to_string(),
                })?;
                self.api_url = value.trim_end_matches('/').to_string();
            }
            "timeout_seconds" => self.timeout_seconds = Some(parse_number(key, value)?),
            "search_debounce_ms" => self.search_debounce_ms = Some(parse_number(key, value)?),
            "download_dir" => self.download_dir = Some(value.to_string()),
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> std::result::Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
        field: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl Config {
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = map_io_error!(fs::read_to_string(&config_path), &config_path)?;

        let config: Config =
            toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
                message: e.to_string(),
            })?;

        Ok(config)
    }

    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            map_io_error!(fs::create_dir_all(parent), parent)?;
        }

        let toml_content =
            toml::to_string(self).map_err(|e| StorageError::ConfigSaveFailed {
                message: e.to_string(),
            })?;

        map_io_error!(fs::write(&config_path, toml_content), &config_path)?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(StorageError::ConfigDirNotFound)?;
        Ok(config_dir.join("stockroom").join("config.toml"))
    }

    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Profile to use when none is named on the command line.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_profile, None);
        assert_eq!(config.profiles.len(), 0);
        assert_eq!(config.active_profile_name(None), "default");
        assert_eq!(config.active_profile_name(Some("staging")), "staging");
    }

    #[test]
    fn test_profile_set() {
        let mut profile = Profile::default();
        assert_eq!(profile.search_debounce(), Duration::from_millis(500));

        profile.set("api_url", "https://stock.example.com/").unwrap();
        profile.set("search_debounce_ms", "250").unwrap();
        profile.set("download_dir", "/tmp/reports").unwrap();

        assert_eq!(profile.api_url, "https://stock.example.com");
        assert_eq!(profile.search_debounce(), Duration::from_millis(250));
        assert_eq!(profile.download_dir(), PathBuf::from("/tmp/reports"));

        assert!(matches!(
            profile.set("api_url", "stock.example.com"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            profile.set("timeout_seconds", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            profile.set("theme", "dark"),
            Err(ConfigError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_config_load_save() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.default_profile = Some("test".to_string());
        config.set_profile(
            "test".to_string(),
            Profile {
                api_url: "http://example.test".to_string(),
                timeout_seconds: Some(10),
                search_debounce_ms: Some(300),
                download_dir: None,
            },
        );

        config
            .save(Some(config_path.clone()))
            .expect("Failed to save config");

        let loaded_config = Config::load(Some(config_path)).expect("Failed to load config");
        assert_eq!(loaded_config.default_profile, config.default_profile);
        assert_eq!(loaded_config.get_profile("test"), config.get_profile("test"));
        assert_eq!(loaded_config.active_profile_name(None), "test");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = Config::load(Some(temp_dir.path().join("missing.toml")))
            .expect("Failed to load default config");
        assert_eq!(config.default_profile, None);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "profiles = 3").unwrap();
        assert!(matches!(
            Config::load(Some(path)),
            Err(StorageError::ConfigParseError { .. })
        ));
    }
}
