/// Application-wide configuration
///
/// Settings come from defaults, then `<config_dir>/codetales-reader/config.json`,
/// then `CODETALES_*` environment variables.
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NAME: &str = concat!("CodeTales Reader ", env!("CARGO_PKG_VERSION"));
/// Default window width.
pub const WIN_WIDTH: f32 = 1100.0;
/// Default window height.
pub const WIN_HEIGHT: f32 = 900.0;
/// Height reserved for a panel that has not loaded yet.
pub const PLACEHOLDER_HEIGHT: f32 = 480.0;

const ENV_PROJECT_ID: &str = "CODETALES_FIREBASE_PROJECT_ID";
const ENV_API_KEY: &str = "CODETALES_FIREBASE_API_KEY";
const ENV_FIXTURE: &str = "CODETALES_FIXTURE";
const ENV_HERO_COUNT: &str = "CODETALES_HERO_COUNT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{name} must be a positive number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("no content store configured: set CODETALES_FIREBASE_PROJECT_ID or CODETALES_FIXTURE")]
    MissingStore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub firebase_project_id: Option<String>,
    pub firebase_api_key: Option<String>,
    /// JSON fixture to read content from instead of Firestore
    pub fixture_path: Option<PathBuf>,
    /// Number of featured titles in the hero rotator
    pub hero_count: usize,
    pub request_timeout_secs: u64,
    /// Overrides the default library location
    pub library_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firebase_project_id: None,
            firebase_api_key: None,
            fixture_path: None,
            hero_count: 4,
            request_timeout_secs: 20,
            library_path: None,
        }
    }
}

/// Where content is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Fixture(PathBuf),
    Firestore {
        project_id: String,
        api_key: Option<String>,
    },
}

impl Config {
    /// A fixture wins over Firestore so offline runs never touch the network
    pub fn store_backend(&self) -> Result<StoreBackend, ConfigError> {
        if let Some(path) = &self.fixture_path {
            return Ok(StoreBackend::Fixture(path.clone()));
        }
        match &self.firebase_project_id {
            Some(project_id) if !project_id.trim().is_empty() => Ok(StoreBackend::Firestore {
                project_id: project_id.trim().to_string(),
                api_key: self.firebase_api_key.clone(),
            }),
            _ => Err(ConfigError::MissingStore),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Apply environment overrides through a lookup function
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_PROJECT_ID) {
            self.firebase_project_id = Some(value);
        }
        if let Some(value) = lookup(ENV_API_KEY) {
            self.firebase_api_key = Some(value);
        }
        if let Some(value) = lookup(ENV_FIXTURE) {
            self.fixture_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_HERO_COUNT) {
            self.hero_count = match value.trim().parse::<usize>() {
                Ok(count) if count > 0 => count,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        name: ENV_HERO_COUNT,
                        value,
                    })
                }
            };
        }
        Ok(())
    }
}

/// Path of the optional config file
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("codetales-reader").join("config.json"))
}

/// Read a config file; a missing file yields the defaults
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(json) => serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load the full configuration: defaults, file, environment
pub fn load() -> Result<Config, ConfigError> {
    let mut config = match config_path() {
        Some(path) => load_file(&path)?,
        None => Config::default(),
    };
    config.apply_env(|name| std::env::var(name).ok())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_file(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert!(matches!(config.store_backend(), Err(ConfigError::MissingStore)));
    }

    #[test]
    fn test_file_fields_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"firebase_project_id": "codetales", "hero_count": 6}"#).unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.hero_count, 6);
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(
            config.store_backend().unwrap(),
            StoreBackend::Firestore {
                project_id: "codetales".to_string(),
                api_key: None
            }
        );
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                (ENV_PROJECT_ID, "codetales"),
                (ENV_API_KEY, "key"),
                (ENV_FIXTURE, "/tmp/fixture.json"),
                (ENV_HERO_COUNT, "3"),
            ]))
            .unwrap();

        assert_eq!(config.hero_count, 3);
        assert_eq!(config.firebase_api_key.as_deref(), Some("key"));
        // The fixture takes precedence
        assert_eq!(
            config.store_backend().unwrap(),
            StoreBackend::Fixture(PathBuf::from("/tmp/fixture.json"))
        );
    }

    #[test]
    fn test_invalid_hero_count() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[(ENV_HERO_COUNT, "zero")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }
}
