use serde::{Deserialize, Serialize};

use std::future::Future;
use std::path::Path;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "NOTEWISE_API_URL";
/// Environment variable holding the bearer token.
pub const ENV_TOKEN: &str = "NOTEWISE_TOKEN";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "NOTEWISE_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// The base URL of the notes API.
    pub endpoint: String,
    /// Bearer token attached to every request, if any.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self, ConfigError> {
        loader.load().await
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<(), ConfigError> {
        saver.save(self).await
    }

    /// Overlay values from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `NOTEWISE_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(endpoint) = lookup(ENV_API_URL) {
            self.endpoint = endpoint;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
        }
        Ok(self)
    }
}

impl Default for ApiConfig {
    /// Creates a new default configuration.
    ///
    /// The default configuration targets a local development server.
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/api".to_owned(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    /// Loads the configuration data.
    fn load(&self) -> impl Future<Output = Result<ApiConfig, ConfigError>> + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    /// Saves the configuration data.
    fn save(&self, config: &ApiConfig) -> impl Future<Output = Result<(), ConfigError>> + Send;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new [`FileStore`] with the given path.
    ///
    /// [`ApiConfig`] data will be serialized and deserialized using the file extension.
    /// Supports `.json` and `.toml` files.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }
}

impl Loader for FileStore {
    async fn load(&self) -> Result<ApiConfig, ConfigError> {
        match self.extension() {
            Some("json") => Ok(serde_json::from_str(&std::fs::read_to_string(&self.path)?)?),
            Some("toml") => Ok(toml::from_str(&std::fs::read_to_string(&self.path)?)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_owned(),
            )),
        }
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &ApiConfig) -> Result<(), ConfigError> {
        match self.extension() {
            Some("json") => Ok(std::fs::write(
                &self.path,
                serde_json::to_string_pretty(config)?,
            )?),
            Some("toml") => Ok(std::fs::write(&self.path, toml::to_string_pretty(config)?)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_owned(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("notewise-config-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn test_toml_round_trip() {
        let store = FileStore::new(temp_path("cfg.toml"));
        let config = ApiConfig {
            endpoint: "https://notes.example.com/api".into(),
            token: Some("secret".into()),
            timeout_secs: 5,
        };
        config.save(&store).await.unwrap();
        let loaded = ApiConfig::load(&store).await.unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn test_json_partial_file_uses_defaults() {
        let store = FileStore::new(temp_path("cfg.json"));
        std::fs::write(store.path(), r#"{"endpoint": "http://10.0.0.2/api"}"#).unwrap();
        let loaded = ApiConfig::load(&store).await.unwrap();
        assert_eq!(loaded.endpoint, "http://10.0.0.2/api");
        assert_eq!(loaded.timeout_secs, ApiConfig::default().timeout_secs);
        assert!(loaded.token.is_none());
        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let store = FileStore::new(temp_path("cfg.yaml"));
        let err = ApiConfig::load(&store).await.unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "yaml"));
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::default()
            .with_overrides(|key| match key {
                ENV_API_URL => Some("https://api.test".into()),
                ENV_TOKEN => Some("".into()),
                ENV_TIMEOUT_SECS => Some(" 12 ".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.endpoint, "https://api.test");
        assert_eq!(config.token, None);
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn test_bad_timeout_override() {
        let err = ApiConfig::default()
            .with_overrides(|key| (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS,
                ..
            }
        ));
    }
}
