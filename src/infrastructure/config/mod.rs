use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::import::ImportConfig;

pub const CONFIG_FILE: &str = "grc_import.toml";
pub const ENV_PREFIX: &str = "GRC_IMPORT_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    #[validate(length(min = 1, message = "database_url must not be empty"))]
    pub database_url: String,

    #[validate(url(message = "rest_url must be a valid URL"))]
    pub rest_url: Option<String>,

    pub rest_api_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_url: "sqlite://grc_import.db".to_string(),
            rest_url: None,
            rest_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info,grc_import_lib=debug`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub import: ImportConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// `.env`, then `grc_import.toml` in the working directory, then
    /// `GRC_IMPORT_*` variables (`GRC_IMPORT_STORE__BACKEND=rest`)
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_figment(Self::figment(Path::new(CONFIG_FILE)))
    }

    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.import.check()?;
        self.store
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid store config: {}", e)))?;

        if self.store.backend == StoreBackend::Rest {
            if self.store.rest_url.is_none() {
                return Err(AppError::ConfigError(
                    "store.rest_url is required for the rest backend".to_string(),
                ));
            }
            if self.store.rest_api_key.as_deref().unwrap_or("").is_empty() {
                return Err(AppError::ConfigError(
                    "store.rest_api_key is required for the rest backend".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::Delimiter;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_toml_and_env_layers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "grc_import.toml",
                r#"
                [import]
                sample_lines = 5
                fallback_delimiter = "semicolon"

                [store]
                database_url = "sqlite://imports.db"
                "#,
            )?;
            jail.set_env("GRC_IMPORT_LOGGING__FILTER", "debug");

            let config =
                AppConfig::from_figment(AppConfig::figment(Path::new("grc_import.toml"))).unwrap();
            assert_eq!(config.import.sample_lines, 5);
            assert_eq!(config.import.fallback_delimiter, Delimiter::Semicolon);
            assert_eq!(config.store.database_url, "sqlite://imports.db");
            assert_eq!(config.logging.filter, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_rest_backend_requires_url_and_key() {
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Rest;
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));

        config.store.rest_url = Some("https://project.example.co".to_string());
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));

        config.store.rest_api_key = Some("anon-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_rest_url() {
        let mut config = AppConfig::default();
        config.store.rest_url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }
}
