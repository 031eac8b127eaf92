use std::sync::Arc;

use tracing::{error, info};

use crate::application::use_cases::commit::CommitUseCase;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::{AppConfig, StoreBackend};
use crate::infrastructure::db::{RecordStore, RestRecordStore, SqliteRecordStore};
use crate::interfaces::commands::AppState;

/// Build the configured record store and the shared application state
pub async fn bootstrap(config: &AppConfig) -> Result<Arc<AppState>> {
    config.validate()?;

    let store = connect_store(config).await.map_err(|err| {
        error!(error = %err, backend = ?config.store.backend, "Failed to initialize record store");
        err
    })?;

    info!(backend = ?config.store.backend, "Import pipeline ready");
    Ok(Arc::new(AppState::new(
        config.clone(),
        CommitUseCase::new(store),
    )))
}

async fn connect_store(config: &AppConfig) -> Result<Arc<dyn RecordStore + Send + Sync>> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let store = SqliteRecordStore::init(&config.store.database_url).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Rest => {
            let url = config.store.rest_url.as_deref().ok_or_else(|| {
                AppError::ConfigError("store.rest_url is required for the rest backend".to_string())
            })?;
            let key = config.store.rest_api_key.clone().unwrap_or_default();
            Ok(Arc::new(RestRecordStore::new(url, key)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_sqlite() {
        let mut config = AppConfig::default();
        config.store.database_url = "sqlite::memory:".to_string();

        let state = bootstrap(&config).await.unwrap();
        assert_eq!(state.config.store.backend, StoreBackend::Sqlite);
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_incomplete_rest_config() {
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Rest;

        assert!(matches!(
            bootstrap(&config).await,
            Err(AppError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_bootstrap_rest() {
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Rest;
        config.store.rest_url = Some("https://project.example.co".to_string());
        config.store.rest_api_key = Some("anon-key".to_string());

        assert!(bootstrap(&config).await.is_ok());
    }
}
