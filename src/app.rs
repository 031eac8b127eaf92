use std::sync::Arc;

use tracing::info;

use crate::domain::error::Result;
use crate::infrastructure::bootstrap::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::commands::AppState;

/// Install the global fmt subscriber; a second call is a no-op
pub fn init_tracing(filter: &str) {
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load configuration, set up logging and build the application state
pub async fn start() -> Result<Arc<AppState>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging.filter);

    info!(
        backend = ?config.store.backend,
        sample_lines = config.import.sample_lines,
        "Starting grc-import"
    );
    bootstrap(&config).await
}
