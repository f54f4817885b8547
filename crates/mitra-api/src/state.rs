//! Application state wiring configuration and services together.

use std::path::PathBuf;
use std::sync::Arc;

use mitra_infra::auth::LocalAuthService;
use mitra_infra::config::{apply_env_overrides, load_global_config};
use mitra_infra::filesystem::resolve_data_dir;
use mitra_types::config::GlobalConfig;

/// Shared state handed to every command.
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: GlobalConfig,
    pub auth: Arc<LocalAuthService>,
}

impl AppState {
    /// Resolve the data directory, load config, open the account store.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = apply_env_overrides(load_global_config(&data_dir).await);
        let auth = LocalAuthService::open(&data_dir).await?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            backend = %config.backend,
            "Application state initialized"
        );

        Ok(Self {
            data_dir,
            config,
            auth: Arc::new(auth),
        })
    }
}
