//! Global configuration loader for Mitra.
//!
//! Reads `config.toml` from the data directory (`~/.mitra/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed. Selected fields can then be
//! overridden from the environment.

use std::path::Path;

use mitra_types::config::{BackendKind, GlobalConfig};

/// Environment variable overriding `webhook_id`.
pub const WEBHOOK_ID_ENV: &str = "MITRA_WEBHOOK_ID";

/// Environment variable overriding `backend` (`hosted` or `mock`).
pub const BACKEND_ENV: &str = "MITRA_BACKEND";

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = crate::filesystem::config_path(data_dir);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Apply `MITRA_WEBHOOK_ID` / `MITRA_BACKEND` from the process environment.
pub fn apply_env_overrides(config: GlobalConfig) -> GlobalConfig {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary lookup. Blank values are ignored and an
/// unknown backend name keeps the configured backend.
pub fn apply_overrides(
    mut config: GlobalConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> GlobalConfig {
    if let Some(webhook_id) = lookup(WEBHOOK_ID_ENV).filter(|v| !v.trim().is_empty()) {
        config.webhook_id = webhook_id.trim().to_string();
    }

    if let Some(raw) = lookup(BACKEND_ENV).filter(|v| !v.trim().is_empty()) {
        match raw.trim().parse::<BackendKind>() {
            Ok(backend) => config.backend = backend,
            Err(err) => tracing::warn!("Ignoring {BACKEND_ENV}: {err}"),
        }
    }

    config
}

/// Reply timeout as a `Duration`, never zero.
pub fn reply_timeout(config: &GlobalConfig) -> std::time::Duration {
    std::time::Duration::from_secs(config.reply_timeout_secs.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.backend, BackendKind::Hosted);
        assert_eq!(config.reply_timeout_secs, 30);
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
backend = "mock"
webhook_id = "hook-123"
reply_timeout_secs = 10
mock_reply_delay_ms = 50
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.webhook_id, "hook-123");
        assert_eq!(config.reply_timeout_secs, 10);
        assert_eq!(config.mock_reply_delay_ms, 50);
        assert_eq!(config.assistant_name, "KIIT Assistant");
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.backend, BackendKind::Hosted);
        assert_eq!(config.webhook_id, GlobalConfig::default().webhook_id);
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_replace_webhook_and_backend() {
        let config = apply_overrides(
            GlobalConfig::default(),
            env(&[(WEBHOOK_ID_ENV, " other-hook "), (BACKEND_ENV, "MOCK")]),
        );
        assert_eq!(config.webhook_id, "other-hook");
        assert_eq!(config.backend, BackendKind::Mock);
    }

    #[test]
    fn blank_or_invalid_overrides_are_ignored() {
        let config = apply_overrides(
            GlobalConfig::default(),
            env(&[(WEBHOOK_ID_ENV, "  "), (BACKEND_ENV, "carrier-pigeon")]),
        );
        assert_eq!(config.webhook_id, GlobalConfig::default().webhook_id);
        assert_eq!(config.backend, BackendKind::Hosted);
    }

    #[test]
    fn reply_timeout_has_floor() {
        let mut config = GlobalConfig::default();
        assert_eq!(reply_timeout(&config), Duration::from_secs(30));
        config.reply_timeout_secs = 0;
        assert_eq!(reply_timeout(&config), Duration::from_secs(1));
    }
}
