//! Data directory layout for Mitra.
//!
//! Everything lives under one directory (`~/.mitra` by default):
//! `config.toml`, the user store `users.json`, the signed-in marker
//! `session.json`, and exported transcripts under `transcripts/`.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MITRA_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `MITRA_DATA_DIR` environment variable
/// 2. `~/.mitra`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".mitra");
    }

    // Last resort: current directory
    PathBuf::from(".mitra")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

pub fn users_path(data_dir: &Path) -> PathBuf {
    data_dir.join("users.json")
}

pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join("session.json")
}

pub fn transcripts_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("transcripts")
}

/// Write `content` to `path`, creating parent directories first.
///
/// Writes to a sibling temp file and renames it into place so readers
/// never observe a half-written file.
pub async fn write_atomic(path: &Path, content: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await
}
