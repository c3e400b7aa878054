//! Runtime configuration handed to the jobs
//!
//! The binary fills this from CLI flags and environment variables; the
//! library never reads the environment itself.

use crate::market::DEFAULT_BASE_URL;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-request timeout for market API calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Full snapshot (recipes + all material prices)
    pub snapshot_path: PathBuf,
    /// Life-material snapshot
    pub life_snapshot_path: PathBuf,
    /// Bearer token for market searches
    pub market_token: Option<String>,
    /// Bearer token for per-item stats
    pub stats_token: Option<String>,
    pub api_base_url: String,
    pub timeout: Duration,
    /// Zone for snapshot timestamps; server local time when unset
    pub timezone: Option<Tz>,
}

impl Config {
    /// Configuration rooted in one data directory, without tokens
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            database_path: dir.join("craft.db"),
            snapshot_path: dir.join("craft_data.json"),
            life_snapshot_path: dir.join("life_data.json"),
            market_token: None,
            stats_token: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            timezone: None,
        }
    }

    /// Default data directory: ~/.local/share/craft_sync
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("craft_sync")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_dir(Self::default_data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_layout() {
        let config = Config::with_data_dir("/tmp/craft");
        assert_eq!(config.database_path, PathBuf::from("/tmp/craft/craft.db"));
        assert_eq!(
            config.snapshot_path,
            PathBuf::from("/tmp/craft/craft_data.json")
        );
        assert_eq!(
            config.life_snapshot_path,
            PathBuf::from("/tmp/craft/life_data.json")
        );
        assert_ne!(config.snapshot_path, config.life_snapshot_path);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.market_token.is_none());
    }
}
