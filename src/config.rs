//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in milliseconds applied to writes that don't carry one; None = never expire
    pub default_ttl_ms: Option<u64>,
    /// File the storage is persisted to; None = memory only
    pub snapshot_path: Option<PathBuf>,
    /// Quiet period before a burst of writes is persisted, in milliseconds
    pub snapshot_debounce_ms: u64,
    /// Minimum spacing of cache activity log lines, in milliseconds
    pub activity_log_interval_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL_MS` - TTL for writes without one (default: unset, never expire)
    /// - `SNAPSHOT_PATH` - Snapshot file (default: unset, no persistence)
    /// - `SNAPSHOT_DEBOUNCE_MS` - Snapshot quiet period (default: 500)
    /// - `ACTIVITY_LOG_INTERVAL_MS` - Activity log spacing (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").filter(|ttl| *ttl > 0),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            snapshot_debounce_ms: parse_var("SNAPSHOT_DEBOUNCE_MS")
                .unwrap_or(defaults.snapshot_debounce_ms),
            activity_log_interval_ms: parse_var("ACTIVITY_LOG_INTERVAL_MS")
                .unwrap_or(defaults.activity_log_interval_ms),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl_ms: None,
            snapshot_path: None,
            snapshot_debounce_ms: 500,
            activity_log_interval_ms: 10_000,
        }
    }
}
