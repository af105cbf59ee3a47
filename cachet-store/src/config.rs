//! Store configuration
//!
//! The data directory is passed to `Database::instance`/`open` directly;
//! `Config` carries the time windows of the anti-replay machinery.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default window within which a request nonce is considered fresh.
pub const DEFAULT_REQUEST_FRESHNESS: Duration = Duration::from_secs(300);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("data directory does not exist: {}", .0.display())]
    MissingDataDir(PathBuf),

    #[error("data directory is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Time windows for request freshness and nonce retention.
#[derive(Debug, Clone)]
pub struct Config {
    /// How far a request nonce's timestamp may deviate from server time.
    pub request_freshness: Duration,
    /// How long seen nonces are retained before `clear_old_nonces` removes
    /// them. Must cover the freshness window or replays become possible.
    pub nonce_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_freshness: DEFAULT_REQUEST_FRESHNESS,
            nonce_ttl: DEFAULT_REQUEST_FRESHNESS * 2,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the freshness window; the nonce TTL follows at twice the window
    /// unless overridden afterwards with [`Config::nonce_ttl`].
    pub fn request_freshness(mut self, window: Duration) -> Self {
        self.request_freshness = window;
        self.nonce_ttl = window * 2;
        self
    }

    pub fn nonce_ttl(mut self, ttl: Duration) -> Self {
        self.nonce_ttl = ttl;
        self
    }
}
