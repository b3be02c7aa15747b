//! Service configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Total thread capacity shared by all running jobs. Zero or negative
    /// means "use the host's available parallelism".
    pub max_threads: i64,
    /// HTTP port to listen on.
    pub port: u16,
    /// Interval between bucket-count log lines.
    pub stats_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_threads: 1,
            port: 8080,
            stats_interval: Duration::from_secs(5),
        }
    }
}

impl ServiceConfig {
    /// Build the configuration from the environment. Environment values take
    /// precedence over the built-in defaults; unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("MAX_THREADS") {
            if let Ok(threads) = value.parse() {
                config.max_threads = threads;
            }
        }
        if let Ok(value) = std::env::var("STOWAGE_PORT") {
            if let Ok(port) = value.parse() {
                config.port = port;
            }
        }
        config
    }

    /// Resolved thread capacity: a non-positive `max_threads` falls back to
    /// the host's available parallelism.
    pub fn thread_capacity(&self) -> usize {
        if self.max_threads <= 0 {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            self.max_threads as usize
        }
    }
}
