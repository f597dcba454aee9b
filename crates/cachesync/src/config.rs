use std::{env, time::Duration};

use cachesync_core::transport::{Topology, DEFAULT_EXCHANGE, DEFAULT_QUEUE};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis URL of the cache replica (default: "redis://localhost:6379")
    pub redis_url: String,
    /// Redis URL of the fan-out transport (default: same as `redis_url`)
    pub broker_url: String,
    /// Path to the SQLite record store (default: "cachesync.db")
    pub sqlite_path: String,
    /// Fanout exchange name (default: "user_exchange")
    pub exchange_name: String,
    /// Queue bound to the exchange (default: "user_queue")
    pub queue_name: String,
    /// Maximum entries of the in-memory cache (default: 10,000)
    pub cache_max_entries: usize,
    /// Publish timeout in milliseconds, 0 disables it (default: 5,000)
    pub publish_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REDIS_URL` - Cache connection URL (default: "redis://localhost:6379")
    /// - `BROKER_URL` - Transport connection URL (default: `REDIS_URL`)
    /// - `SQLITE_PATH` - SQLite database path (default: "cachesync.db")
    /// - `EXCHANGE_NAME` - Exchange name (default: "user_exchange")
    /// - `QUEUE_NAME` - Queue name (default: "user_queue")
    /// - `CACHE_MAX_ENTRIES` - In-memory cache capacity (default: 10,000)
    /// - `PUBLISH_TIMEOUT_MS` - Publish timeout, 0 disables (default: 5,000)
    pub fn from_env() -> Self {
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Self {
            broker_url: env::var("BROKER_URL").unwrap_or_else(|_| redis_url.clone()),
            redis_url,
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "cachesync.db".to_string()),
            exchange_name: env::var("EXCHANGE_NAME")
                .unwrap_or_else(|_| DEFAULT_EXCHANGE.to_string()),
            queue_name: env::var("QUEUE_NAME").unwrap_or_else(|_| DEFAULT_QUEUE.to_string()),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(10_000),
            publish_timeout_ms: env::var("PUBLISH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
        }
    }

    /// Publish timeout as a Duration, `None` when disabled.
    pub fn publish_timeout(&self) -> Option<Duration> {
        (self.publish_timeout_ms > 0).then(|| Duration::from_millis(self.publish_timeout_ms))
    }

    /// The exchange/queue topology shared by publisher and subscriber.
    pub fn topology(&self) -> Topology {
        Topology::new(&self.exchange_name, &self.queue_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
