//! Application configuration loaded from environment variables.

/// Which event-bus variant to wire at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventBusKind {
    /// Handlers run inline on the publishing task.
    Sync,
    /// Bounded queue with a worker pool.
    Queued,
    /// Partitioned log with an in-process consumer.
    Partitioned,
}

impl EventBusKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "sync" => Some(Self::Sync),
            "queued" => Some(Self::Queued),
            "partitioned" => Some(Self::Partitioned),
            _ => None,
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string; absent means the
///   in-memory backend
/// - `EVENT_BUS` — `sync` | `queued` | `partitioned` (default: `sync`)
/// - `EVENT_QUEUE_CAPACITY` / `EVENT_QUEUE_WORKERS` — queued-bus tuning
/// - `EVENT_LOG_PARTITIONS` — partition count for the partitioned bus
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub event_bus: EventBusKind,
    pub queue_capacity: usize,
    pub queue_workers: usize,
    pub log_partitions: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            event_bus: std::env::var("EVENT_BUS")
                .ok()
                .and_then(|raw| EventBusKind::parse(&raw))
                .unwrap_or(EventBusKind::Sync),
            queue_capacity: std::env::var("EVENT_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            queue_workers: std::env::var("EVENT_QUEUE_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            log_partitions: std::env::var("EVENT_LOG_PARTITIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            event_bus: EventBusKind::Sync,
            queue_capacity: 1024,
            queue_workers: 4,
            log_partitions: 8,
        }
    }
}
