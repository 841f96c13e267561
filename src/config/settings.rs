//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration
    pub redis: RedisSettings,

    /// Viewing-session admission and time-accounting policy
    pub session: SessionPolicySettings,

    /// Rate limiting configuration
    pub rate_limit: RateLimitSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// WebSocket configuration
    pub websocket: WebSocketSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,

    /// Connection pool size
    pub pool_size: u32,
}

/// Viewing-session policy: heartbeat cadence, time budgets, device ceilings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionPolicySettings {
    /// Interval at which admitted clients must report, in milliseconds
    pub heartbeat_interval_ms: u64,

    /// Viewer-set entries older than this are pruned as dead (seconds).
    /// Must exceed one heartbeat interval or healthy clients get evicted.
    pub viewer_ttl_secs: u64,

    /// Allowed watch seconds for the standard tier
    pub standard_allowed_seconds: i64,

    /// Concurrent device ceiling for the standard tier
    pub standard_max_devices: i64,

    /// Concurrent device ceiling for the premium tier
    pub premium_max_devices: i64,

    /// Drift beyond which clients snap to the authoritative position (seconds)
    pub drift_threshold_secs: f64,

    /// Device invite lifetime in seconds
    pub invite_ttl_secs: i64,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Maximum requests per second
    pub requests_per_second: f64,

    /// Burst size (bucket capacity)
    pub burst_size: u32,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// WebSocket configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketSettings {
    /// Maximum message size in bytes (default: 64KB)
    pub max_message_size: usize,

    /// Maximum frame size in bytes (default: 16KB)
    pub max_frame_size: usize,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("redis.pool_size", 10)?
            // Session policy defaults mirror the original product behavior:
            // 30s heartbeats, 1h standard budget, single standard device
            .set_default("session.heartbeat_interval_ms", 30000_i64)?
            .set_default("session.viewer_ttl_secs", 75_i64)?
            .set_default("session.standard_allowed_seconds", 3600_i64)?
            .set_default("session.standard_max_devices", 1_i64)?
            .set_default("session.premium_max_devices", 3_i64)?
            .set_default("session.drift_threshold_secs", 3.0)?
            .set_default("session.invite_ttl_secs", 86400_i64)?
            .set_default("rate_limit.requests_per_second", 10.0)?
            .set_default("rate_limit.burst_size", 30)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            // WebSocket settings - security limits to prevent DoS
            .set_default("websocket.max_message_size", 65536_i64)? // 64KB
            .set_default("websocket.max_frame_size", 16384_i64)? // 16KB
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                // A viewer TTL at or below one heartbeat interval would reap
                // healthy clients between reports
                if settings.session.viewer_ttl_secs * 1000 <= settings.session.heartbeat_interval_ms
                {
                    return Err(ConfigError::Message(format!(
                        "session.viewer_ttl_secs ({}) must exceed one heartbeat interval ({}ms)",
                        settings.session.viewer_ttl_secs, settings.session.heartbeat_interval_ms
                    )));
                }
                Ok(settings)
            })
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerSettings {
    /// Get the socket address for binding.
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid server address configuration")
    }
}

impl DatabaseSettings {
    /// Get the connection URL.
    pub fn connection_url(&self) -> &str {
        &self.url
    }
}

impl SessionPolicySettings {
    /// Allowed watch seconds for a tier (None = unlimited).
    pub fn allowed_seconds(&self, premium: bool) -> Option<i64> {
        if premium {
            None
        } else {
            Some(self.standard_allowed_seconds)
        }
    }

    /// Concurrent device ceiling for a tier.
    pub fn max_devices(&self, premium: bool) -> i64 {
        if premium {
            self.premium_max_devices
        } else {
            self.standard_max_devices
        }
    }
}
