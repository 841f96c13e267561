//! Cache Module
//!
//! Redis connection management and the Redis-backed viewer registry.

mod viewer_cache;

pub use viewer_cache::RedisViewerRegistry;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache key prefixes for the viewer coordination state.
pub mod keys {
    /// Prefix for per-event viewer sets (e.g., "viewers:event_id")
    pub const EVENT_VIEWERS: &str = "viewers:";

    /// Prefix for per-event playback position (e.g., "playback:event_id")
    pub const EVENT_PLAYBACK: &str = "playback:";

    /// Prefix for rate limiting counters (e.g., "ratelimit:user_id:action")
    pub const RATE_LIMIT: &str = "ratelimit:";

    /// Generates a viewer set key for an event
    #[inline]
    pub fn viewers(event_id: impl std::fmt::Display) -> String {
        format!("{}{}", EVENT_VIEWERS, event_id)
    }

    /// Generates a playback position key for an event
    #[inline]
    pub fn playback(event_id: impl std::fmt::Display) -> String {
        format!("{}{}", EVENT_PLAYBACK, event_id)
    }

    /// Generates a rate limit key
    #[inline]
    pub fn rate_limit(identifier: impl std::fmt::Display, action: &str) -> String {
        format!("{}{}:{}", RATE_LIMIT, identifier, action)
    }
}
