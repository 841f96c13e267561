//! Redis Viewer Registry
//!
//! Redis-backed implementation of the ViewerRegistry trait. Each event's
//! audience lives in a sorted set keyed by device id with the last heartbeat
//! timestamp as the score; stale members are pruned atomically before every
//! count so a crashed client drops out after one TTL without any explicit
//! leave.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use super::keys;
use crate::domain::value_objects::PlaybackPosition;
use crate::domain::ViewerRegistry;
use crate::shared::error::AppError;

/// Prune stale members, stamp the given device, and return the live count.
/// Runs as a single Lua script so concurrent joins never double-count.
const TOUCH_AND_COUNT: &str = r#"
local key = KEYS[1]
local now_ms = tonumber(ARGV[1])
local cutoff = tonumber(ARGV[2])
local device = ARGV[3]
local ttl_secs = tonumber(ARGV[4])

redis.call('ZREMRANGEBYSCORE', key, '-inf', cutoff)
redis.call('ZADD', key, now_ms, device)
redis.call('EXPIRE', key, ttl_secs * 2)
return redis.call('ZCARD', key)
"#;

/// Prune stale members and return the live count.
const PRUNE_AND_COUNT: &str = r#"
local key = KEYS[1]
local cutoff = tonumber(ARGV[1])

redis.call('ZREMRANGEBYSCORE', key, '-inf', cutoff)
return redis.call('ZCARD', key)
"#;

/// Prune stale members and return the surviving device ids.
const PRUNE_AND_LIST: &str = r#"
local key = KEYS[1]
local cutoff = tonumber(ARGV[1])

redis.call('ZREMRANGEBYSCORE', key, '-inf', cutoff)
return redis.call('ZRANGE', key, 0, -1)
"#;

/// Redis-backed viewer registry.
#[derive(Clone)]
pub struct RedisViewerRegistry {
    redis: ConnectionManager,
    viewer_ttl_secs: i64,
}

impl RedisViewerRegistry {
    /// Create a new registry with the given liveness TTL.
    pub fn new(redis: ConnectionManager, viewer_ttl_secs: i64) -> Self {
        Self {
            redis,
            viewer_ttl_secs,
        }
    }

    fn cutoff_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.viewer_ttl_secs * 1000
    }
}

#[async_trait]
impl ViewerRegistry for RedisViewerRegistry {
    async fn join(&self, event_id: i64, device_id: Uuid) -> Result<i64, AppError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut conn = self.redis.clone();

        let count: i64 = redis::Script::new(TOUCH_AND_COUNT)
            .key(keys::viewers(event_id))
            .arg(now_ms)
            .arg(self.cutoff_ms(now_ms))
            .arg(device_id.to_string())
            .arg(self.viewer_ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis error: {}", e)))?;

        Ok(count)
    }

    async fn leave(&self, event_id: i64, device_id: Uuid) -> Result<i64, AppError> {
        let mut conn = self.redis.clone();

        let _: i64 = conn
            .zrem(keys::viewers(event_id), device_id.to_string())
            .await
            .map_err(|e| AppError::Internal(format!("Redis error: {}", e)))?;

        self.viewer_count(event_id).await
    }

    async fn touch(&self, event_id: i64, device_id: Uuid) -> Result<(), AppError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut conn = self.redis.clone();

        let _: i64 = redis::Script::new(TOUCH_AND_COUNT)
            .key(keys::viewers(event_id))
            .arg(now_ms)
            .arg(self.cutoff_ms(now_ms))
            .arg(device_id.to_string())
            .arg(self.viewer_ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis error: {}", e)))?;

        Ok(())
    }

    async fn active_viewers(&self, event_id: i64) -> Result<Vec<Uuid>, AppError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut conn = self.redis.clone();

        let members: Vec<String> = redis::Script::new(PRUNE_AND_LIST)
            .key(keys::viewers(event_id))
            .arg(self.cutoff_ms(now_ms))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis error: {}", e)))?;

        // Members that fail to parse are dropped rather than failing the call
        Ok(members
            .iter()
            .filter_map(|m| Uuid::parse_str(m).ok())
            .collect())
    }

    async fn viewer_count(&self, event_id: i64) -> Result<i64, AppError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut conn = self.redis.clone();

        let count: i64 = redis::Script::new(PRUNE_AND_COUNT)
            .key(keys::viewers(event_id))
            .arg(self.cutoff_ms(now_ms))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis error: {}", e)))?;

        Ok(count)
    }

    async fn playback_position(
        &self,
        event_id: i64,
    ) -> Result<Option<PlaybackPosition>, AppError> {
        let mut conn = self.redis.clone();

        let value: Option<f64> = conn
            .get(keys::playback(event_id))
            .await
            .map_err(|e| AppError::Internal(format!("Redis error: {}", e)))?;

        Ok(value.map(PlaybackPosition::new))
    }

    async fn set_playback_position(
        &self,
        event_id: i64,
        position: PlaybackPosition,
    ) -> Result<(), AppError> {
        let mut conn = self.redis.clone();

        // Position only matters while the event is live; expire alongside
        // the viewer set
        conn.set_ex::<_, _, ()>(
            keys::playback(event_id),
            position.0,
            (self.viewer_ttl_secs * 2) as u64,
        )
        .await
        .map_err(|e| AppError::Internal(format!("Redis error: {}", e)))?;

        Ok(())
    }
}
