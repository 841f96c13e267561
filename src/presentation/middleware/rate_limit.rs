//! Rate Limiting Middleware
//!
//! Redis-backed sliding window rate limiter. Each caller gets a sorted set
//! of request timestamps; the window is pruned and counted atomically in a
//! Lua script so concurrent requests cannot slip past the limit.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use redis::aio::ConnectionManager;
use std::net::SocketAddr;

use crate::infrastructure::cache::keys;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Sliding window rate limiter over a Redis sorted set.
#[derive(Clone)]
pub struct RateLimiter {
    redis: ConnectionManager,
    window_seconds: u64,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(redis: ConnectionManager, window_seconds: u64, max_requests: u32) -> Self {
        Self {
            redis,
            window_seconds,
            max_requests,
        }
    }

    /// Check if a request should be allowed.
    pub async fn check(&self, identifier: &str, action: &str) -> Result<bool, AppError> {
        let key = keys::rate_limit(identifier, action);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_start = now_ms - (self.window_seconds * 1000) as i64;

        let mut conn = self.redis.clone();

        // Prune, count, and record in one atomic step
        let script = redis::Script::new(
            r#"
            local key = KEYS[1]
            local now_ms = tonumber(ARGV[1])
            local window_start = tonumber(ARGV[2])
            local max_requests = tonumber(ARGV[3])
            local window_seconds = tonumber(ARGV[4])

            redis.call('ZREMRANGEBYSCORE', key, '-inf', window_start)

            local current_count = redis.call('ZCARD', key)

            if current_count < max_requests then
                local member = now_ms .. ':' .. math.random(1000000)
                redis.call('ZADD', key, now_ms, member)
                redis.call('EXPIRE', key, window_seconds + 1)
                return 1
            else
                return 0
            end
            "#,
        );

        let allowed: i64 = script
            .key(&key)
            .arg(now_ms)
            .arg(window_start)
            .arg(self.max_requests as i64)
            .arg(self.window_seconds as i64)
            .invoke_async(&mut conn)
            .await
            .unwrap_or_else(|e| {
                // A Redis outage must not turn into a full service denial
                tracing::error!("Rate limiter Redis error: {}", e);
                1
            });

        Ok(allowed == 1)
    }
}

/// API rate limiting middleware, keyed by the verified user id when present
/// and by client IP otherwise.
pub async fn rate_limit_api(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identifier = request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(|id| format!("user:{}", id))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| format!("ip:{}", addr.ip()))
        })
        .unwrap_or_else(|| "anonymous".to_string());

    // One-second window sized from the configured sustained rate plus burst
    let limiter = RateLimiter::new(
        state.redis.clone(),
        1,
        state.settings.rate_limit.requests_per_second as u32
            + state.settings.rate_limit.burst_size,
    );

    if !limiter.check(&identifier, "api").await? {
        tracing::debug!(identifier = %identifier, "Request rate limited");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}
