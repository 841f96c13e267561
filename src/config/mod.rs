//! Configuration Management
//!
//! Layered settings loaded from defaults, config files, and environment.

pub mod settings;

pub use settings::{
    CorsSettings, DatabaseSettings, RateLimitSettings, RedisSettings, ServerSettings,
    SessionPolicySettings, Settings, WebSocketSettings,
};
