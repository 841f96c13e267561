//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::config::Settings;
use crate::domain::{DeviceInviteRepository, EventRepository, EventStatus, ViewSessionRepository};
use crate::infrastructure::cache::{self, RedisViewerRegistry};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    PgDeviceInviteRepository, PgEventRepository, PgViewSessionRepository,
};
use crate::shared::error::AppError;
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::EventGateway;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: ConnectionManager,
    pub registry: Arc<RedisViewerRegistry>,
    pub gateway: Arc<EventGateway>,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        // Create database pool and apply migrations
        let db = database::create_pool(&settings.database).await?;
        database::run_migrations(&db).await?;
        tracing::info!("Database connection pool created");

        // Create Redis client
        let redis = cache::create_redis_client(&settings.redis).await?;

        // Viewer registry shares the Redis connection manager
        let registry = Arc::new(RedisViewerRegistry::new(
            redis.clone(),
            settings.session.viewer_ttl_secs as i64,
        ));

        // WebSocket sync gateway
        let gateway = Arc::new(EventGateway::new());

        // Create app state
        let state = AppState {
            db: db.clone(),
            redis,
            registry,
            gateway,
            settings: Arc::new(settings.clone()),
        };

        // Reap sessions whose clients died without an explicit end
        spawn_stale_session_reaper(db, settings.session.viewer_ttl_secs);

        // Build router with middleware
        let router = routes::create_router(state)
            .layer(logging::create_trace_layer())
            .layer(cors::create_cors_layer(&settings.cors));

        // Bind to address
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Periodically deactivate sessions whose last heartbeat is older than the
/// viewer TTL, drop expired device invites, and end upcoming events whose
/// scheduled start passed without the stream going live. Watch time already
/// accrued stays counted.
fn spawn_stale_session_reaper(db: PgPool, ttl_secs: u64) {
    tokio::spawn(async move {
        let sessions = PgViewSessionRepository::new(db.clone());
        let invites = PgDeviceInviteRepository::new(db.clone());
        let events = PgEventRepository::new(db);
        let mut ticker = tokio::time::interval(Duration::from_secs(ttl_secs));
        ticker.tick().await; // Skip first immediate tick

        loop {
            ticker.tick().await;
            match sessions.deactivate_stale(ttl_secs as i64).await {
                Ok(0) => {}
                Ok(reaped) => {
                    tracing::info!(reaped, "Deactivated stale viewing sessions");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stale session reaper failed");
                }
            }

            match invites.delete_expired().await {
                Ok(0) => {}
                Ok(deleted) => {
                    tracing::info!(deleted, "Deleted expired device invites");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Expired invite cleanup failed");
                }
            }

            match end_overdue_events(&events).await {
                Ok(0) => {}
                Ok(ended) => {
                    tracing::info!(ended, "Ended overdue upcoming events");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Overdue event sweep failed");
                }
            }
        }
    });
}

/// Mark upcoming events whose scheduled start has passed as ended, so
/// access checks stop reporting them as watchable. Returns the number of
/// events transitioned.
async fn end_overdue_events(events: &dyn EventRepository) -> Result<i64, AppError> {
    let overdue = events.find_overdue_upcoming(chrono::Utc::now()).await?;

    let mut ended = 0;
    for event in overdue {
        events.set_status(event.id, EventStatus::Ended).await?;
        ended += 1;
    }

    Ok(ended)
}
