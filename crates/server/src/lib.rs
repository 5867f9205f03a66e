//! Wasapp Relay Server Library
//!
//! WebSocket transport around the `wasapp-core` router.

pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{AppState, ServerConfig};
use error::Error;
use handlers::{get_group, health_check, index, list_users, stats, ws_handler};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already set, ignore
    }
}

/// Build the axum application for `state`.
pub fn app(state: AppState) -> error::Result<Router> {
    let origin = if state.config.allowed_origin == "*" {
        AllowOrigin::any()
    } else {
        let value = state.config.allowed_origin.parse::<HeaderValue>().map_err(|_| {
            Error::InvalidConfig(format!(
                "WASAPP_CORS_ORIGIN: {:?} is not a valid origin",
                state.config.allowed_origin
            ))
        })?;
        AllowOrigin::exact(value)
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST]);

    Ok(Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler))
        .route("/users", get(list_users))
        .route("/groups/{group_id}", get(get_group))
        .route("/stats", get(stats))
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http()))
}

/// Serve `config` on an already bound listener until the task is dropped.
pub async fn serve(listener: tokio::net::TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    let app = app(AppState::new(config))?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env()?;
    info!("=== Wasapp Relay ===");
    info!("CORS origin: {}", config.allowed_origin);
    info!("Outbox capacity: {} events", config.outbox_capacity);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    serve(listener, config).await
}
