//! Gateway server setup
//!
//! Provides the WebSocket server configuration, routes, and process wiring.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::bridge::{BridgeStats, BusPublisher, EventPublisher};
use crate::registry::RegistryStats;
use axum::{extract::State, routing::get, Json, Router};
use relay_bus::{Publisher, RedisPool, SubscriberBuilder, Subscription, Topic};
use relay_common::{RelayConfig, RelayError, RelayResult};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router(path: &str) -> Router<GatewayState> {
    Router::new()
        .route(path, get(gateway_handler))
        .route("/health", get(health_check))
        .route("/stats", get(stats))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Body of the stats endpoint
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub registry: RegistryStats,
    pub bridge: BridgeStats,
}

/// Room and connection counts
async fn stats(State(state): State<GatewayState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        registry: state.registry().stats(),
        bridge: state.bridge().stats(),
    })
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router(&state.config().gateway.path)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Subscribe to the bus and create `GatewayState`
///
/// The subscription is opened first; failing to open it is fatal.
pub async fn create_gateway_state(
    config: RelayConfig,
) -> RelayResult<(GatewayState, Subscription)> {
    tracing::info!("Subscribing to Redis...");
    let subscription = SubscriberBuilder::new()
        .redis_url(&config.redis.url)
        .subscribe_all(Topic::consumed())
        .build()
        .await
        .map_err(|e| RelayError::bus(format!("Failed to subscribe: {e}")))?;
    tracing::info!(topics = ?subscription.topics(), "Redis subscription established");

    let publisher: Option<Arc<dyn EventPublisher>> = if config.bridge.client_publish {
        let pool = RedisPool::from_config(&config.redis).map_err(RelayError::bus)?;
        tracing::info!("Client publishing enabled");
        Some(Arc::new(BusPublisher::new(Publisher::new(pool))))
    } else {
        None
    };

    Ok((GatewayState::new(config, publisher), subscription))
}

/// Run the HTTP server on a bound listener
pub async fn run_server(app: Router, listener: TcpListener) -> RelayResult<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| RelayError::server(format!("Server error: {e}")))
}

/// Serve connections and run the bus bridge until either stops
///
/// The bridge runs on its own task. If the subscription ends the relay can no
/// longer broadcast, so this returns `SubscriptionClosed`.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    subscription: Subscription,
) -> RelayResult<()> {
    let bridge = state.bridge().clone();
    let bridge_task = tokio::spawn(async move { bridge.run(subscription).await });

    let path = state.config().gateway.path.clone();
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Gateway listening on ws://{}{}", addr, path);
    }

    let app = create_app(state);

    tokio::select! {
        result = run_server(app, listener) => result,
        _ = bridge_task => Err(RelayError::SubscriptionClosed),
    }
}

/// Run the complete gateway server with configuration
pub async fn run(config: RelayConfig) -> RelayResult<()> {
    let addr = config.gateway.address();

    let (state, subscription) = create_gateway_state(config).await?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::server(format!("Failed to bind to {addr}: {e}")))?;

    serve(listener, state, subscription).await
}
