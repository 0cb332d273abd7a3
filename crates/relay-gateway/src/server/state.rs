//! Gateway state
//!
//! Application state for the gateway server.

use crate::bridge::{BusBridge, EventPublisher};
use crate::broadcast::BroadcastDispatcher;
use crate::connection::SessionContext;
use crate::registry::RoomRegistry;
use relay_common::RelayConfig;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Room membership shared by every connection and the bridge
    registry: Arc<RoomRegistry>,
    /// Bus consumer feeding the registry's rooms
    bridge: Arc<BusBridge>,
    /// Client publish path, when enabled
    publisher: Option<Arc<dyn EventPublisher>>,
    /// Application configuration
    config: Arc<RelayConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    ///
    /// `publisher` is only wired into connections when client publishing is
    /// enabled in `config`.
    pub fn new(config: RelayConfig, publisher: Option<Arc<dyn EventPublisher>>) -> Self {
        let registry = RoomRegistry::new_shared();
        let dispatcher = BroadcastDispatcher::new(config.bridge.fanout_concurrency);
        let bridge = Arc::new(BusBridge::new(registry.clone(), dispatcher));
        let publisher = publisher.filter(|_| config.bridge.client_publish);

        Self {
            registry,
            bridge,
            publisher,
            config: Arc::new(config),
        }
    }

    /// Get the room registry
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Get the bus bridge
    pub fn bridge(&self) -> &Arc<BusBridge> {
        &self.bridge
    }

    /// Get the application configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Context handed to each new connection task
    pub fn session_context(&self) -> SessionContext {
        let ctx = SessionContext::new(self.registry.clone(), self.config.keepalive.clone());
        match &self.publisher {
            Some(publisher) => ctx.with_publisher(publisher.clone()),
            None => ctx,
        }
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("bridge", &self.bridge)
            .field("client_publish", &self.publisher.is_some())
            .field("config", &"RelayConfig")
            .finish()
    }
}
