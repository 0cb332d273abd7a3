//! Bus bridge
//!
//! Connects the Redis subscription to room delivery, and client frames back
//! to the bus.

mod bus_bridge;
mod publisher;

pub use bus_bridge::{BridgeStats, BusBridge};
pub use publisher::{BusPublisher, EventPublisher};
