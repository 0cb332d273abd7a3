//! Event broadcasting
//!
//! Delivers bus events to the WebSocket connections joined to a room.

mod dispatcher;

pub use dispatcher::{BroadcastDispatcher, DeliveryReport, DEFAULT_FANOUT_CONCURRENCY};
