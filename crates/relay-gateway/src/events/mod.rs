//! Relay events
//!
//! The typed event decoded from the bus and its room routing.

mod event;

pub use event::{Event, EventKind, FEED_ROOM};
