//! Room membership
//!
//! Tracks which connections are joined to which room.

mod room_registry;

pub use room_registry::{RegistryStats, RoomRegistry};
