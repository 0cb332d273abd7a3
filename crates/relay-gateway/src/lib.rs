//! # relay-gateway
//!
//! WebSocket room relay. Clients join one room each; events arriving on the
//! Redis bus are fanned out to the members of the room they target.

pub mod bridge;
pub mod broadcast;
pub mod connection;
pub mod events;
pub mod protocol;
pub mod registry;
pub mod server;

pub use server::run;
