//! Connection handling
//!
//! The per-client handle, its transport seam, and the lifecycle that joins,
//! keeps alive, and tears down one connection.

mod error;
mod handle;
mod lifecycle;
mod sink;

pub use error::ConnectionError;
pub use handle::{ConnectionHandle, ConnectionId, ConnectionState};
pub use lifecycle::{serve_connection, SessionContext};
pub use sink::FrameSink;
