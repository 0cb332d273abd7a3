//! Connection handle
//!
//! The relay's live reference to one client session. Writes from the
//! broadcast dispatcher and the keepalive loop are serialized through the
//! handle and each is bounded by the write deadline.

use super::{ConnectionError, FrameSink};
use crate::events::Event;
use crate::protocol::CloseCode;
use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Transport upgraded, handle not yet registered
    Connecting,
    /// Registered in its room
    Joined,
    /// Transport is being closed
    Closing,
    /// Transport is closed; terminal
    Closed,
}

/// A single joined client connection
pub struct ConnectionHandle {
    /// Unique connection ID
    id: ConnectionId,

    /// Room joined at handshake, fixed for the connection's lifetime
    room: String,

    /// Write half of the transport
    sink: Mutex<Box<dyn FrameSink>>,

    /// Current lifecycle state
    state: RwLock<ConnectionState>,

    /// Last time the client proved it was alive
    last_seen: RwLock<DateTime<Utc>>,

    /// Deadline for each write
    write_wait: Duration,

    /// Handle creation time
    created_at: DateTime<Utc>,
}

impl ConnectionHandle {
    /// Create a handle for a connection that asked to join `room`
    pub fn new(
        room: impl Into<String>,
        write_wait: Duration,
        sink: impl FrameSink + 'static,
    ) -> Arc<Self> {
        let now = Utc::now();
        Arc::new(Self {
            id: Uuid::new_v4(),
            room: room.into(),
            sink: Mutex::new(Box::new(sink)),
            state: RwLock::new(ConnectionState::Connecting),
            last_seen: RwLock::new(now),
            write_wait,
            created_at: now,
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the joined room
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Move from `Connecting` to `Joined`
    pub fn mark_joined(&self) {
        let mut state = self.state.write();
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Joined;
        }
    }

    /// Check if the handle has started or finished closing
    pub fn is_closed(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::Closing | ConnectionState::Closed
        )
    }

    /// Record a liveness signal from the client
    pub fn mark_alive(&self) {
        *self.last_seen.write() = Utc::now();
    }

    /// Last time the client proved it was alive
    pub fn last_seen(&self) -> DateTime<Utc> {
        *self.last_seen.read()
    }

    /// Get the handle creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Serialize and write an event
    pub async fn send(&self, event: &Event) -> Result<(), ConnectionError> {
        let json = event.to_json()?;
        self.send_text(json).await
    }

    /// Write an already-serialized event
    pub async fn send_text(&self, json: String) -> Result<(), ConnectionError> {
        self.write(Message::Text(json)).await
    }

    /// Write a liveness probe
    pub async fn ping(&self) -> Result<(), ConnectionError> {
        self.write(Message::Ping(Vec::new())).await
    }

    /// Write a close frame carrying an application close code
    pub async fn send_close(&self, code: CloseCode) -> Result<(), ConnectionError> {
        self.write(Message::Close(Some(code.close_frame()))).await
    }

    /// Write one frame, waiting at most `write_wait` including any queueing
    /// behind another writer. Errors are not retried.
    async fn write(&self, frame: Message) -> Result<(), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }

        let write = async {
            let mut sink = self.sink.lock().await;
            sink.send_frame(frame).await
        };

        match tokio::time::timeout(self.write_wait, write).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::WriteTimeout(self.write_wait)),
        }
    }

    /// Close the transport. Only the first call does anything.
    pub async fn close(&self) {
        {
            let mut state = self.state.write();
            if matches!(*state, ConnectionState::Closing | ConnectionState::Closed) {
                return;
            }
            *state = ConnectionState::Closing;
        }

        let close = async {
            let mut sink = self.sink.lock().await;
            sink.close().await
        };

        match tokio::time::timeout(self.write_wait, close).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(connection_id = %self.id, error = %e, "Transport close failed");
            }
            Err(_) => {
                tracing::debug!(connection_id = %self.id, "Transport close timed out");
            }
        }

        *self.state.write() = ConnectionState::Closed;
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("room", &self.room)
            .field("state", &self.state())
            .field("created_at", &self.created_at)
            .finish()
    }
}
