//! Connection errors
//!
//! Every variant is fatal to exactly one connection.

use crate::protocol::CloseCode;
use std::time::Duration;

/// Why a connection could not be joined, or why it ended
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("No join request within {0:?}")]
    JoinTimeout(Duration),

    #[error("Invalid join request: {0}")]
    JoinDecode(#[source] serde_json::Error),

    #[error("Connection closed by peer")]
    ClosedByPeer,

    #[error("No pong within {0:?}")]
    IdleTimeout(Duration),

    #[error("Write timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection already closed")]
    Closed,

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ConnectionError {
    /// Close code sent to the client, if the relay initiates the close
    #[must_use]
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::JoinDecode(_) => Some(CloseCode::DecodeError),
            Self::JoinTimeout(_) | Self::IdleTimeout(_) => Some(CloseCode::SessionTimeout),
            Self::ClosedByPeer | Self::Closed => None,
            Self::WriteTimeout(_) | Self::Transport(_) | Self::Encode(_) => {
                Some(CloseCode::UnknownError)
            }
        }
    }

    /// Create a transport error from any displayable error
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}
