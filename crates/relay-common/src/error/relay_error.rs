//! Relay error types
//!
//! Process-level errors. Failures scoped to one connection or one bus message
//! never surface here; they are logged where they happen.

use crate::config::ConfigError;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    // Bus errors (subscription, publisher pool)
    #[error("Bus error: {0}")]
    Bus(String),

    // Listener errors
    #[error("Server error: {0}")]
    Server(String),

    // The bus subscription ended while the process was running
    #[error("Bus subscription closed")]
    SubscriptionClosed,
}

impl RelayError {
    /// Get a stable error code for logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Bus(_) => "BUS_ERROR",
            Self::Server(_) => "SERVER_ERROR",
            Self::SubscriptionClosed => "SUBSCRIPTION_CLOSED",
        }
    }

    /// Create a bus error
    #[must_use]
    pub fn bus(msg: impl fmt::Display) -> Self {
        Self::Bus(msg.to_string())
    }

    /// Create a server error
    #[must_use]
    pub fn server(msg: impl fmt::Display) -> Self {
        Self::Server(msg.to_string())
    }
}

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
