//! WebSocket close codes
//!
//! Application close codes sent when the relay refuses or drops a connection.

use axum::extract::ws::CloseFrame;

/// Relay WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Unknown error occurred
    UnknownError = 4000,
    /// The join request was not valid JSON of the expected shape
    DecodeError = 4002,
    /// No join request arrived in time, or the connection went idle
    SessionTimeout = 4009,
}

impl CloseCode {
    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnknownError => "Unknown error occurred",
            Self::DecodeError => "Invalid join request",
            Self::SessionTimeout => "Session timeout",
        }
    }

    /// Build the close frame carrying this code
    #[must_use]
    pub fn close_frame(self) -> CloseFrame<'static> {
        CloseFrame {
            code: self.as_u16(),
            reason: self.description().into(),
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u16())
    }
}
