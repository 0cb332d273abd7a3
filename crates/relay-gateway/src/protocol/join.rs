//! Join request
//!
//! The first frame a client sends after the upgrade.

use serde::{Deserialize, Serialize};

/// Names the single room a connection joins for its whole lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Missing or `null` means the empty default room
    #[serde(default, deserialize_with = "nullable_room")]
    pub room: String,
}

impl JoinRequest {
    /// Create a join request for a room
    #[must_use]
    pub fn new(room: impl Into<String>) -> Self {
        Self { room: room.into() }
    }

    /// Parse from a text frame
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse from a binary frame
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn nullable_room<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
