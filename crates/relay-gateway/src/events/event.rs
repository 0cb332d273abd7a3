//! Relay event
//!
//! The single payload shape carried on both bus topics and written to clients.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Room that receives every feed mutation
pub const FEED_ROOM: &str = "feed";

/// Event kind, carried in the `type` field
///
/// Unknown kinds are preserved verbatim and routed by the event's own room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// A post was created
    NewPost,
    /// A post was deleted
    DeletePost,
    /// A post's like counter changed
    UpdatePostLikes,
    /// A comment was added to a post
    NewComment,
    /// Chat message
    Message,
    /// Typing indicator
    Typing,
    /// Any other kind
    Other(String),
}

impl EventKind {
    /// Get the wire name of the kind
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NewPost => "new_post",
            Self::DeletePost => "delete_post",
            Self::UpdatePostLikes => "update_post_likes",
            Self::NewComment => "new_comment",
            Self::Message => "message",
            Self::Typing => "typing",
            Self::Other(name) => name,
        }
    }

    /// Kinds that mutate the shared feed and always route to [`FEED_ROOM`]
    #[must_use]
    pub fn is_feed_mutation(&self) -> bool {
        matches!(
            self,
            Self::NewPost | Self::DeletePost | Self::UpdatePostLikes | Self::NewComment
        )
    }
}

impl Default for EventKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "new_post" => Self::NewPost,
            "delete_post" => Self::DeletePost,
            "update_post_likes" => Self::UpdatePostLikes,
            "new_comment" => Self::NewComment,
            "message" => Self::Message,
            "typing" => Self::Typing,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event received from the bus and fanned out to a room
///
/// Zero numbers, empty strings, and null payloads are omitted when written.
/// A `null` for any scalar field decodes as its zero value. The routing keys
/// also accept their capitalised spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(
        rename = "type",
        alias = "Type",
        default,
        deserialize_with = "nullable"
    )]
    pub kind: EventKind,

    #[serde(
        alias = "Room",
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "String::is_empty"
    )]
    pub room: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Value>,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "is_zero"
    )]
    pub post_id: i64,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "is_zero"
    )]
    pub likes: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Value>,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "String::is_empty"
    )]
    pub content: String,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "is_zero"
    )]
    pub sender_id: i64,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "is_zero"
    )]
    pub receiver_id: i64,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "String::is_empty"
    )]
    pub timestamp: String,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "is_zero"
    )]
    pub message_id: i64,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "String::is_empty"
    )]
    pub sender_nickname: String,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "String::is_empty"
    )]
    pub sender_profile_image: String,
}

impl Event {
    /// Create an event of the given kind with every other field empty
    #[must_use]
    pub fn new(kind: impl Into<EventKind>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Set the explicit room
    #[must_use]
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    /// Set the free-text content
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Room this event is broadcast to
    ///
    /// Feed mutations always go to [`FEED_ROOM`]; everything else goes to the
    /// event's own room, which may be the empty default room.
    #[must_use]
    pub fn target_room(&self) -> &str {
        if self.kind.is_feed_mutation() {
            FEED_ROOM
        } else {
            &self.room
        }
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
