//! Pub/Sub topic definitions.
//!
//! The relay consumes exactly two topics. Chat-style events arrive on
//! `chat_channel`, feed/content events on `post_channel`; both carry the same
//! event shape.

/// Topic carrying chat-style events
pub const CHAT_TOPIC: &str = "chat_channel";
/// Topic carrying feed/content events
pub const POST_TOPIC: &str = "post_channel";

/// Pub/Sub topic
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Chat events
    Chat,
    /// Feed/content events
    Post,
    /// Any other topic name
    Custom(String),
}

impl Topic {
    /// The topics the relay subscribes to at startup
    #[must_use]
    pub fn consumed() -> [Self; 2] {
        [Self::Chat, Self::Post]
    }

    /// Create a custom topic
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Chat => CHAT_TOPIC,
            Self::Post => POST_TOPIC,
            Self::Custom(name) => name,
        }
    }

    /// Parse a Redis channel name back to a `Topic`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            CHAT_TOPIC => Self::Chat,
            POST_TOPIC => Self::Post,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
