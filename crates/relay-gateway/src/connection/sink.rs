//! Outbound frame sink
//!
//! The write half of a client transport. Any `Sink<Message>` qualifies, which
//! covers the split axum socket as well as in-memory channels.

use super::ConnectionError;
use async_trait::async_trait;
use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};
use std::fmt::Display;

/// Write half of one client transport
#[async_trait]
pub trait FrameSink: Send {
    /// Write one frame and flush it
    async fn send_frame(&mut self, frame: Message) -> Result<(), ConnectionError>;

    /// Close the transport
    async fn close(&mut self) -> Result<(), ConnectionError>;
}

#[async_trait]
impl<S> FrameSink for S
where
    S: Sink<Message> + Send + Unpin,
    S::Error: Display + Send,
{
    async fn send_frame(&mut self, frame: Message) -> Result<(), ConnectionError> {
        SinkExt::send(self, frame)
            .await
            .map_err(ConnectionError::transport)
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        SinkExt::close(self)
            .await
            .map_err(ConnectionError::transport)
    }
}
