//! Connection lifecycle
//!
//! Drives one client from the join handshake to teardown. After the join the
//! read loop and the keepalive loop run side by side; whichever ends first
//! ends the session, and both paths converge on `RoomRegistry::leave`.

use super::{ConnectionError, ConnectionHandle, FrameSink};
use crate::bridge::EventPublisher;
use crate::events::Event;
use crate::protocol::JoinRequest;
use crate::registry::RoomRegistry;
use axum::extract::ws::Message;
use futures_util::{Stream, StreamExt};
use relay_common::KeepaliveConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, timeout, timeout_at, Instant, MissedTickBehavior};

/// Everything a connection task needs from the running relay
#[derive(Clone)]
pub struct SessionContext {
    /// Shared room membership
    pub registry: Arc<RoomRegistry>,
    /// Timing and framing limits
    pub keepalive: KeepaliveConfig,
    /// Set when client frames are re-published to the bus
    pub publisher: Option<Arc<dyn EventPublisher>>,
}

impl SessionContext {
    /// Create a context without client publishing
    pub fn new(registry: Arc<RoomRegistry>, keepalive: KeepaliveConfig) -> Self {
        Self {
            registry,
            keepalive,
            publisher: None,
        }
    }

    /// Re-publish inbound client events through `publisher`
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("registry", &self.registry)
            .field("keepalive", &self.keepalive)
            .field("client_publish", &self.publisher.is_some())
            .finish()
    }
}

/// Serve one upgraded connection until it ends
///
/// The first frame must be a join request. A connection that fails to join is
/// closed without ever being registered.
pub async fn serve_connection<K, S>(ctx: SessionContext, mut sink: K, mut stream: S)
where
    K: FrameSink + 'static,
    S: Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
{
    let keepalive = &ctx.keepalive;

    let join = match timeout(keepalive.join_timeout, read_join(&mut stream)).await {
        Ok(Ok(join)) => join,
        Ok(Err(e)) => {
            reject(&mut sink, &e, keepalive.write_wait).await;
            return;
        }
        Err(_) => {
            let e = ConnectionError::JoinTimeout(keepalive.join_timeout);
            reject(&mut sink, &e, keepalive.write_wait).await;
            return;
        }
    };

    let handle = ConnectionHandle::new(join.room, keepalive.write_wait, sink);
    let members = ctx.registry.join(handle.room(), handle.clone());
    handle.mark_joined();

    tracing::info!(
        connection_id = %handle.id(),
        room = %handle.room(),
        members = members,
        "Connection joined"
    );

    let reason = tokio::select! {
        reason = read_loop(&ctx, &handle, &mut stream) => reason,
        reason = keepalive_loop(&handle, keepalive.ping_period()) => reason,
    };

    match &reason {
        ConnectionError::ClosedByPeer => {
            tracing::info!(connection_id = %handle.id(), room = %handle.room(), "Connection closed by client");
        }
        ConnectionError::IdleTimeout(_) => {
            tracing::info!(connection_id = %handle.id(), room = %handle.room(), error = %reason, "Connection idle");
            if let Some(code) = reason.close_code() {
                let _ = handle.send_close(code).await;
            }
        }
        _ => {
            tracing::warn!(connection_id = %handle.id(), room = %handle.room(), error = %reason, "Connection failed");
        }
    }

    ctx.registry.leave(handle.room(), &handle).await;
}

/// Wait for the join request, skipping control frames
async fn read_join<S>(stream: &mut S) -> Result<JoinRequest, ConnectionError>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                return JoinRequest::from_json(&text).map_err(ConnectionError::JoinDecode);
            }
            Some(Ok(Message::Binary(bytes))) => {
                return JoinRequest::from_slice(&bytes).map_err(ConnectionError::JoinDecode);
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(Message::Close(_))) | None => return Err(ConnectionError::ClosedByPeer),
            Some(Err(e)) => return Err(ConnectionError::transport(e)),
        }
    }
}

/// Refuse a connection that never joined
async fn reject<K: FrameSink>(sink: &mut K, reason: &ConnectionError, write_wait: Duration) {
    tracing::info!(error = %reason, "Join rejected");

    if let Some(code) = reason.close_code() {
        let frame = Message::Close(Some(code.close_frame()));
        if let Ok(Err(e)) = timeout(write_wait, sink.send_frame(frame)).await {
            tracing::debug!(error = %e, "Failed to send close frame");
        }
    }
    let _ = timeout(write_wait, sink.close()).await;
}

/// Read inbound frames until the peer goes away or stays silent too long
async fn read_loop<S>(
    ctx: &SessionContext,
    handle: &ConnectionHandle,
    stream: &mut S,
) -> ConnectionError
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let pong_wait = ctx.keepalive.pong_wait;
    let mut deadline = Instant::now() + pong_wait;

    loop {
        let frame = match timeout_at(deadline, stream.next()).await {
            Err(_) => return ConnectionError::IdleTimeout(pong_wait),
            Ok(None) => return ConnectionError::ClosedByPeer,
            Ok(Some(Err(e))) => return ConnectionError::transport(e),
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Pong(_) => {
                deadline = Instant::now() + pong_wait;
                handle.mark_alive();
            }
            Message::Close(_) => return ConnectionError::ClosedByPeer,
            Message::Text(text) => {
                if let Some(publisher) = &ctx.publisher {
                    republish(publisher.as_ref(), handle, &text, ctx.keepalive.write_wait).await;
                }
            }
            Message::Binary(_) | Message::Ping(_) => {
                tracing::trace!(connection_id = %handle.id(), "Ignoring inbound frame");
            }
        }
    }
}

/// Ping the client every `period` until a ping cannot be written
async fn keepalive_loop(handle: &ConnectionHandle, period: Duration) -> ConnectionError {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = handle.ping().await {
            return e;
        }
        tracing::trace!(connection_id = %handle.id(), "Ping sent");
    }
}

/// Publish a client event into the connection's own room
///
/// The publish is bounded by `write_wait` so a stalled bus cannot hold the
/// read loop past its idle deadline.
async fn republish(
    publisher: &dyn EventPublisher,
    handle: &ConnectionHandle,
    text: &str,
    write_wait: Duration,
) {
    let mut event = match Event::from_json(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(connection_id = %handle.id(), error = %e, "Dropping undecodable client event");
            return;
        }
    };

    if event.kind.is_feed_mutation() {
        tracing::debug!(
            connection_id = %handle.id(),
            kind = %event.kind,
            "Dropping feed event from client"
        );
        return;
    }

    event.room = handle.room().to_string();

    match timeout(write_wait, publisher.publish(&event)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(
                connection_id = %handle.id(),
                room = %handle.room(),
                error = %e,
                "Failed to publish client event"
            );
        }
        Err(_) => {
            tracing::warn!(
                connection_id = %handle.id(),
                room = %handle.room(),
                timeout_ms = write_wait.as_millis() as u64,
                "Timed out publishing client event"
            );
        }
    }
}
