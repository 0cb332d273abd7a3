//! WebSocket handler
//!
//! Upgrades HTTP requests and hands each socket to its own connection task.

use crate::connection::serve_connection;
use crate::server::GatewayState;
use axum::{
    extract::{ws::WebSocket, ConnectInfo, State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::StreamExt;
use std::net::SocketAddr;
use tracing::Instrument;

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let limit = state.config().keepalive.max_message_size;

    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| handle_socket(state, socket, peer))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket, peer: SocketAddr) {
    tracing::debug!(peer = %peer, "WebSocket connection established");

    let (sink, stream) = socket.split();
    let span = tracing::info_span!("connection", peer = %peer);

    serve_connection(state.session_context(), sink, stream)
        .instrument(span)
        .await;
}
