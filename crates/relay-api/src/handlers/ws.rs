//! WebSocket upgrade handler and per-connection session pump.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time;
use tracing::{info, warn};

use relay_realtime::error::RealtimeError;
use relay_realtime::hub::BroadcastHub;

use crate::error::ApiError;
use crate::state::AppState;

/// How long a closing socket gets to accept its close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// GET /ws (WebSocket upgrade)
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    accept(state, ws)
}

/// Refuses the upgrade up front when the relay is full or stopping;
/// otherwise hands the socket to the session pump.
pub fn accept(state: AppState, ws: WebSocketUpgrade) -> Result<Response, ApiError> {
    let hub = &state.realtime.hub;
    if state.realtime.is_shutting_down() {
        state.realtime.metrics.connection_rejected();
        return Err(RealtimeError::shutting_down().into());
    }
    if !hub.has_capacity() {
        state.realtime.metrics.connection_rejected();
        return Err(RealtimeError::handshake_rejected(RealtimeError::CapacityExceeded {
            capacity: hub.registry().capacity(),
        })
        .into());
    }

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, socket)))
}

async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    run_session(Arc::clone(&state.realtime.hub), socket).await;
}

/// Drives one established connection until it closes.
///
/// A spawned writer drains the connection's outbound queue into the
/// socket while this task reads frames and feeds them to the hub. Either
/// side ending, or the hub closing the connection, tears both down. A
/// socket write that does not finish within the send timeout drops the
/// connection.
pub(crate) async fn run_session<S>(hub: Arc<BroadcastHub>, mut socket: S)
where
    S: Stream<Item = Result<Message, axum::Error>>
        + Sink<Message, Error = axum::Error>
        + Send
        + Unpin
        + 'static,
{
    // The upgrade check can be overtaken by other connections or by shutdown.
    let (handle, mut outbound_rx) = match hub.on_connect() {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "Closing WebSocket after rejected handshake");
            let frame = if e.is_capacity() {
                CloseFrame {
                    code: close_code::AGAIN,
                    reason: Utf8Bytes::from_static("server at capacity"),
                }
            } else {
                CloseFrame {
                    code: close_code::AWAY,
                    reason: Utf8Bytes::from_static("server shutting down"),
                }
            };
            let _ = time::timeout(CLOSE_TIMEOUT, socket.send(Message::Close(Some(frame)))).await;
            return;
        }
    };

    let conn_id = handle.id;
    let closed = handle.closed();
    let send_timeout = hub.config().send_timeout();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer_hub = Arc::clone(&hub);
    let writer_closed = closed.clone();
    let writer = tokio::spawn(async move {
        let failure = tokio::select! {
            _ = writer_closed.cancelled() => None,
            failure = async {
                while let Some(msg) = outbound_rx.recv().await {
                    let frame = Message::Text(msg.text().to_owned().into());
                    match time::timeout(send_timeout, ws_tx.send(frame)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => return Some(e.to_string()),
                        Err(_) => {
                            return Some(format!(
                                "socket write did not complete within {}ms",
                                send_timeout.as_millis()
                            ));
                        }
                    }
                }
                None
            } => failure,
        };

        match failure {
            Some(reason) => {
                let cause = RealtimeError::SendFailure { conn_id, reason };
                writer_hub.on_error(conn_id, &cause);
            }
            None => {
                let _ = time::timeout(CLOSE_TIMEOUT, ws_tx.send(Message::Close(None))).await;
            }
        }
    });

    let ended = loop {
        tokio::select! {
            _ = closed.cancelled() => break None,
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    hub.on_message(conn_id, text.as_str()).await;
                }
                Some(Ok(Message::Binary(data))) => {
                    hub.on_message(conn_id, String::from_utf8_lossy(&data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    break Some(RealtimeError::PeerClosed { conn_id });
                }
                // Ping/pong is answered by axum.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    break Some(RealtimeError::ReadFailure {
                        conn_id,
                        reason: e.to_string(),
                    });
                }
            },
        }
    };

    match ended {
        Some(RealtimeError::PeerClosed { .. }) => {
            hub.on_disconnect(conn_id);
        }
        Some(e) => {
            hub.on_error(conn_id, &e);
        }
        // Already deregistered by the hub (send timeout or shutdown).
        None => {}
    }

    let _ = writer.await;
    info!(conn_id = %conn_id, "WebSocket connection closed");
}
