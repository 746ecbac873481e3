//! WebSocket connection handlers.
//!
//! Each accepted connection runs two pumps bridged by its bounded outbound queue:
//! - the receiver loop reads frames and hands them to the dispatch use case;
//! - the pusher loop drains the queue onto the socket in FIFO order.
//!
//! The queue's sender lives only in the hub, so the hub alone decides when the pusher
//! loop ends.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::{
    domain::{ConnectionProfile, ConnectionState},
    infrastructure::hub::{OutboundReceiver, outbound_queue},
    ui::state::AppState,
    usecase::ConnectError,
};

/// How long the pusher loop may keep flushing after the connection is unregistered.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_code): Path<String>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let token = query.token.or_else(|| bearer_token(&headers));

    match state
        .connect_participant_usecase
        .authorize(&room_code, token.as_deref())
        .await
    {
        Ok(profile) => {
            tracing::info!(
                "User '{}' accepted into room '{}'",
                profile.user.username,
                profile.room.code
            );
            let profile = Arc::new(profile);
            Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, profile)))
        }
        Err(e) => {
            tracing::warn!(
                "Rejected connection to room '{}' ({}): {}",
                room_code,
                e.code(),
                e
            );
            Err(status_for(&e))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn status_for(error: &ConnectError) -> StatusCode {
    match error {
        ConnectError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ConnectError::RoomNotFound(_) => StatusCode::NOT_FOUND,
        ConnectError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ConnectError::Repository(_) | ConnectError::Hub(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Move the lifecycle forward, logging transitions the state machine refuses.
fn advance(state: &mut ConnectionState, next: ConnectionState, profile: &ConnectionProfile) {
    match state.transition(next) {
        Ok(next) => *state = next,
        Err(e) => tracing::warn!("Connection {}: {}", profile.id, e),
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, profile: Arc<ConnectionProfile>) {
    let mut lifecycle = ConnectionState::Connecting;
    let (tx, rx) = outbound_queue(state.outbound_capacity);

    // Register before anything is sent: user:joined reaches the room, then room:init reaches us
    if let Err(e) = state
        .connect_participant_usecase
        .execute(Arc::clone(&profile), tx)
        .await
    {
        tracing::error!(
            "Failed to register '{}' with the hub: {}",
            profile.user.username,
            e
        );
        advance(&mut lifecycle, ConnectionState::Closed, &profile);
        return;
    }
    advance(&mut lifecycle, ConnectionState::Active, &profile);

    if let Err(e) = state.bootstrap_session_usecase.execute(&profile).await {
        tracing::warn!(
            "Failed to send room:init to '{}': {}",
            profile.user.username,
            e
        );
    }

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender, Arc::clone(&profile));
    let mut recv_task = receiver_loop(receiver, Arc::clone(&state), Arc::clone(&profile));

    let pusher_finished = tokio::select! {
        _ = &mut recv_task => false,
        _ = &mut send_task => {
            recv_task.abort();
            true
        }
    };

    advance(&mut lifecycle, ConnectionState::Closing, &profile);

    // No-op when the hub already evicted this connection
    if let Err(e) = state
        .disconnect_participant_usecase
        .execute(&profile)
        .await
    {
        tracing::debug!("Unregister of connection {} skipped: {}", profile.id, e);
    }

    // The hub closes the queue on unregister; let the pusher flush what is left
    if !pusher_finished && tokio::time::timeout(DRAIN_TIMEOUT, &mut send_task).await.is_err() {
        tracing::warn!("Outbound pump of connection {} did not drain in time", profile.id);
        send_task.abort();
    }

    advance(&mut lifecycle, ConnectionState::Closed, &profile);
    if !lifecycle.is_terminal() {
        tracing::warn!("Connection {} ended in state {:?}", profile.id, lifecycle);
    }
    tracing::info!(
        "User '{}' disconnected from room '{}'",
        profile.user.username,
        profile.room.code
    );
}

/// Spawns the outbound pump: queue → socket, FIFO, until the hub closes the queue
/// or a write fails.
fn pusher_loop(
    mut rx: OutboundReceiver,
    mut sender: SplitSink<WebSocket, Message>,
    profile: Arc<ConnectionProfile>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let json = match serde_json::to_string(envelope.as_ref()) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode '{}': {}", envelope.event_type(), e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json.into())).await {
                tracing::debug!("Write to connection {} failed: {}", profile.id, e);
                break;
            }
        }
        // Closing twice is harmless; the peer may already be gone
        let _ = sender.close().await;
    })
}

/// Spawns the inbound pump: socket → dispatch, one frame at a time, until the peer
/// closes or the transport fails.
fn receiver_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    profile: Arc<ConnectionProfile>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on connection {}: {}", profile.id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if let Err(e) = state
                        .dispatch_event_usecase
                        .execute(&profile, text.as_str())
                        .await
                    {
                        tracing::error!("Dropping connection {}: {}", profile.id, e);
                        break;
                    }
                }
                Message::Binary(_) => {
                    tracing::debug!("Ignoring binary frame from connection {}", profile.id);
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("User '{}' requested close", profile.user.username);
                    break;
                }
            }
        }
    })
}
