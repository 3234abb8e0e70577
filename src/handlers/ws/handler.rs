//! Axum WebSocket handler
//!
//! This module contains the WebSocket upgrade handler and the connection
//! loop for voice debate sessions.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::select;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

use super::{
    audio_handler::handle_audio_message,
    messages::{IncomingMessage, MessageRoute, OutgoingMessage},
    processor::handle_incoming_message,
    state::ConnectionState,
};

/// Generous buffer: the sender task drains fast, but paced audio frames can
/// burst ahead of a slow client.
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// WebSocket voice debate handler.
/// Upgrades the HTTP connection for real-time voice exchange.
pub async fn ws_debate_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("WebSocket debate connection upgrade requested");
    ws.on_upgrade(move |socket| handle_debate_socket(socket, state))
}

/// Manage one WebSocket session end to end.
async fn handle_debate_socket(socket: WebSocket, app_state: AppState) {
    info!("WebSocket debate connection established");

    let (mut sender, mut receiver) = socket.split();
    let state = Arc::new(RwLock::new(ConnectionState::new()));
    let (message_tx, mut message_rx) = mpsc::channel::<MessageRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task: single writer to the socket; everything else goes through
    // the channel.
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let result = match route {
                MessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                MessageRoute::Binary(data) => sender.send(Message::Binary(data)).await,
            };

            if let Err(e) = result {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    loop {
        select! {
            msg_result = receiver.next() => {
                match msg_result {
                    Some(Ok(msg)) => {
                        let continue_processing =
                            process_message(msg, &state, &message_tx, &app_state).await;
                        if !continue_processing {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!("WebSocket connection closed by client");
                        break;
                    }
                }
            }
        }
    }

    cleanup(&state).await;
    sender_task.abort();
    info!("WebSocket debate connection terminated");
}

/// Process one incoming WebSocket message.
#[inline(always)]
async fn process_message(
    msg: Message,
    state: &Arc<RwLock<ConnectionState>>,
    message_tx: &mpsc::Sender<MessageRoute>,
    app_state: &AppState,
) -> bool {
    match msg {
        Message::Text(text) => {
            debug!("Received text message: {} bytes", text.len());
            let incoming_msg: IncomingMessage = match serde_json::from_str(&text) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("Failed to parse incoming message: {}", e);
                    let _ = message_tx
                        .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                            message: format!("Invalid message format: {e}"),
                            fatal: false,
                        }))
                        .await;
                    return true;
                }
            };
            handle_incoming_message(incoming_msg, state, message_tx, app_state).await
        }
        Message::Binary(data) => handle_audio_message(data, state, message_tx).await,
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            info!("WebSocket connection closed by client");
            false
        }
    }
}

/// Tear down everything the connection spawned. The session record itself
/// stays in the registry so its scores remain queryable over HTTP.
async fn cleanup(state: &Arc<RwLock<ConnectionState>>) {
    let mut state_guard = state.write().await;

    if let Some(playback) = state_guard.playback.take() {
        playback.interrupt();
    }

    for task in state_guard.tasks.drain(..) {
        task.abort();
    }

    if let Some(recognizer) = state_guard.recognizer.take() {
        if let Err(e) = recognizer.lock().await.disconnect().await {
            error!("Failed to disconnect recognizer: {}", e);
        }
    }

    state_guard.events_tx = None;
    if let Some(id) = state_guard.session_id() {
        debug!("Connection for session {} cleaned up", id);
    }
    state_guard.entry = None;
}
