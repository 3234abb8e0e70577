//! Incoming message dispatch for WebSocket connections

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::state::AppState;

use super::{
    audio_handler::{handle_finalize_message, handle_mic_error},
    config_handler::handle_config_message,
    messages::{IncomingMessage, MessageRoute},
    state::ConnectionState,
};

/// Dispatch one parsed control message.
///
/// # Returns
/// * `bool` - true to continue processing, false to terminate connection
pub async fn handle_incoming_message(
    message: IncomingMessage,
    state: &Arc<RwLock<ConnectionState>>,
    message_tx: &mpsc::Sender<MessageRoute>,
    app_state: &AppState,
) -> bool {
    match message {
        IncomingMessage::Config { session_id } => {
            handle_config_message(session_id, state, message_tx, app_state).await
        }
        IncomingMessage::Finalize => handle_finalize_message(state, message_tx).await,
        IncomingMessage::MicError { code, message } => {
            handle_mic_error(code, message, state, message_tx).await
        }
    }
}
