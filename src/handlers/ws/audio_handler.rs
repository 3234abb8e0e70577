//! Audio and microphone handling for WebSocket connections
//!
//! Routes incoming microphone chunks to the recognizer, turns push-to-talk
//! release into an explicit utterance end, and maps client microphone
//! failures onto the session error taxonomy.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, warn};

use crate::core::error::VoiceError;
use crate::core::stt::RecognizerEvent;

use super::{
    messages::{MessageRoute, OutgoingMessage},
    state::ConnectionState,
};

/// Handle a binary frame of microphone audio.
///
/// # Returns
/// * `bool` - true to continue processing, false to terminate connection
#[inline(always)]
pub async fn handle_audio_message(
    audio_data: Bytes,
    state: &Arc<RwLock<ConnectionState>>,
    message_tx: &mpsc::Sender<MessageRoute>,
) -> bool {
    debug!("Processing audio data: {} bytes", audio_data.len());

    // Fast path: read lock to get the recognizer handle.
    let recognizer = {
        let state_guard = state.read().await;
        match &state_guard.recognizer {
            Some(recognizer) => recognizer.clone(),
            None => {
                let _ = message_tx
                    .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                        message: "Not configured. Send a config message first.".to_string(),
                        fatal: false,
                    }))
                    .await;
                return true;
            }
        }
    };

    if let Err(e) = recognizer.lock().await.send_audio(audio_data.to_vec()).await {
        // Losing the recognizer socket kills the conversation.
        error!("Failed to stream audio to recognizer: {}", e);
        let _ = message_tx
            .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                message: VoiceError::Transport(e.to_string()).to_string(),
                fatal: true,
            }))
            .await;
        return false;
    }

    true
}

/// Handle the `finalize` message: the user explicitly ended their utterance
/// (push-to-talk release), so skip the silence debounce.
pub async fn handle_finalize_message(
    state: &Arc<RwLock<ConnectionState>>,
    message_tx: &mpsc::Sender<MessageRoute>,
) -> bool {
    let events_tx = {
        let state_guard = state.read().await;
        match &state_guard.events_tx {
            Some(events_tx) => events_tx.clone(),
            None => {
                let _ = message_tx
                    .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                        message: "Not configured. Send a config message first.".to_string(),
                        fatal: false,
                    }))
                    .await;
                return true;
            }
        }
    };

    debug!("Client finalized the current utterance");
    if events_tx.send(RecognizerEvent::UtteranceEnd).await.is_err() {
        warn!("Endpointing stream closed, finalize ignored");
    }
    true
}

/// Handle a reported client microphone failure. Always fatal: without a
/// microphone there is no debate, so the session itself is ended, not just
/// the connection.
pub async fn handle_mic_error(
    code: String,
    detail: Option<String>,
    state: &Arc<RwLock<ConnectionState>>,
    message_tx: &mpsc::Sender<MessageRoute>,
) -> bool {
    let detail = detail.unwrap_or_else(|| code.clone());
    let error = match code.as_str() {
        "permission_denied" => VoiceError::PermissionDenied(detail),
        "device_unavailable" | "not_found" => VoiceError::DeviceUnavailable(detail),
        _ => VoiceError::DeviceUnavailable(format!("{code}: {detail}")),
    };
    error!("Client microphone failure: {}", error);

    if let Some(entry) = &state.read().await.entry {
        entry.session.expire();
    }

    let _ = message_tx
        .send(MessageRoute::Outgoing(OutgoingMessage::Error {
            message: error.to_string(),
            fatal: true,
        }))
        .await;
    false
}
