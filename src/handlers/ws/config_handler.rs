//! Session attachment for WebSocket connections
//!
//! Wires one socket to a started debate: recognizer in, endpointing and
//! coordination in the middle, playback and turn updates out. Everything
//! spawned here is tracked in the connection state and aborted when the
//! socket closes.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{error, info, warn};

use crate::core::coordinator::{TurnCoordinator, TurnUpdate};
use crate::core::endpoint::TurnController;
use crate::core::playback::{PlaybackConfig, PlaybackEvent, PlaybackManager};
use crate::core::stt::{
    create_recognizer, RecognizerConfig, RecognizerErrorCallback, RecognizerEvent,
    RecognizerEventCallback,
};
use crate::state::AppState;

use super::{
    messages::{MessageRoute, OutgoingMessage},
    state::ConnectionState,
};

/// Buffer for the recognizer event stream; audio chunks arrive every ~100ms
/// so this is minutes of headroom.
const EVENT_BUFFER_SIZE: usize = 256;
const UPDATE_BUFFER_SIZE: usize = 64;
/// Playback frames are paced, but the sender task can fall behind a slow
/// client briefly.
const PLAYBACK_BUFFER_SIZE: usize = 256;

/// Handle the `config` message: attach this connection to a debate session.
///
/// # Returns
/// * `bool` - true to continue processing, false to terminate connection
pub async fn handle_config_message(
    session_id: String,
    state: &Arc<RwLock<ConnectionState>>,
    message_tx: &mpsc::Sender<MessageRoute>,
    app_state: &AppState,
) -> bool {
    if state.read().await.is_configured() {
        warn!("Duplicate config message ignored");
        let _ = message_tx
            .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                message: "Connection already configured".to_string(),
                fatal: false,
            }))
            .await;
        return true;
    }

    let Some(entry) = app_state.get_session(&session_id).await else {
        let _ = message_tx
            .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                message: format!("Unknown session: {session_id}"),
                fatal: false,
            }))
            .await;
        return true;
    };
    if entry.session.is_ended() {
        let _ = message_tx
            .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                message: format!("Session {session_id} has already ended"),
                fatal: false,
            }))
            .await;
        return true;
    }

    let session = entry.session.clone();
    info!(
        "Attaching connection to session {} (mode={}, difficulty={})",
        session.id, session.mode, session.difficulty
    );

    // Outbound audio path.
    let (playback_tx, playback_rx) = mpsc::channel::<PlaybackEvent>(PLAYBACK_BUFFER_SIZE);
    let playback = Arc::new(PlaybackManager::new(playback_tx, PlaybackConfig::default()));

    // Turn updates from both the endpointing controller and the coordinator.
    let (updates_tx, updates_rx) = mpsc::channel::<TurnUpdate>(UPDATE_BUFFER_SIZE);
    let coordinator = Arc::new(TurnCoordinator::new(
        session.clone(),
        entry.pipeline.clone(),
        playback.clone(),
        updates_tx.clone(),
    ));

    let controller = TurnController::new(
        coordinator,
        updates_tx,
        session.config.silence_delay,
    );
    let (events_tx, events_rx) = mpsc::channel::<RecognizerEvent>(EVENT_BUFFER_SIZE);
    let controller_task = tokio::spawn(controller.run(events_rx));

    // Recognizer feeding the endpointing stream.
    let recognizer_config = RecognizerConfig {
        api_key: app_state.config.deepgram_api_key.clone(),
        ..Default::default()
    };
    let mut recognizer = match create_recognizer("deepgram", recognizer_config) {
        Ok(recognizer) => recognizer,
        Err(e) => {
            error!("Failed to create recognizer: {}", e);
            controller_task.abort();
            let _ = message_tx
                .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                    message: format!("Failed to create recognizer: {e}"),
                    fatal: true,
                }))
                .await;
            return false;
        }
    };

    let event_sink = events_tx.clone();
    let event_callback: RecognizerEventCallback = Arc::new(move |event| {
        let event_sink = event_sink.clone();
        Box::pin(async move {
            if event_sink.send(event).await.is_err() {
                warn!("Endpointing stream closed, recognizer event dropped");
            }
        })
    });

    let error_sink = message_tx.clone();
    let error_callback: RecognizerErrorCallback = Arc::new(move |error| {
        let error_sink = error_sink.clone();
        Box::pin(async move {
            let _ = error_sink
                .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                    message: format!("Recognizer stream error: {error}"),
                    fatal: true,
                }))
                .await;
        })
    });

    // Callbacks must be registered before the socket task starts.
    let _ = recognizer.on_event(event_callback).await;
    let _ = recognizer.on_error(error_callback).await;

    if let Err(e) = recognizer.connect().await {
        error!("Failed to connect recognizer: {}", e);
        controller_task.abort();
        let _ = message_tx
            .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                message: format!("Failed to connect recognizer: {e}"),
                fatal: true,
            }))
            .await;
        return false;
    }

    // Forward turn updates out to the client.
    let forward_tx = message_tx.clone();
    let forward_task = tokio::spawn(forward_updates(updates_rx, forward_tx));

    // Forward paced playback events out to the client.
    let audio_tx = message_tx.clone();
    let audio_task = tokio::spawn(forward_playback(playback_rx, audio_tx));

    // Expiry watchdog: the debate ends when its time limit elapses,
    // whatever else is in flight.
    let watchdog_session = session.clone();
    let watchdog_playback = playback.clone();
    let watchdog_tx = message_tx.clone();
    let watchdog_task = tokio::spawn(async move {
        tokio::time::sleep(watchdog_session.config.time_limit).await;
        if watchdog_session.is_ended() {
            return;
        }
        info!("Session {} time limit reached", watchdog_session.id);
        watchdog_session.expire();
        watchdog_playback.interrupt();
        let _ = watchdog_tx
            .send(MessageRoute::Outgoing(OutgoingMessage::SessionExpired {
                final_scores: watchdog_session.current_scores(),
            }))
            .await;
    });

    let topic = session.topic.clone();
    {
        let mut state_guard = state.write().await;
        state_guard.entry = Some(entry);
        state_guard.recognizer = Some(Arc::new(Mutex::new(recognizer)));
        state_guard.playback = Some(playback);
        state_guard.events_tx = Some(events_tx);
        state_guard.tasks = vec![controller_task, forward_task, audio_task, watchdog_task];
    }

    let _ = message_tx
        .send(MessageRoute::Outgoing(OutgoingMessage::Ready {
            session_id,
            topic,
        }))
        .await;
    true
}

async fn forward_updates(
    mut updates_rx: mpsc::Receiver<TurnUpdate>,
    message_tx: mpsc::Sender<MessageRoute>,
) {
    while let Some(update) = updates_rx.recv().await {
        let outgoing = match update {
            TurnUpdate::Transcript { text, is_final } => OutgoingMessage::Transcript {
                transcript: text,
                is_final,
            },
            TurnUpdate::Turn(result) => OutgoingMessage::Turn {
                user_text: result.turn.user_text,
                ai_text: result.turn.ai_text,
                scores: result.turn.scores,
                cumulative: result.cumulative,
                feedback: result.turn.feedback,
            },
            TurnUpdate::TurnFailed(message) => OutgoingMessage::Error {
                message,
                fatal: false,
            },
        };
        if message_tx
            .send(MessageRoute::Outgoing(outgoing))
            .await
            .is_err()
        {
            break;
        }
    }
}

async fn forward_playback(
    mut playback_rx: mpsc::Receiver<PlaybackEvent>,
    message_tx: mpsc::Sender<MessageRoute>,
) {
    while let Some(event) = playback_rx.recv().await {
        let route = match event {
            PlaybackEvent::Frame(frame) => MessageRoute::Binary(frame),
            PlaybackEvent::Complete => {
                MessageRoute::Outgoing(OutgoingMessage::PlaybackComplete)
            }
            PlaybackEvent::Interrupted => {
                MessageRoute::Outgoing(OutgoingMessage::PlaybackInterrupted)
            }
        };
        if message_tx.send(route).await.is_err() {
            break;
        }
    }
}
