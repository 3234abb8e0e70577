//! WebSocket connection state management
//!
//! Per-connection state: which debate session this socket is attached to,
//! the live recognizer, the playback manager, and the background tasks that
//! must die with the connection.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::core::playback::PlaybackManager;
use crate::core::stt::{BaseRecognizer, RecognizerEvent};
use crate::state::SessionEntry;

/// State for one WebSocket voice connection.
///
/// Configured exactly once by the `config` message; the audio hot path only
/// reads from it afterwards.
pub struct ConnectionState {
    pub entry: Option<Arc<SessionEntry>>,
    /// Streaming recognizer, behind a mutex because `send_audio` needs `&mut`
    pub recognizer: Option<Arc<Mutex<Box<dyn BaseRecognizer>>>>,
    pub playback: Option<Arc<PlaybackManager>>,
    /// Injection point into the endpointing event stream, used by `finalize`
    pub events_tx: Option<mpsc::Sender<RecognizerEvent>>,
    /// Background tasks (update forwarding, expiry watchdog) to abort on close
    pub tasks: Vec<JoinHandle<()>>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            entry: None,
            recognizer: None,
            playback: None,
            events_tx: None,
            tasks: Vec::new(),
        }
    }

    /// Whether the `config` message has attached a session.
    pub fn is_configured(&self) -> bool {
        self.entry.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.entry.as_ref().map(|entry| entry.session.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_starts_unconfigured() {
        let state = ConnectionState::new();
        assert!(!state.is_configured());
        assert!(state.session_id().is_none());
        assert!(state.recognizer.is_none());
        assert!(state.tasks.is_empty());
    }
}
