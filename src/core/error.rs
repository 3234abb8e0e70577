//! Error taxonomy for the voice conversation core.
//!
//! Fatal errors abandon the session; recoverable errors lose at most the
//! current turn and the session keeps listening. There are no automatic
//! retries anywhere in the core.

use thiserror::Error;

/// Errors produced by the voice conversation core.
#[derive(Debug, Clone, Error)]
pub enum VoiceError {
    /// Microphone access was denied on the client side.
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// No usable microphone, or the device is held by another process.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The streaming recognizer connection failed or dropped.
    #[error("recognizer transport error: {0}")]
    Transport(String),

    /// The scoring/response or synthesis provider failed.
    #[error("provider error: {0}")]
    Provider(String),

    /// Audio playback failed to decode or stream.
    #[error("playback error: {0}")]
    Playback(String),

    /// Operation attempted on a session that has already ended.
    #[error("session has ended")]
    SessionEnded,
}

impl VoiceError {
    /// Whether this error terminates the session.
    ///
    /// `Provider` and `Playback` failures drop the current turn but leave the
    /// session alive and listening; everything else stops the conversation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VoiceError::PermissionDenied(_)
                | VoiceError::DeviceUnavailable(_)
                | VoiceError::Transport(_)
                | VoiceError::SessionEnded
        )
    }
}

/// Result type for core voice operations.
pub type VoiceResult<T> = Result<T, VoiceError>;
