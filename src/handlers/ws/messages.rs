//! WebSocket message types and routing
//!
//! Defines the JSON control messages exchanged with the browser client and
//! the routing enum used by the connection's sender task. Audio travels as
//! binary frames in both directions: microphone chunks in, synthesized
//! reply frames out.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::session::TurnScores;

/// WebSocket message types for incoming messages
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    /// Attach this connection to a previously started debate session.
    #[serde(rename = "config")]
    Config { session_id: String },
    /// The client's push-to-talk button was released; close the current
    /// utterance without waiting for silence.
    #[serde(rename = "finalize")]
    Finalize,
    /// The client's microphone failed.
    #[serde(rename = "mic_error")]
    MicError {
        code: String,
        #[serde(default)]
        message: Option<String>,
    },
}

/// WebSocket message types for outgoing messages
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    /// Session attached, recognizer connected, audio may flow.
    #[serde(rename = "ready")]
    Ready { session_id: String, topic: String },
    /// Live transcript of the user's current utterance.
    #[serde(rename = "transcript")]
    Transcript { transcript: String, is_final: bool },
    /// A completed, scored turn. Reply audio follows as binary frames.
    #[serde(rename = "turn")]
    Turn {
        user_text: String,
        ai_text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        scores: Option<TurnScores>,
        cumulative: TurnScores,
        #[serde(skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
    /// The opponent's reply finished playing.
    #[serde(rename = "playback_complete")]
    PlaybackComplete,
    /// Playback was cut off; the client should flush queued audio.
    #[serde(rename = "playback_interrupted")]
    PlaybackInterrupted,
    /// The debate's time limit elapsed.
    #[serde(rename = "session_expired")]
    SessionExpired { final_scores: TurnScores },
    #[serde(rename = "error")]
    Error { message: String, fatal: bool },
}

/// Message routing for the connection's sender task
pub enum MessageRoute {
    Outgoing(OutgoingMessage),
    Binary(Bytes),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_config_parses() {
        let raw = r#"{"type": "config", "session_id": "ranked_easy_0042"}"#;
        let message: IncomingMessage = serde_json::from_str(raw).unwrap();
        match message {
            IncomingMessage::Config { session_id } => {
                assert_eq!(session_id, "ranked_easy_0042");
            }
            other => panic!("Expected config, got {other:?}"),
        }
    }

    #[test]
    fn test_mic_error_message_optional() {
        let raw = r#"{"type": "mic_error", "code": "permission_denied"}"#;
        let message: IncomingMessage = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            message,
            IncomingMessage::MicError { message: None, .. }
        ));
    }

    #[test]
    fn test_outgoing_tagged_serialization() {
        let message = OutgoingMessage::Transcript {
            transcript: "I think tariffs".to_string(),
            is_final: false,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "transcript");
        assert_eq!(json["is_final"], false);
    }

    #[test]
    fn test_turn_omits_missing_scores() {
        let message = OutgoingMessage::Turn {
            user_text: "point".to_string(),
            ai_text: "counter".to_string(),
            scores: None,
            cumulative: TurnScores {
                clarity: 0.0,
                argument: 0.0,
                rhetoric: 0.0,
                overall: 0.0,
            },
            feedback: None,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("scores").is_none());
        assert!(json.get("feedback").is_none());
    }
}
