//! # WebSocket Debate Handler Module
//!
//! WebSocket interface for the live half of a debate: microphone audio in,
//! transcripts, scored turns, and synthesized reply audio out. A debate is
//! started over HTTP first; the socket attaches to it by session id.
//!
//! ## Connection Flow
//! 1. Client starts a debate via `POST /api/debate/start` and gets a session id
//! 2. Client connects to `/ws` and sends `{"type": "config", "session_id": "..."}`
//! 3. Server responds with `{"type": "ready", ...}` once the recognizer is live
//! 4. Client streams microphone audio as binary frames
//! 5. Server streams back transcript updates, turn results, and reply audio
//!
//! ## Message Types
//!
//! **Incoming:**
//! - `{"type": "config", "session_id": "ranked_easy_0042"}` - Attach to a session
//! - `{"type": "finalize"}` - End the current utterance now (push-to-talk release)
//! - `{"type": "mic_error", "code": "permission_denied", "message": "..."}` - Client mic failure
//! - **Binary messages** - Raw microphone audio (linear16)
//!
//! **Outgoing:**
//! - `{"type": "ready", "session_id": "...", "topic": "..."}` - Attached and listening
//! - `{"type": "transcript", "transcript": "...", "is_final": false}` - Live transcript
//! - `{"type": "turn", "user_text": "...", "ai_text": "...", "scores": {...}, "cumulative": {...}}` - Scored turn
//! - `{"type": "playback_complete"}` - Reply audio finished
//! - `{"type": "playback_interrupted"}` - Reply audio was cut off, flush the queue
//! - `{"type": "session_expired", "final_scores": {...}}` - Time limit reached
//! - `{"type": "error", "message": "...", "fatal": true}` - Error; fatal ends the session
//! - **Binary messages** - Paced frames of synthesized reply audio

pub mod audio_handler;
pub mod config_handler;
pub mod handler;
pub mod messages;
pub mod processor;
pub mod state;

// Re-export commonly used items
pub use handler::ws_debate_handler;
pub use messages::{IncomingMessage, MessageRoute, OutgoingMessage};
pub use state::ConnectionState;
