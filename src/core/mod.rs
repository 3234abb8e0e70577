//! Core voice debate logic: recognition, endpointing, turn processing,
//! synthesis, playback, and scoring. Everything here is transport-agnostic;
//! the WebSocket and HTTP surfaces live in `handlers`.

pub mod coordinator;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod profile;
pub mod rating;
pub mod session;
pub mod stt;
pub mod transcript;
pub mod tts;

pub use coordinator::{ProposalOutcome, TurnCoordinator, TurnUpdate};
pub use endpoint::TurnController;
pub use error::{VoiceError, VoiceResult};
pub use pipeline::{ResponsePipeline, TurnResult};
pub use playback::{PlaybackConfig, PlaybackEvent, PlaybackManager, PlaybackState};
pub use profile::{DebateRecord, PlayerProfile, ProfileStore};
pub use session::{
    ArgumentScores, DebateSession, Difficulty, GameMode, SessionConfig, Turn, TurnScores,
};
pub use transcript::UtteranceBuffer;
