//! Turn processing pipeline: engine, session record, synthesis.
//!
//! Runs the expensive half of a turn after the coordinator has accepted it.
//! The engine call and the session record are the turn; synthesis failure
//! only costs the audio, never the scores.

use bytes::Bytes;
use tracing::{debug, warn};

use super::engine::BoxedEngine;
use super::error::{VoiceError, VoiceResult};
use super::session::{DebateSession, Turn, TurnScores};
use super::tts::Synthesizer;

/// A fully processed turn ready for delivery.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub turn: Turn,
    /// Cumulative session scores after this turn.
    pub cumulative: TurnScores,
    /// Synthesized reply audio, absent when synthesis failed or is disabled.
    pub audio: Option<Bytes>,
}

/// Processes accepted utterances into scored, voiced turns.
pub struct ResponsePipeline {
    engine: BoxedEngine,
    synthesizer: Option<Box<dyn Synthesizer>>,
}

impl ResponsePipeline {
    pub fn new(engine: BoxedEngine, synthesizer: Option<Box<dyn Synthesizer>>) -> Self {
        Self {
            engine,
            synthesizer,
        }
    }

    /// Run one utterance through the engine, record it on the session, and
    /// synthesize the reply.
    ///
    /// Recording happens before synthesis so a session that ended mid-flight
    /// discards the result before any audio work is spent on it.
    pub async fn process(&self, session: &DebateSession, text: &str) -> VoiceResult<TurnResult> {
        let outcome = self
            .engine
            .process_argument(text)
            .await
            .map_err(|e| VoiceError::Provider(e.to_string()))?;

        let (turn, cumulative) = session.record_turn(
            text.to_string(),
            outcome.reply.clone(),
            outcome.scores,
            outcome.feedback,
        )?;
        debug!(
            "Turn {} recorded for session {}: overall={:.1}",
            turn.index, session.id, cumulative.overall
        );

        let audio = match &self.synthesizer {
            Some(synthesizer) if !outcome.reply.is_empty() => {
                match synthesizer.synthesize(&outcome.reply).await {
                    Ok(audio) => Some(audio),
                    Err(e) => {
                        // The turn already counted; the reply just goes
                        // unvoiced.
                        warn!("Synthesis failed for session {}: {}", session.id, e);
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(TurnResult {
            turn,
            cumulative,
            audio,
        })
    }
}
