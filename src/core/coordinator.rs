//! Turn coordination: single-flight dispatch and playback handoff.
//!
//! At most one turn is ever processing per session. The processing lock is a
//! compare-and-swap so a proposal that loses the race is dropped immediately
//! instead of queueing; by the time the current turn finishes, a stale
//! utterance would be answering the wrong point. Proposals that arrive while
//! the opponent is mid-reply interrupt playback first, then dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::error::VoiceError;
use super::pipeline::{ResponsePipeline, TurnResult};
use super::playback::PlaybackManager;
use super::session::DebateSession;

/// What the coordinator did with a proposed utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// Accepted and processed into a turn.
    Dispatched,
    /// Rejected because another turn was already processing.
    Dropped,
    /// Rejected before processing (too short, session ended) or lost to a
    /// recoverable processing failure.
    Discarded,
}

/// Updates streamed back to the client while a session runs.
#[derive(Debug, Clone)]
pub enum TurnUpdate {
    /// Live transcript of what the user is saying.
    Transcript { text: String, is_final: bool },
    /// A completed, scored turn.
    Turn(TurnResult),
    /// A turn was accepted but failed during processing.
    TurnFailed(String),
}

/// Serializes turn processing for one session.
pub struct TurnCoordinator {
    session: Arc<DebateSession>,
    pipeline: Arc<ResponsePipeline>,
    playback: Arc<PlaybackManager>,
    updates: mpsc::Sender<TurnUpdate>,
    processing: AtomicBool,
}

/// Releases the processing lock when the dispatch path unwinds.
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl TurnCoordinator {
    pub fn new(
        session: Arc<DebateSession>,
        pipeline: Arc<ResponsePipeline>,
        playback: Arc<PlaybackManager>,
        updates: mpsc::Sender<TurnUpdate>,
    ) -> Self {
        Self {
            session,
            pipeline,
            playback,
            updates,
            processing: AtomicBool::new(false),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Propose a finalized utterance as the user's turn.
    pub async fn propose(&self, text: &str) -> ProposalOutcome {
        let text = text.trim();
        if text.chars().count() < self.session.config.min_utterance_chars {
            debug!("Utterance too short, discarded: {:?}", text);
            return ProposalOutcome::Discarded;
        }
        if self.session.is_ended() {
            debug!("Session {} already ended, utterance discarded", self.session.id);
            return ProposalOutcome::Discarded;
        }

        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Turn already processing, utterance dropped: {:?}", text);
            return ProposalOutcome::Dropped;
        }
        let _guard = ProcessingGuard {
            flag: &self.processing,
        };

        // Speaking over the opponent cuts the reply off; the new turn wins.
        if self.playback.interrupt() {
            debug!("Playback interrupted by new utterance");
        }

        match self.pipeline.process(&self.session, text).await {
            Ok(result) => {
                if let Some(audio) = result.audio.clone() {
                    self.playback.play(audio);
                }
                if self.updates.send(TurnUpdate::Turn(result)).await.is_err() {
                    warn!("Update channel closed, turn result not delivered");
                }
                ProposalOutcome::Dispatched
            }
            Err(VoiceError::SessionEnded) => {
                debug!(
                    "Session {} ended mid-processing, result discarded",
                    self.session.id
                );
                ProposalOutcome::Discarded
            }
            Err(e) => {
                warn!("Turn processing failed for session {}: {}", self.session.id, e);
                let _ = self.updates.send(TurnUpdate::TurnFailed(e.to_string())).await;
                ProposalOutcome::Discarded
            }
        }
    }
}
