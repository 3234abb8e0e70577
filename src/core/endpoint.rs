//! Utterance endpointing.
//!
//! The controller consumes the recognizer event stream and decides when the
//! user's turn is over: either the provider says so explicitly (speech-final
//! or utterance-end), or a silence window elapses after the last final
//! fragment with no new speech. A finished turn is handed to the coordinator
//! on a separate task so endpointing never stalls behind turn processing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use super::coordinator::{TurnCoordinator, TurnUpdate};
use super::stt::RecognizerEvent;
use super::transcript::UtteranceBuffer;

/// Drives the silence-debounce state machine for one session.
pub struct TurnController {
    buffer: UtteranceBuffer,
    coordinator: Arc<TurnCoordinator>,
    updates: mpsc::Sender<TurnUpdate>,
    /// Silence after the last final fragment that closes the turn.
    silence_delay: Duration,
}

impl TurnController {
    pub fn new(
        coordinator: Arc<TurnCoordinator>,
        updates: mpsc::Sender<TurnUpdate>,
        silence_delay: Duration,
    ) -> Self {
        Self {
            buffer: UtteranceBuffer::new(),
            coordinator,
            updates,
            silence_delay,
        }
    }

    /// Run until the recognizer event stream closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<RecognizerEvent>) {
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Recognizer stream closed, endpointing stopped");
                        break;
                    };
                    self.handle_event(event, &mut deadline).await;
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    debug!("Silence window elapsed, finishing turn");
                    deadline = None;
                    self.finish_turn().await;
                }
            }
        }
    }

    async fn handle_event(&mut self, event: RecognizerEvent, deadline: &mut Option<Instant>) {
        match event {
            RecognizerEvent::Transcript {
                text,
                is_final: true,
                speech_final,
                ..
            } => {
                if let Some(full) = self.buffer.push_final(&text) {
                    let update = TurnUpdate::Transcript {
                        text: full.to_string(),
                        is_final: true,
                    };
                    let _ = self.updates.send(update).await;
                }
                if speech_final {
                    debug!("Speech-final marker, finishing turn");
                    *deadline = None;
                    self.finish_turn().await;
                } else if !self.buffer.is_empty() {
                    *deadline = Some(Instant::now() + self.silence_delay);
                }
            }

            RecognizerEvent::Transcript { text, .. } => {
                let preview = self.buffer.preview(&text);
                if !text.trim().is_empty() {
                    // Speech resumed; a pending silence deadline no longer
                    // means the turn is over.
                    *deadline = None;
                    let update = TurnUpdate::Transcript {
                        text: preview,
                        is_final: false,
                    };
                    let _ = self.updates.send(update).await;
                }
            }

            RecognizerEvent::UtteranceEnd => {
                if !self.buffer.is_empty() {
                    debug!("Utterance-end marker, finishing turn");
                    *deadline = None;
                    self.finish_turn().await;
                }
            }
        }
    }

    /// Take the buffered utterance and propose it, without blocking the
    /// event loop on processing.
    async fn finish_turn(&mut self) {
        let text = self.buffer.take();
        if text.is_empty() {
            return;
        }
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            let outcome = coordinator.propose(&text).await;
            debug!("Proposal outcome: {:?}", outcome);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{EngineError, TurnOutcome, TurnProcessor};
    use crate::core::pipeline::ResponsePipeline;
    use crate::core::playback::{PlaybackConfig, PlaybackManager};
    use crate::core::session::{ArgumentScores, Difficulty, DebateSession, GameMode, SessionConfig};
    use async_trait::async_trait;
    use tokio::time::Duration;

    struct EchoEngine;

    #[async_trait]
    impl TurnProcessor for EchoEngine {
        async fn process_argument(&self, text: &str) -> Result<TurnOutcome, EngineError> {
            Ok(TurnOutcome {
                reply: format!("Re: {text}"),
                scores: Some(ArgumentScores {
                    clarity: 7.0,
                    argument_strength: 7.0,
                    rhetoric: 7.0,
                }),
                feedback: None,
            })
        }

        fn get_provider_info(&self) -> &'static str {
            "echo"
        }
    }

    struct Fixture {
        events: mpsc::Sender<RecognizerEvent>,
        updates: mpsc::Receiver<TurnUpdate>,
        session: Arc<DebateSession>,
        _playback_events: mpsc::Receiver<crate::core::playback::PlaybackEvent>,
    }

    fn start() -> Fixture {
        let session = Arc::new(DebateSession::new(
            "test".to_string(),
            GameMode::Ranked,
            Difficulty::Medium,
            "topic".to_string(),
            SessionConfig::default(),
        ));
        let pipeline = Arc::new(ResponsePipeline::new(Box::new(EchoEngine), None));
        let (sink, playback_events) = mpsc::channel(64);
        let playback = Arc::new(PlaybackManager::new(sink, PlaybackConfig::default()));
        let (updates_tx, updates) = mpsc::channel(64);
        let coordinator = Arc::new(TurnCoordinator::new(
            session.clone(),
            pipeline,
            playback,
            updates_tx.clone(),
        ));
        let controller =
            TurnController::new(coordinator, updates_tx, Duration::from_millis(1500));
        let (events, events_rx) = mpsc::channel(64);
        tokio::spawn(controller.run(events_rx));

        Fixture {
            events,
            updates,
            session,
            _playback_events: playback_events,
        }
    }

    fn final_fragment(text: &str) -> RecognizerEvent {
        RecognizerEvent::Transcript {
            text: text.to_string(),
            is_final: true,
            speech_final: false,
            confidence: 0.9,
        }
    }

    fn partial(text: &str) -> RecognizerEvent {
        RecognizerEvent::Transcript {
            text: text.to_string(),
            is_final: false,
            speech_final: false,
            confidence: 0.5,
        }
    }

    async fn next_turn(updates: &mut mpsc::Receiver<TurnUpdate>) -> crate::core::pipeline::TurnResult {
        loop {
            match updates.recv().await {
                Some(TurnUpdate::Turn(result)) => return result,
                Some(_) => continue,
                None => panic!("updates channel closed"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_window_closes_turn() {
        let mut fx = start();
        fx.events.send(final_fragment("tariffs raise prices")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1600)).await;
        let result = next_turn(&mut fx.updates).await;
        assert_eq!(result.turn.user_text, "tariffs raise prices");
        assert_eq!(fx.session.turn_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_continue_merges_fragments() {
        let mut fx = start();
        fx.events.send(final_fragment("no")).await.unwrap();

        // Pause shorter than the silence window, then keep talking.
        tokio::time::sleep(Duration::from_millis(800)).await;
        fx.events.send(partial("wait")).await.unwrap();
        fx.events
            .send(final_fragment("wait actually yes"))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1600)).await;
        let result = next_turn(&mut fx.updates).await;
        assert_eq!(result.turn.user_text, "no wait actually yes");
        assert_eq!(fx.session.turn_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speech_final_closes_immediately() {
        let mut fx = start();
        fx.events
            .send(RecognizerEvent::Transcript {
                text: "that is my whole point".to_string(),
                is_final: true,
                speech_final: true,
                confidence: 0.9,
            })
            .await
            .unwrap();

        // No silence window needed.
        let result = next_turn(&mut fx.updates).await;
        assert_eq!(result.turn.user_text, "that is my whole point");
    }

    #[tokio::test(start_paused = true)]
    async fn test_utterance_end_closes_turn() {
        let mut fx = start();
        fx.events.send(final_fragment("short point")).await.unwrap();
        fx.events.send(RecognizerEvent::UtteranceEnd).await.unwrap();

        let result = next_turn(&mut fx.updates).await;
        assert_eq!(result.turn.user_text, "short point");
    }

    #[tokio::test(start_paused = true)]
    async fn test_utterance_end_with_empty_buffer_ignored() {
        let mut fx = start();
        fx.events.send(RecognizerEvent::UtteranceEnd).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fx.session.turn_count(), 0);
        assert!(fx.updates.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partials_previewed_not_dispatched() {
        let mut fx = start();
        fx.events.send(final_fragment("I think")).await.unwrap();
        fx.events.send(partial("tariffs")).await.unwrap();

        match fx.updates.recv().await {
            Some(TurnUpdate::Transcript { text, is_final }) => {
                assert_eq!(text, "I think");
                assert!(is_final);
            }
            other => panic!("Expected transcript update, got {other:?}"),
        }
        match fx.updates.recv().await {
            Some(TurnUpdate::Transcript { text, is_final }) => {
                assert_eq!(text, "I think tariffs");
                assert!(!is_final);
            }
            other => panic!("Expected preview update, got {other:?}"),
        }

        // The partial cancelled the pending silence deadline, so no turn yet.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fx.session.turn_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_noise_discarded() {
        let mut fx = start();
        fx.events.send(final_fragment("um")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1600)).await;

        // The fragment was endpointed but discarded as noise.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fx.session.turn_count(), 0);
    }
}
