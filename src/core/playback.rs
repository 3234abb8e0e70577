//! Paced audio playback with interruption.
//!
//! Synthesized replies arrive as one buffer but leave as paced frames so the
//! session can cut playback off mid-reply. The manager holds at most one
//! playing task; starting a new reply or calling [`interrupt`] aborts the
//! old task immediately. A generation counter guards against a stale task's
//! completion clearing state that now belongs to a newer reply.
//!
//! [`interrupt`]: PlaybackManager::interrupt

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Whether the opponent's voice is currently being streamed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
}

/// Events delivered to the playback sink (the client connection).
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// One paced frame of audio.
    Frame(Bytes),
    /// The reply finished playing to the end.
    Complete,
    /// Playback was cut off; the client should flush its audio queue.
    Interrupted,
}

/// Pacing parameters for outbound audio.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackConfig {
    /// Bytes per frame sent to the sink.
    pub chunk_size: usize,
    /// Sample rate of the audio in Hz.
    pub sample_rate: u32,
    /// Bytes per sample (2 for linear16).
    pub bytes_per_sample: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8192,
            sample_rate: 24000,
            bytes_per_sample: 2,
        }
    }
}

impl PlaybackConfig {
    /// Real-time duration of one full frame.
    fn frame_duration(&self) -> std::time::Duration {
        let bytes_per_second = self.sample_rate * self.bytes_per_sample;
        std::time::Duration::from_secs_f64(self.chunk_size as f64 / f64::from(bytes_per_second))
    }
}

struct ActivePlayback {
    generation: u64,
    handle: tokio::task::JoinHandle<()>,
}

/// Owns the single outbound audio stream for a session.
pub struct PlaybackManager {
    sink: mpsc::Sender<PlaybackEvent>,
    config: PlaybackConfig,
    current: Mutex<Option<ActivePlayback>>,
    generation: AtomicU64,
}

impl PlaybackManager {
    pub fn new(sink: mpsc::Sender<PlaybackEvent>, config: PlaybackConfig) -> Self {
        Self {
            sink,
            config,
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.current.lock().is_some() {
            PlaybackState::Speaking
        } else {
            PlaybackState::Idle
        }
    }

    /// Start playing a reply, cutting off any reply still in flight.
    pub fn play(self: &Arc<Self>, audio: Bytes) {
        self.interrupt();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let audio_len = audio.len();
        let manager = self.clone();
        let sink = self.sink.clone();
        let config = self.config;

        // The slot is stored under the same lock `finish` takes, so a task
        // that completes immediately waits for the store instead of missing
        // its own generation.
        let mut current = self.current.lock();
        let handle = tokio::spawn(async move {
            let frame_duration = config.frame_duration();
            let mut offset = 0usize;
            let mut completed = true;

            while offset < audio.len() {
                let end = (offset + config.chunk_size).min(audio.len());
                let frame = audio.slice(offset..end);
                if sink.send(PlaybackEvent::Frame(frame)).await.is_err() {
                    // Sink gone means the connection closed; nothing left to
                    // pace for.
                    completed = false;
                    break;
                }
                offset = end;
                if offset < audio.len() {
                    tokio::time::sleep(frame_duration).await;
                }
            }

            if completed {
                let _ = sink.send(PlaybackEvent::Complete).await;
            }
            manager.finish(generation);
        });

        *current = Some(ActivePlayback { generation, handle });
        debug!("Playback {} started: {} bytes", generation, audio_len);
    }

    /// Cut off the current reply, if any. Safe to call when idle.
    pub fn interrupt(&self) -> bool {
        let Some(active) = self.current.lock().take() else {
            return false;
        };
        active.handle.abort();
        debug!("Playback {} interrupted", active.generation);
        if self.sink.try_send(PlaybackEvent::Interrupted).is_err() {
            warn!("Playback sink full or closed, interrupt signal dropped");
        }
        true
    }

    /// Clear the active slot when the owning task finishes. A stale
    /// generation means a newer reply already took the slot.
    fn finish(&self, generation: u64) {
        let mut current = self.current.lock();
        if current
            .as_ref()
            .is_some_and(|active| active.generation == generation)
        {
            *current = None;
            debug!("Playback {} complete", generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    fn manager(capacity: usize) -> (Arc<PlaybackManager>, mpsc::Receiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Arc::new(PlaybackManager::new(tx, PlaybackConfig::default())),
            rx,
        )
    }

    async fn drain_until_terminal(rx: &mut mpsc::Receiver<PlaybackEvent>) -> (usize, PlaybackEvent) {
        let mut frames = 0;
        loop {
            match rx.recv().await {
                Some(PlaybackEvent::Frame(_)) => frames += 1,
                Some(event) => return (frames, event),
                None => panic!("sink closed before terminal event"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_streams_frames_then_completes() {
        let (manager, mut rx) = manager(64);
        manager.play(Bytes::from(vec![0u8; 8192 * 3]));

        let (frames, terminal) = drain_until_terminal(&mut rx).await;
        assert_eq!(frames, 3);
        assert_eq!(terminal, PlaybackEvent::Complete);

        // The completing task clears the slot.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_audio_single_frame() {
        let (manager, mut rx) = manager(8);
        manager.play(Bytes::from(vec![0u8; 100]));

        let (frames, terminal) = drain_until_terminal(&mut rx).await;
        assert_eq!(frames, 1);
        assert_eq!(terminal, PlaybackEvent::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_cuts_off_playback() {
        let (manager, mut rx) = manager(64);
        manager.play(Bytes::from(vec![0u8; 8192 * 100]));
        assert_eq!(manager.state(), PlaybackState::Speaking);

        // Let a few frames through, then cut it off.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(manager.interrupt());
        assert_eq!(manager.state(), PlaybackState::Idle);

        let (frames, terminal) = drain_until_terminal(&mut rx).await;
        assert!(frames < 100);
        assert_eq!(terminal, PlaybackEvent::Interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_when_idle_is_noop() {
        let (manager, _rx) = manager(8);
        assert!(!manager.interrupt());
        assert_eq!(manager.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_play_replaces_old() {
        let (manager, mut rx) = manager(256);
        manager.play(Bytes::from(vec![0u8; 8192 * 100]));
        tokio::time::sleep(Duration::from_millis(500)).await;

        manager.play(Bytes::from(vec![1u8; 8192]));
        assert_eq!(manager.state(), PlaybackState::Speaking);

        // Old stream ends in Interrupted, new one in Complete.
        let (_, terminal) = drain_until_terminal(&mut rx).await;
        assert_eq!(terminal, PlaybackEvent::Interrupted);
        let (frames, terminal) = drain_until_terminal(&mut rx).await;
        assert_eq!(frames, 1);
        assert_eq!(terminal, PlaybackEvent::Complete);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.state(), PlaybackState::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_instant_completion_settles_to_idle() {
        let (manager, mut rx) = manager(64);

        // Empty audio completes as fast as the task can run, racing the
        // slot store in play().
        for _ in 0..10 {
            manager.play(Bytes::new());
            let (frames, terminal) = drain_until_terminal(&mut rx).await;
            assert_eq!(frames, 0);
            assert_eq!(terminal, PlaybackEvent::Complete);

            tokio::time::sleep(Duration::from_millis(50)).await;
            assert_eq!(manager.state(), PlaybackState::Idle);
            // A finished reply must not produce a spurious interrupt.
            assert!(!manager.interrupt());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_sink_does_not_wedge() {
        let (manager, rx) = manager(8);
        drop(rx);
        manager.play(Bytes::from(vec![0u8; 8192 * 4]));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(manager.state(), PlaybackState::Idle);
    }
}
