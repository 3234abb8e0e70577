//! Per-session debate state.
//!
//! A [`DebateSession`] is the mutable record backing one voice debate: the
//! ordered turn history, cumulative score accumulators, and the ended flag.
//! It is not a state machine itself; the controller, coordinator and playback
//! manager read and write it. All mutation goes through a single internal
//! lock, and `end()` is terminal: once a session has ended, turn recording
//! fails fast instead of silently continuing.

use std::str::FromStr;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::error::{VoiceError, VoiceResult};

/// Game mode selected at debate start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Competitive mode; the only mode that moves ELO.
    Ranked,
    /// Fast chaotic mode with absurd topics.
    HotTakes,
    /// Slow, exploratory conversation mode.
    Podcast,
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Ranked => write!(f, "ranked"),
            GameMode::HotTakes => write!(f, "hot_takes"),
            GameMode::Podcast => write!(f, "podcast"),
        }
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ranked" => Ok(GameMode::Ranked),
            "hot_takes" => Ok(GameMode::HotTakes),
            "podcast" => Ok(GameMode::Podcast),
            other => Err(format!(
                "unsupported mode: {other}. Supported modes: ranked, hot_takes, podcast"
            )),
        }
    }
}

/// AI opponent difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!(
                "unsupported difficulty: {other}. Supported difficulties: easy, medium, hard"
            )),
        }
    }
}

/// Timing configuration resolved from mode and difficulty at session start.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Total debate duration before the session expires.
    pub time_limit: Duration,
    /// Silence after the last final fragment that closes an utterance.
    pub silence_delay: Duration,
    /// Finalized utterances shorter than this are treated as noise.
    pub min_utterance_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(120),
            silence_delay: Duration::from_millis(1500),
            min_utterance_chars: 4,
        }
    }
}

/// Raw per-argument scores from the scoring provider, each in [1, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArgumentScores {
    pub clarity: f64,
    pub argument_strength: f64,
    pub rhetoric: f64,
}

impl ArgumentScores {
    /// Clamp all components into the valid [1, 10] scoring range.
    pub fn clamped(self) -> Self {
        Self {
            clarity: self.clarity.clamp(1.0, 10.0),
            argument_strength: self.argument_strength.clamp(1.0, 10.0),
            rhetoric: self.rhetoric.clamp(1.0, 10.0),
        }
    }
}

/// Score snapshot, either for a single turn or cumulative over the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnScores {
    pub clarity: f64,
    pub argument: f64,
    pub rhetoric: f64,
    pub overall: f64,
}

impl TurnScores {
    fn zero() -> Self {
        Self {
            clarity: 0.0,
            argument: 0.0,
            rhetoric: 0.0,
            overall: 0.0,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One completed exchange: finalized user text plus the scored AI rebuttal.
///
/// Immutable once created; appended to the session's turn sequence with a
/// monotonically increasing index.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub index: u32,
    pub user_text: String,
    pub ai_text: String,
    pub scores: Option<TurnScores>,
    pub feedback: Option<String>,
}

/// Running-average accumulators over all scored turns.
#[derive(Debug, Default)]
struct ScoreBoard {
    clarity: f64,
    argument: f64,
    rhetoric: f64,
    scored_turns: u32,
}

impl ScoreBoard {
    fn record(&mut self, scores: ArgumentScores) {
        let scores = scores.clamped();
        let n = f64::from(self.scored_turns);
        self.scored_turns += 1;
        let count = f64::from(self.scored_turns);
        self.clarity = (self.clarity * n + scores.clarity) / count;
        self.argument = (self.argument * n + scores.argument_strength) / count;
        self.rhetoric = (self.rhetoric * n + scores.rhetoric) / count;
    }

    fn current(&self) -> TurnScores {
        if self.scored_turns == 0 {
            return TurnScores::zero();
        }
        let overall = (self.clarity + self.argument + self.rhetoric) / 3.0;
        TurnScores {
            clarity: round1(self.clarity),
            argument: round1(self.argument),
            rhetoric: round1(self.rhetoric),
            overall: round1(overall),
        }
    }
}

struct SessionInner {
    turns: Vec<Turn>,
    board: ScoreBoard,
    ended: bool,
}

/// Mutable per-session record shared by the conversation components.
pub struct DebateSession {
    pub id: String,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub topic: String,
    pub config: SessionConfig,
    inner: Mutex<SessionInner>,
}

impl DebateSession {
    pub fn new(
        id: String,
        mode: GameMode,
        difficulty: Difficulty,
        topic: String,
        config: SessionConfig,
    ) -> Self {
        Self {
            id,
            mode,
            difficulty,
            topic,
            config,
            inner: Mutex::new(SessionInner {
                turns: Vec::new(),
                board: ScoreBoard::default(),
                ended: false,
            }),
        }
    }

    pub fn is_ended(&self) -> bool {
        self.inner.lock().ended
    }

    /// Append an immutable turn and return it with the updated cumulative
    /// scores. Fails fast if the session has ended, so results from in-flight
    /// processing are discarded rather than applied to a dead session.
    pub fn record_turn(
        &self,
        user_text: String,
        ai_text: String,
        scores: Option<ArgumentScores>,
        feedback: Option<String>,
    ) -> VoiceResult<(Turn, TurnScores)> {
        let mut inner = self.inner.lock();
        if inner.ended {
            return Err(VoiceError::SessionEnded);
        }

        let turn_scores = scores.map(|raw| {
            let raw = raw.clamped();
            inner.board.record(raw);
            let overall = (raw.clarity + raw.argument_strength + raw.rhetoric) / 3.0;
            TurnScores {
                clarity: round1(raw.clarity),
                argument: round1(raw.argument_strength),
                rhetoric: round1(raw.rhetoric),
                overall: round1(overall),
            }
        });

        let turn = Turn {
            index: inner.turns.len() as u32,
            user_text,
            ai_text,
            scores: turn_scores,
            feedback,
        };
        inner.turns.push(turn.clone());

        Ok((turn, inner.board.current()))
    }

    /// Cumulative running-average scores over all scored turns so far.
    pub fn current_scores(&self) -> TurnScores {
        self.inner.lock().board.current()
    }

    pub fn turn_count(&self) -> usize {
        self.inner.lock().turns.len()
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.inner.lock().turns.clone()
    }

    /// End the session and return the final cumulative scores.
    ///
    /// Terminal: a second call is an error, and all subsequent turn recording
    /// fails with [`VoiceError::SessionEnded`].
    pub fn end(&self) -> VoiceResult<TurnScores> {
        let mut inner = self.inner.lock();
        if inner.ended {
            return Err(VoiceError::SessionEnded);
        }
        inner.ended = true;
        Ok(inner.board.current())
    }

    /// Mark the session ended without reading scores. Used by the time-limit
    /// watchdog; idempotent.
    pub fn expire(&self) {
        self.inner.lock().ended = true;
    }
}
