//! HTTP API handlers
//!
//! The HTTP surface covers the non-realtime half of the game: starting a
//! debate, reading scores mid-session, ending a debate (which settles ELO
//! against the player profile), and player stats. The voice exchange itself
//! happens over the WebSocket in `handlers::ws`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::core::engine::{self, AnthropicEngine};
use crate::core::pipeline::ResponsePipeline;
use crate::core::rating::{self, RankProgress};
use crate::core::session::{DebateSession, Difficulty, GameMode, SessionConfig, Turn, TurnScores};
use crate::core::tts::{create_synthesizer, SynthConfig};
use crate::errors::{AppError, AppResult};
use crate::state::{AppState, SessionEntry};

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "yapbattle",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
pub struct StartDebateRequest {
    pub mode: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Override the random topic, mainly for testing.
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartDebateResponse {
    pub session_id: String,
    pub topic: String,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub time_limit_seconds: u64,
    pub response_delay_ms: u64,
}

/// Start a new debate session.
pub async fn start_debate(
    State(state): State<AppState>,
    Json(request): Json<StartDebateRequest>,
) -> AppResult<Json<StartDebateResponse>> {
    let mode: GameMode = request.mode.parse().map_err(AppError::BadRequest)?;
    let difficulty: Difficulty = request
        .difficulty
        .as_deref()
        .unwrap_or("medium")
        .parse()
        .map_err(AppError::BadRequest)?;

    let topic = request
        .topic
        .unwrap_or_else(|| engine::random_topic(mode).to_string());
    let prompt = engine::get_prompt(difficulty, &topic, mode);

    let session_id = format!(
        "{mode}_{difficulty}_{:04}",
        rand::thread_rng().gen_range(0..10000)
    );

    let session_config = SessionConfig {
        time_limit: prompt.time_limit,
        silence_delay: prompt.response_delay,
        ..Default::default()
    };

    let engine = AnthropicEngine::new(
        state.config.anthropic_api_key.clone(),
        prompt.system_prompt.clone(),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let synthesizer = create_synthesizer(
        "deepgram",
        SynthConfig {
            api_key: state.config.deepgram_api_key.clone(),
            ..Default::default()
        },
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let session = Arc::new(DebateSession::new(
        session_id.clone(),
        mode,
        difficulty,
        topic.clone(),
        session_config,
    ));
    let pipeline = Arc::new(ResponsePipeline::new(Box::new(engine), Some(synthesizer)));

    state
        .insert_session(Arc::new(SessionEntry {
            session,
            pipeline,
            prompt: prompt.clone(),
        }))
        .await;

    info!(
        "Debate started: {} (mode={}, difficulty={}, topic={:?})",
        session_id, mode, difficulty, topic
    );

    Ok(Json(StartDebateResponse {
        session_id,
        topic,
        mode,
        difficulty,
        time_limit_seconds: prompt.time_limit.as_secs(),
        response_delay_ms: prompt.response_delay.as_millis() as u64,
    }))
}

#[derive(Debug, Serialize)]
pub struct ScoresResponse {
    pub session_id: String,
    pub scores: TurnScores,
    pub turns: Vec<Turn>,
    pub ended: bool,
}

/// Current cumulative scores for a session.
pub async fn get_scores(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<ScoresResponse>> {
    let entry = state
        .get_session(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown session: {session_id}")))?;

    Ok(Json(ScoresResponse {
        session_id,
        scores: entry.session.current_scores(),
        turns: entry.session.turns(),
        ended: entry.session.is_ended(),
    }))
}

#[derive(Debug, Serialize)]
pub struct EndDebateResponse {
    pub session_id: String,
    pub final_scores: TurnScores,
    pub won: bool,
    pub elo_change: i64,
    pub new_elo: i64,
    pub rank: String,
    pub rank_progress: RankProgress,
}

/// End a debate and settle the result against the player profile.
pub async fn end_debate(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<EndDebateResponse>> {
    let entry = state
        .remove_session(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown session: {session_id}")))?;

    // The watchdog may have expired the session already; final scores stand
    // either way.
    let final_scores = entry
        .session
        .end()
        .unwrap_or_else(|_| entry.session.current_scores());

    let record = state.profile.record_debate(
        entry.session.mode,
        final_scores.overall,
        entry.session.difficulty,
    );

    info!(
        "Debate ended: {} overall={:.1} won={} elo_change={:+}",
        session_id, final_scores.overall, record.won, record.elo_change
    );

    Ok(Json(EndDebateResponse {
        session_id,
        final_scores,
        won: record.won,
        elo_change: record.elo_change,
        new_elo: record.new_elo,
        rank: record.new_rank.to_string(),
        rank_progress: rating::rank_progress(record.new_elo),
    }))
}

/// Player profile and rank progress.
pub async fn user_stats(State(state): State<AppState>) -> Json<Value> {
    let profile = state.profile.snapshot();
    let progress = profile.rank_progress();

    Json(json!({
        "username": profile.username,
        "elo": profile.elo,
        "rank": profile.rank().to_string(),
        "rank_progress": progress,
        "streak_days": profile.streak_days,
        "best_streak": profile.best_streak,
        "total_debates": profile.total_debates,
        "wins": profile.wins,
        "losses": profile.losses,
        "win_rate": profile.win_rate(),
        "average_score": profile.average_score,
        "modes": {
            "ranked": profile.ranked_played,
            "hot_takes": profile.hot_takes_played,
            "podcast": profile.podcast_played,
        },
    }))
}
