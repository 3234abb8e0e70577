use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::core::engine::PromptConfig;
use crate::core::pipeline::ResponsePipeline;
use crate::core::profile::ProfileStore;
use crate::core::session::DebateSession;

/// One active debate: the session record plus its processing pipeline.
///
/// The pipeline lives here rather than in the WebSocket handler so a debate
/// started over HTTP keeps its engine conversation history when the voice
/// connection attaches.
pub struct SessionEntry {
    pub session: Arc<DebateSession>,
    pub pipeline: Arc<ResponsePipeline>,
    pub prompt: PromptConfig,
}

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Player profile store, shared across all sessions
    pub profile: Arc<ProfileStore>,
    sessions: Arc<RwLock<HashMap<String, Arc<SessionEntry>>>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let profile = Arc::new(ProfileStore::load(config.profile_path.clone()));
        Self {
            config: Arc::new(config),
            profile,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert_session(&self, entry: Arc<SessionEntry>) {
        let id = entry.session.id.clone();
        info!("Session {} registered", id);
        self.sessions.write().await.insert(id, entry);
    }

    pub async fn get_session(&self, id: &str) -> Option<Arc<SessionEntry>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove_session(&self, id: &str) -> Option<Arc<SessionEntry>> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            debug!("Session {} removed", id);
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{get_prompt, EngineError, TurnOutcome, TurnProcessor};
    use crate::core::session::{Difficulty, GameMode, SessionConfig};
    use async_trait::async_trait;

    struct NullEngine;

    #[async_trait]
    impl TurnProcessor for NullEngine {
        async fn process_argument(&self, _text: &str) -> Result<TurnOutcome, EngineError> {
            Ok(TurnOutcome {
                reply: String::new(),
                scores: None,
                feedback: None,
            })
        }

        fn get_provider_info(&self) -> &'static str {
            "null"
        }
    }

    fn state() -> AppState {
        let config = ServerConfig::from_lookup(|key| match key {
            "DEEPGRAM_API_KEY" => Some("dg".to_string()),
            "ANTHROPIC_API_KEY" => Some("an".to_string()),
            "PROFILE_PATH" => Some("/tmp/yapbattle-test-profile.json".to_string()),
            _ => None,
        })
        .unwrap();
        AppState::new(config)
    }

    fn entry(id: &str) -> Arc<SessionEntry> {
        Arc::new(SessionEntry {
            session: Arc::new(DebateSession::new(
                id.to_string(),
                GameMode::Ranked,
                Difficulty::Easy,
                "topic".to_string(),
                SessionConfig::default(),
            )),
            pipeline: Arc::new(ResponsePipeline::new(Box::new(NullEngine), None)),
            prompt: get_prompt(Difficulty::Easy, "topic", GameMode::Ranked),
        })
    }

    #[tokio::test]
    async fn test_session_registry() {
        let state = state();
        assert_eq!(state.session_count().await, 0);

        state.insert_session(entry("ranked_easy_0001")).await;
        assert_eq!(state.session_count().await, 1);
        assert!(state.get_session("ranked_easy_0001").await.is_some());
        assert!(state.get_session("missing").await.is_none());

        assert!(state.remove_session("ranked_easy_0001").await.is_some());
        assert!(state.remove_session("ranked_easy_0001").await.is_none());
        assert_eq!(state.session_count().await, 0);
    }
}
