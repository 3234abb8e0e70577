//! Debate engine abstraction.
//!
//! A [`TurnProcessor`] turns one finalized user argument into the opponent's
//! reply plus per-argument scores. Implementations own their conversation
//! history; the caller only ever holds a trait object.

pub mod anthropic;
pub mod prompts;

use async_trait::async_trait;

pub use anthropic::AnthropicEngine;
pub use prompts::{get_prompt, random_topic, PromptConfig};

use super::session::ArgumentScores;

/// Error types for debate engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// One processed turn: the opponent's spoken reply and, when the provider
/// invoked the scoring tool, the raw scores and feedback.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub scores: Option<ArgumentScores>,
    pub feedback: Option<String>,
}

/// Base trait for debate engine providers
#[async_trait]
pub trait TurnProcessor: Send + Sync {
    /// Process one finalized user argument and produce the opponent's turn.
    ///
    /// Implementations append both sides to their conversation history so a
    /// later call sees the full exchange.
    async fn process_argument(&self, text: &str) -> Result<TurnOutcome, EngineError>;

    /// Get provider-specific information
    fn get_provider_info(&self) -> &'static str;
}

/// Helper function to create a boxed engine trait object
pub type BoxedEngine = Box<dyn TurnProcessor>;
