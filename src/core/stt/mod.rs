//! Speech recognition providers.
//!
//! The recognizer streams microphone audio to a provider over WebSocket and
//! emits [`RecognizerEvent`]s through a registered callback: interleaved
//! partial and final transcript hypotheses, plus explicit utterance-end
//! markers where the provider supports them.

pub mod deepgram;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use deepgram::DeepgramRecognizer;

/// An event from the streaming recognizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    /// A transcript hypothesis for the current audio window.
    Transcript {
        text: String,
        /// Final hypotheses are stable; partials will be replaced.
        is_final: bool,
        /// Provider-detected end of a speech segment.
        speech_final: bool,
        confidence: f32,
    },
    /// The provider detected the end of an utterance without further speech.
    UtteranceEnd,
}

/// Error types for recognizer operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RecognizerError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Type alias for recognizer event callback
pub type RecognizerEventCallback =
    Arc<dyn Fn(RecognizerEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Type alias for recognizer error callback
pub type RecognizerErrorCallback =
    Arc<dyn Fn(RecognizerError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Configuration for recognizer providers
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct RecognizerConfig {
    /// API key for the recognition provider
    pub api_key: String,
    pub language: String,
    pub model: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: String,
    /// Emit partial hypotheses while the user is still speaking
    pub interim_results: bool,
    /// Silence in milliseconds before the provider emits UtteranceEnd
    pub utterance_end_ms: u32,
    /// Provider-side endpointing window in milliseconds
    pub endpointing_ms: u32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: "en-US".to_string(),
            model: "nova-2".to_string(),
            sample_rate: 16000,
            channels: 1,
            encoding: "linear16".to_string(),
            interim_results: true,
            utterance_end_ms: 1000,
            endpointing_ms: 300,
        }
    }
}

/// Base trait for streaming speech recognizers
#[async_trait::async_trait]
pub trait BaseRecognizer: Send + Sync {
    /// Create a new instance with the given configuration
    fn new(config: RecognizerConfig) -> Result<Self, RecognizerError>
    where
        Self: Sized;

    /// Open the streaming connection to the provider
    async fn connect(&mut self) -> Result<(), RecognizerError>;

    /// Close the streaming connection
    async fn disconnect(&mut self) -> Result<(), RecognizerError>;

    /// Whether the connection is ready to accept audio
    fn is_ready(&self) -> bool;

    /// Stream a chunk of audio to the provider
    async fn send_audio(&mut self, audio_data: Vec<u8>) -> Result<(), RecognizerError>;

    /// Register the callback for transcript and utterance-end events.
    /// Must be set before `connect`.
    async fn on_event(&mut self, callback: RecognizerEventCallback) -> Result<(), RecognizerError>;

    /// Register the callback for streaming errors that occur after connect
    async fn on_error(&mut self, callback: RecognizerErrorCallback)
        -> Result<(), RecognizerError>;

    /// Get provider-specific information
    fn get_provider_info(&self) -> &'static str;
}

/// Create a recognizer for the named provider
pub fn create_recognizer(
    provider: &str,
    config: RecognizerConfig,
) -> Result<Box<dyn BaseRecognizer>, RecognizerError> {
    match provider.to_lowercase().as_str() {
        "deepgram" => Ok(Box::new(DeepgramRecognizer::new(config)?)),
        other => Err(RecognizerError::ConfigurationError(format!(
            "Unsupported recognizer provider: {other}"
        ))),
    }
}
