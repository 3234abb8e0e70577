//! Speech synthesis providers.

pub mod deepgram;

use async_trait::async_trait;
use bytes::Bytes;

pub use deepgram::DeepgramSynthesizer;

/// Error types for synthesis operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Configuration for synthesis providers
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SynthConfig {
    /// API key for the synthesis provider
    pub api_key: String,
    /// Voice to synthesize with
    pub voice: String,
    /// Output encoding
    pub encoding: String,
    /// Output sample rate in Hz
    pub sample_rate: u32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice: "aura-zeus-en".to_string(),
            encoding: "linear16".to_string(),
            sample_rate: 24000,
        }
    }
}

/// Base trait for speech synthesis providers
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize the full text into one audio buffer
    async fn synthesize(&self, text: &str) -> Result<Bytes, SynthError>;

    /// Get provider-specific information
    fn get_provider_info(&self) -> &'static str;
}

/// Create a synthesizer for the named provider
pub fn create_synthesizer(
    provider: &str,
    config: SynthConfig,
) -> Result<Box<dyn Synthesizer>, SynthError> {
    match provider.to_lowercase().as_str() {
        "deepgram" => Ok(Box::new(DeepgramSynthesizer::new(config)?)),
        other => Err(SynthError::InvalidConfiguration(format!(
            "Unsupported synthesizer provider: {other}"
        ))),
    }
}
