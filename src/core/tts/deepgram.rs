//! Deepgram speech synthesis over the REST `/v1/speak` endpoint.
//!
//! Synthesis is request/response: the whole reply is converted in one call
//! and the raw audio bytes come back in the body. Pacing the audio out to
//! the client is the playback manager's job.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use url::Url;

use super::{SynthConfig, SynthError, Synthesizer};

const SPEAK_URL: &str = "https://api.deepgram.com/v1/speak";

/// Deepgram REST synthesis client
pub struct DeepgramSynthesizer {
    client: reqwest::Client,
    config: SynthConfig,
}

impl DeepgramSynthesizer {
    pub fn new(config: SynthConfig) -> Result<Self, SynthError> {
        if config.api_key.is_empty() {
            return Err(SynthError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    fn build_url(config: &SynthConfig) -> Result<String, SynthError> {
        let mut url = Url::parse(SPEAK_URL)
            .map_err(|e| SynthError::InvalidConfiguration(format!("Invalid URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("model", &config.voice)
            .append_pair("encoding", &config.encoding)
            .append_pair("sample_rate", &config.sample_rate.to_string());
        Ok(url.to_string())
    }
}

#[async_trait]
impl Synthesizer for DeepgramSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Bytes, SynthError> {
        let url = Self::build_url(&self.config)?;

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| SynthError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SynthError::AuthenticationFailed(format!(
                "Deepgram returned {status}"
            )));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SynthError::AudioGenerationFailed(format!(
                "Deepgram returned {status}: {detail}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthError::NetworkError(e.to_string()))?;
        debug!("Synthesized {} chars into {} bytes", text.len(), audio.len());
        Ok(audio)
    }

    fn get_provider_info(&self) -> &'static str {
        "Deepgram speak v1"
    }
}
