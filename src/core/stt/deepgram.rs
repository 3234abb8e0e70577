//! Deepgram live transcription client.
//!
//! Streams audio over the `/v1/listen` WebSocket and forwards Results and
//! UtteranceEnd messages to the registered event callback. Endpointing and
//! utterance-end detection are delegated to the provider via query
//! parameters; turn-level debouncing happens downstream.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};
use url::Url;

use super::{
    BaseRecognizer, RecognizerConfig, RecognizerError, RecognizerErrorCallback, RecognizerEvent,
    RecognizerEventCallback,
};

const LISTEN_URL: &str = "wss://api.deepgram.com/v1/listen";

/// Connection state for the live transcription socket
#[derive(Debug, Clone, PartialEq)]
enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    #[serde(rename = "type")]
    response_type: String,
    channel: Option<ListenChannel>,
    is_final: Option<bool>,
    speech_final: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    transcript: String,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct ListenErrorResponse {
    #[serde(rename = "type")]
    error_type: String,
    description: String,
}

/// Deepgram live transcription WebSocket client
pub struct DeepgramRecognizer {
    config: RecognizerConfig,
    state: Arc<RwLock<ConnectionState>>,
    /// Sender feeding the socket task with outgoing audio frames
    ws_sender: Option<mpsc::UnboundedSender<Message>>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    event_callback: Option<RecognizerEventCallback>,
    error_callback: Option<RecognizerErrorCallback>,
    connection_handle: Option<tokio::task::JoinHandle<()>>,
}

impl DeepgramRecognizer {
    fn build_websocket_url(config: &RecognizerConfig) -> Result<String, RecognizerError> {
        let mut url = Url::parse(LISTEN_URL)
            .map_err(|e| RecognizerError::ConfigurationError(format!("Invalid URL: {e}")))?;

        {
            let mut query_pairs = url.query_pairs_mut();
            query_pairs.append_pair("model", &config.model);
            query_pairs.append_pair("language", &config.language);
            query_pairs.append_pair("encoding", &config.encoding);
            query_pairs.append_pair("sample_rate", &config.sample_rate.to_string());
            query_pairs.append_pair("channels", &config.channels.to_string());
            query_pairs.append_pair("punctuate", "true");
            query_pairs.append_pair("smart_format", "true");
            query_pairs.append_pair("interim_results", &config.interim_results.to_string());
            query_pairs.append_pair("vad_events", "true");
            query_pairs.append_pair("utterance_end_ms", &config.utterance_end_ms.to_string());
            query_pairs.append_pair("endpointing", &config.endpointing_ms.to_string());
        }

        Ok(url.to_string())
    }

    async fn start_connection(&mut self) -> Result<(), RecognizerError> {
        let ws_url = Self::build_websocket_url(&self.config)?;

        let (ws_tx, mut ws_rx) = mpsc::unbounded_channel::<Message>();
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        self.ws_sender = Some(ws_tx);
        self.shutdown_tx = Some(shutdown_tx);

        let state = self.state.clone();
        let event_callback = self.event_callback.clone();
        let error_callback = self.error_callback.clone();
        let api_key = self.config.api_key.clone();

        let connection_handle = tokio::spawn(async move {
            {
                let mut state_guard = state.write().await;
                *state_guard = ConnectionState::Connecting;
            }

            let request = match tokio_tungstenite::tungstenite::http::Request::builder()
                .uri(&ws_url)
                .header("Authorization", format!("token {api_key}"))
                .header("Sec-WebSocket-Protocol", "token")
                .body(())
            {
                Ok(request) => request,
                Err(e) => {
                    error!("Failed to build Deepgram request: {}", e);
                    let mut state_guard = state.write().await;
                    *state_guard = ConnectionState::Error(format!("Bad request: {e}"));
                    return;
                }
            };

            let (ws_stream, _) = match connect_async(request).await {
                Ok(result) => result,
                Err(e) => {
                    error!("Failed to connect to Deepgram: {}", e);
                    let mut state_guard = state.write().await;
                    *state_guard = ConnectionState::Error(format!("Connection failed: {e}"));
                    return;
                }
            };

            info!("Connected to Deepgram live transcription");
            {
                let mut state_guard = state.write().await;
                *state_guard = ConnectionState::Connected;
            }

            let (mut ws_sink, mut ws_stream) = ws_stream.split();

            loop {
                tokio::select! {
                    Some(message) = ws_rx.recv() => {
                        if let Err(e) = ws_sink.send(message).await {
                            error!("Failed to send audio frame: {}", e);
                            break;
                        }
                    }

                    message = ws_stream.next() => {
                        match message {
                            Some(Ok(msg)) => {
                                if let Err(e) = handle_message(
                                    msg,
                                    event_callback.as_ref(),
                                ).await {
                                    error!("Deepgram stream error: {}", e);
                                    if let Some(ref callback) = error_callback {
                                        callback(e).await;
                                    }
                                    break;
                                }
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error: {}", e);
                                if let Some(ref callback) = error_callback {
                                    callback(RecognizerError::NetworkError(e.to_string())).await;
                                }
                                break;
                            }
                            None => {
                                info!("Deepgram stream ended");
                                break;
                            }
                        }
                    }

                    _ = shutdown_rx.recv() => {
                        debug!("Recognizer shutdown signal received");
                        let _ = ws_sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            {
                let mut state_guard = state.write().await;
                *state_guard = ConnectionState::Disconnected;
            }
            info!("Deepgram connection closed");
        });

        self.connection_handle = Some(connection_handle);

        // Poll until the socket task reports a terminal state.
        let mut attempts = 0;
        while attempts < 50 {
            let state = self.state.read().await;
            match *state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Error(ref msg) => {
                    return Err(RecognizerError::ConnectionFailed(msg.clone()));
                }
                _ => {
                    drop(state);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    attempts += 1;
                }
            }
        }

        Err(RecognizerError::ConnectionFailed(
            "Connection timeout".to_string(),
        ))
    }
}

/// Dispatch one socket message to the event callback.
async fn handle_message(
    message: Message,
    callback: Option<&RecognizerEventCallback>,
) -> Result<(), RecognizerError> {
    match message {
        Message::Text(text) => {
            let response: ListenResponse = serde_json::from_str(&text)
                .map_err(|e| RecognizerError::ProviderError(format!("Bad response: {e}")))?;

            match response.response_type.as_str() {
                "Results" => {
                    let Some(alternative) = response
                        .channel
                        .as_ref()
                        .and_then(|channel| channel.alternatives.first())
                    else {
                        return Ok(());
                    };
                    let event = RecognizerEvent::Transcript {
                        text: alternative.transcript.clone(),
                        is_final: response.is_final.unwrap_or(false),
                        speech_final: response.speech_final.unwrap_or(false),
                        confidence: alternative.confidence,
                    };
                    if let Some(callback) = callback {
                        callback(event).await;
                    }
                }
                "UtteranceEnd" => {
                    debug!("UtteranceEnd received");
                    if let Some(callback) = callback {
                        callback(RecognizerEvent::UtteranceEnd).await;
                    }
                }
                "Metadata" | "SpeechStarted" => {}
                "Error" => {
                    let detail = serde_json::from_str::<ListenErrorResponse>(&text)
                        .map(|e| format!("{}: {}", e.error_type, e.description))
                        .unwrap_or_else(|_| "Unknown Deepgram error".to_string());
                    return Err(RecognizerError::ProviderError(detail));
                }
                other => warn!("Unknown Deepgram message type: {}", other),
            }
        }
        Message::Close(frame) => info!("Deepgram closed the connection: {:?}", frame),
        Message::Binary(_) => warn!("Unexpected binary message from Deepgram"),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
    }

    Ok(())
}

#[async_trait::async_trait]
impl BaseRecognizer for DeepgramRecognizer {
    fn new(config: RecognizerConfig) -> Result<Self, RecognizerError> {
        if config.api_key.is_empty() {
            return Err(RecognizerError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            ws_sender: None,
            shutdown_tx: None,
            event_callback: None,
            error_callback: None,
            connection_handle: None,
        })
    }

    async fn connect(&mut self) -> Result<(), RecognizerError> {
        self.start_connection().await?;
        info!("Deepgram recognizer ready");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), RecognizerError> {
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(());
        }

        if let Some(handle) = self.connection_handle.take() {
            let _ = timeout(Duration::from_secs(5), handle).await;
        }

        self.ws_sender = None;
        self.shutdown_tx = None;

        {
            let mut state = self.state.write().await;
            *state = ConnectionState::Disconnected;
        }

        info!("Disconnected from Deepgram");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ws_sender.is_some()
    }

    async fn send_audio(&mut self, audio_data: Vec<u8>) -> Result<(), RecognizerError> {
        let Some(ws_sender) = &self.ws_sender else {
            return Err(RecognizerError::ConnectionFailed(
                "Not connected to Deepgram".to_string(),
            ));
        };

        debug!("Streaming {} bytes of audio", audio_data.len());
        ws_sender
            .send(Message::Binary(audio_data.into()))
            .map_err(|e| RecognizerError::NetworkError(format!("Failed to send audio: {e}")))
    }

    async fn on_event(&mut self, callback: RecognizerEventCallback) -> Result<(), RecognizerError> {
        self.event_callback = Some(callback);
        Ok(())
    }

    async fn on_error(
        &mut self,
        callback: RecognizerErrorCallback,
    ) -> Result<(), RecognizerError> {
        self.error_callback = Some(callback);
        Ok(())
    }

    fn get_provider_info(&self) -> &'static str {
        "Deepgram live transcription v1"
    }
}

impl Drop for DeepgramRecognizer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(());
        }
    }
}
