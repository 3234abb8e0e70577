//! Anthropic Messages API debate engine.
//!
//! Each user argument is sent with the full conversation history and a
//! `score_argument` tool the model is instructed to call. When the model
//! stops on tool use, the scores are read from the tool input and a
//! follow-up request with the tool result produces the remainder of the
//! spoken reply.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{EngineError, TurnOutcome, TurnProcessor};
use crate::core::session::ArgumentScores;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-3-haiku-20240307";
const MAX_TOKENS: u32 = 300;

/// Debate engine backed by the Anthropic Messages API.
pub struct AnthropicEngine {
    client: reqwest::Client,
    api_key: String,
    system_prompt: String,
    history: Mutex<Vec<Value>>,
}

impl AnthropicEngine {
    pub fn new(api_key: String, system_prompt: String) -> Result<Self, EngineError> {
        if api_key.is_empty() {
            return Err(EngineError::ConfigurationError(
                "Anthropic API key is required".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            system_prompt,
            history: Mutex::new(Vec::new()),
        })
    }

    fn scoring_tool() -> Value {
        json!({
            "name": "score_argument",
            "description": "Score the user's debate argument on three dimensions",
            "input_schema": {
                "type": "object",
                "properties": {
                    "clarity": {
                        "type": "number",
                        "description": "How clear and understandable the argument is (1-10)"
                    },
                    "argument_strength": {
                        "type": "number",
                        "description": "How logically sound and well-supported the argument is (1-10)"
                    },
                    "rhetoric": {
                        "type": "number",
                        "description": "How persuasive and well-delivered the argument is (1-10)"
                    },
                    "feedback": {
                        "type": "string",
                        "description": "One short sentence of feedback on the argument"
                    }
                },
                "required": ["clarity", "argument_strength", "rhetoric"]
            }
        })
    }

    async fn request(&self, messages: &[Value]) -> Result<Value, EngineError> {
        let body = json!({
            "model": MODEL,
            "max_tokens": MAX_TOKENS,
            "system": self.system_prompt,
            "tools": [Self::scoring_tool()],
            "messages": messages,
        });

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(EngineError::AuthenticationFailed(format!(
                "Anthropic API returned {status}"
            )));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EngineError::ProviderError(format!(
                "Anthropic API returned {status}: {detail}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl TurnProcessor for AnthropicEngine {
    async fn process_argument(&self, text: &str) -> Result<TurnOutcome, EngineError> {
        let mut history = self.history.lock().await;
        history.push(json!({ "role": "user", "content": text }));

        let response = self.request(&history).await?;
        let content = content_blocks(&response)?;
        let (mut reply, scores, feedback) = extract_outcome(content);

        if scores.is_none() {
            warn!("Model response contained no score_argument call");
        }

        if response["stop_reason"] == "tool_use" {
            // Echo the tool call back with its result so the model finishes
            // the spoken reply it was interrupted in.
            history.push(json!({ "role": "assistant", "content": content }));
            let tool_use_id = content
                .iter()
                .find(|block| block["type"] == "tool_use")
                .and_then(|block| block["id"].as_str())
                .ok_or_else(|| {
                    EngineError::InvalidResponse("tool_use stop without tool_use block".to_string())
                })?;
            history.push(json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": tool_use_id,
                    "content": "Scores recorded. Continue your response."
                }]
            }));

            let follow_up = self.request(&history).await?;
            let (continuation, _, _) = extract_outcome(content_blocks(&follow_up)?);
            if !continuation.is_empty() {
                if !reply.is_empty() {
                    reply.push(' ');
                }
                reply.push_str(&continuation);
            }
        }

        if reply.is_empty() {
            reply = "Interesting point. Tell me more.".to_string();
        }
        history.push(json!({ "role": "assistant", "content": reply }));
        debug!("Engine turn complete: {} chars, scored={}", reply.len(), scores.is_some());

        Ok(TurnOutcome {
            reply,
            scores,
            feedback,
        })
    }

    fn get_provider_info(&self) -> &'static str {
        "Anthropic Messages API (claude-3-haiku)"
    }
}

fn content_blocks(response: &Value) -> Result<&Vec<Value>, EngineError> {
    response["content"]
        .as_array()
        .ok_or_else(|| EngineError::InvalidResponse("response missing content array".to_string()))
}

/// Walk the content blocks collecting text and the scoring tool call.
fn extract_outcome(content: &[Value]) -> (String, Option<ArgumentScores>, Option<String>) {
    let mut reply = String::new();
    let mut scores = None;
    let mut feedback = None;

    for block in content {
        match block["type"].as_str() {
            Some("text") => {
                if let Some(text) = block["text"].as_str() {
                    let text = text.trim();
                    if !text.is_empty() {
                        if !reply.is_empty() {
                            reply.push(' ');
                        }
                        reply.push_str(text);
                    }
                }
            }
            Some("tool_use") if block["name"] == "score_argument" => {
                let input = &block["input"];
                if let (Some(clarity), Some(strength), Some(rhetoric)) = (
                    input["clarity"].as_f64(),
                    input["argument_strength"].as_f64(),
                    input["rhetoric"].as_f64(),
                ) {
                    scores = Some(
                        ArgumentScores {
                            clarity,
                            argument_strength: strength,
                            rhetoric,
                        }
                        .clamped(),
                    );
                }
                feedback = input["feedback"].as_str().map(str::to_string);
            }
            _ => {}
        }
    }

    (reply, scores, feedback)
}
