//! Anthropic Messages API client implementation
//!
//! Implements the ModelClient trait against the Messages API, including
//! tool_use / tool_result content blocks and bounded retry on transient
//! errors.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, ModelClient, ModelError, StopReason, TokenUsage};
use crate::config::ProviderConfig;
use crate::session::{Message, ToolCall};

/// Retries allowed on top of the first attempt
const MAX_RETRIES: u32 = 3;

/// Backoff before the first retry; doubles per retry after that
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Anthropic Messages API client
pub struct AnthropicClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a client from provider configuration
    ///
    /// Resolves the API key from the environment variable the config names.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ModelError> {
        debug!(model = %config.model, "AnthropicClient::from_config: called");
        let api_key = config
            .resolve_api_key()
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(ModelError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for the Messages API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens.min(self.max_tokens),
            "system": request.system_prompt,
            "messages": self.convert_messages(&request.messages),
        });

        if !request.tools.is_empty() {
            debug!(tool_count = request.tools.len(), "build_request_body: adding tools");
            body["tools"] = serde_json::json!(
                request
                    .tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "name": t.name,
                            "description": t.description,
                            "input_schema": t.input_schema,
                        })
                    })
                    .collect::<Vec<_>>()
            );
        }

        body
    }

    /// Convert transcript messages to Messages API format
    ///
    /// Tool results ride in user turns; consecutive results are merged into
    /// one turn so every tool_use id is answered in the directly following
    /// user message, as the API requires. System messages never appear here
    /// (the system prompt travels separately) and are skipped.
    fn convert_messages(&self, messages: &[Message]) -> Vec<serde_json::Value> {
        debug!(message_count = messages.len(), "convert_messages: called");
        let mut wire: Vec<serde_json::Value> = Vec::new();

        for message in messages {
            match message {
                Message::System { .. } => {
                    warn!("convert_messages: system message in transcript, skipping");
                }
                Message::User { content } => {
                    wire.push(serde_json::json!({ "role": "user", "content": content }));
                }
                Message::Assistant { content, tool_calls, .. } => {
                    let mut blocks = Vec::new();
                    if !content.is_empty() {
                        blocks.push(serde_json::json!({ "type": "text", "text": content }));
                    }
                    for call in tool_calls {
                        blocks.push(serde_json::json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments,
                        }));
                    }
                    if blocks.is_empty() {
                        warn!("convert_messages: empty assistant message, skipping");
                        continue;
                    }
                    wire.push(serde_json::json!({ "role": "assistant", "content": blocks }));
                }
                Message::ToolResult { content, tool_call_id, is_error } => {
                    let block = serde_json::json!({
                        "type": "tool_result",
                        "tool_use_id": tool_call_id,
                        "content": content,
                        "is_error": is_error,
                    });
                    match wire.last_mut().and_then(|last| {
                        (last["role"] == "user").then(|| last["content"].as_array_mut()).flatten()
                    }) {
                        Some(existing) => existing.push(block),
                        None => {
                            wire.push(serde_json::json!({ "role": "user", "content": [block] }));
                        }
                    }
                }
            }
        }

        wire
    }

    /// One round trip against the Messages API
    ///
    /// Classifies the outcome into [`ModelError`]; the retry loop in
    /// [`complete`](ModelClient::complete) decides what happens next.
    async fn send_once(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<CompletionResponse, ModelError> {
        let response = self
            .http
            .post(url)
            .header("x-api-key", self.api_key.clone())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            debug!(retry_after, "send_once: rate limited");
            return Err(ModelError::RateLimited { retry_after: Duration::from_secs(retry_after) });
        }

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status, "send_once: api error");
            return Err(ModelError::Api { status, message });
        }

        let api_response: AnthropicResponse = response.json().await?;
        Ok(self.parse_response(api_response))
    }

    /// Parse the Messages API response
    fn parse_response(&self, api_response: AnthropicResponse) -> CompletionResponse {
        debug!(stop_reason = %api_response.stop_reason, "parse_response: called");
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in api_response.content {
            match block {
                AnthropicContentBlock::Text { text: t } => text.push_str(&t),
                AnthropicContentBlock::ToolUse { id, name, input } => {
                    debug!(%id, %name, "parse_response: tool_use block");
                    tool_calls.push(ToolCall::with_id(id, name, input));
                }
            }
        }

        CompletionResponse {
            content: if text.is_empty() { None } else { Some(text) },
            tool_calls,
            stop_reason: StopReason::from_anthropic(&api_response.stop_reason),
            usage: TokenUsage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
                cache_read_tokens: api_response.usage.cache_read_input_tokens.unwrap_or(0),
                cache_creation_tokens: api_response.usage.cache_creation_input_tokens.unwrap_or(0),
            },
        }
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    /// Bounded-retry wrapper around [`send_once`](AnthropicClient::send_once)
    ///
    /// Transient failures back off exponentially. A 429 is returned to the
    /// caller right away: the provider named its own backoff and a blind
    /// sleep here would fight it.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request_body(&request);

        let mut attempt = 0;
        loop {
            match self.send_once(&url, &body).await {
                Ok(response) => {
                    debug!(attempt, "complete: success");
                    return Ok(response);
                }
                Err(e) if e.retry_after().is_some() => return Err(e),
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                    warn!(attempt, backoff_ms = backoff, error = %e, "complete: transient failure, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// Anthropic API response types

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: String,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { id: String, name: String, input: serde_json::Value },
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
    cache_read_input_tokens: Option<u64>,
    cache_creation_input_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolDefinition;

    fn test_client(max_tokens: u32) -> AnthropicClient {
        AnthropicClient {
            model: "claude-sonnet-4".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            http: Client::new(),
            max_tokens,
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = test_client(8192);
        let request = CompletionRequest {
            system_prompt: "You are helpful".to_string(),
            messages: vec![Message::user("Hello")],
            tools: vec![],
            max_tokens: 1000,
        };

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "claude-sonnet-4");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["system"], "You are helpful");
        assert!(body["messages"].is_array());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_body_with_tools() {
        let client = test_client(8192);
        let request = CompletionRequest {
            system_prompt: "You are helpful".to_string(),
            messages: vec![Message::user("Calculate something")],
            tools: vec![ToolDefinition::new(
                "calculate",
                "Evaluate arithmetic",
                serde_json::json!({
                    "type": "object",
                    "properties": { "expression": { "type": "string" } }
                }),
            )],
            max_tokens: 1000,
        };

        let body = client.build_request_body(&request);

        assert!(body["tools"].is_array());
        assert_eq!(body["tools"][0]["name"], "calculate");
    }

    #[test]
    fn test_max_tokens_capped_by_client() {
        let client = test_client(1000);
        let request = CompletionRequest {
            system_prompt: "Test".to_string(),
            messages: vec![],
            tools: vec![],
            max_tokens: 5000,
        };

        let body = client.build_request_body(&request);

        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_convert_messages_merges_consecutive_tool_results() {
        let client = test_client(8192);
        let calls = vec![
            ToolCall::with_id("c1", "calculate", serde_json::json!({ "expression": "5+3" })),
            ToolCall::with_id("c2", "calculate", serde_json::json!({ "expression": "2*2" })),
        ];
        let messages = vec![
            Message::user("compute"),
            Message::assistant_with_calls("working on it", calls),
            Message::tool_result("c1", "8"),
            Message::tool_result("c2", "4"),
        ];

        let wire = client.convert_messages(&messages);

        assert_eq!(wire.len(), 3, "two results should share one user turn");
        assert_eq!(wire[1]["role"], "assistant");
        assert_eq!(wire[1]["content"][0]["type"], "text");
        assert_eq!(wire[1]["content"][1]["type"], "tool_use");
        assert_eq!(wire[2]["role"], "user");
        assert_eq!(wire[2]["content"][0]["tool_use_id"], "c1");
        assert_eq!(wire[2]["content"][1]["tool_use_id"], "c2");
    }

    #[test]
    fn test_convert_messages_skips_system() {
        let client = test_client(8192);
        let messages = vec![Message::system("rules"), Message::user("hi")];

        let wire = client.convert_messages(&messages);

        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0]["role"], "user");
    }

    #[test]
    fn test_parse_response_collects_text_and_calls() {
        let client = test_client(8192);
        let api_response = AnthropicResponse {
            content: vec![
                AnthropicContentBlock::Text { text: "Let me check".to_string() },
                AnthropicContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "calculate".to_string(),
                    input: serde_json::json!({ "expression": "5+3" }),
                },
            ],
            stop_reason: "tool_use".to_string(),
            usage: AnthropicUsage {
                input_tokens: 10,
                output_tokens: 20,
                cache_read_input_tokens: None,
                cache_creation_input_tokens: None,
            },
        };

        let response = client.parse_response(api_response);

        assert_eq!(response.content.as_deref(), Some("Let me check"));
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "toolu_1");
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.usage.total(), 30);
    }
}
