//! Model request/response types
//!
//! Shaped after the Anthropic Messages API but provider-neutral: each
//! adapter owns the conversion to its own wire format.

use serde::Serialize;
use tracing::debug;

use crate::session::{Message, ToolCall};

/// Default per-request output budget when no override is given
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Everything needed for one model call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt framing the conversation
    pub system_prompt: String,

    /// Conversation turns, oldest first (no system messages)
    pub messages: Vec<Message>,

    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,

    /// Output token budget for this call
    pub max_tokens: u32,
}

/// What one model call produced
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content, `None` when the model produced none
    pub content: Option<String>,

    /// Tool calls the model wants made, in emission order
    pub tool_calls: Vec<ToolCall>,

    /// How the turn ended
    pub stop_reason: StopReason,

    /// Token accounting for this call
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain text response with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Reason the model ended its turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    /// Map the wire-level `stop_reason` string
    pub fn from_anthropic(s: &str) -> Self {
        debug!(%s, "StopReason::from_anthropic: called");
        match s {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            _ => {
                debug!("StopReason::from_anthropic: unrecognized, treating as EndTurn");
                StopReason::EndTurn
            }
        }
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
}

impl TokenUsage {
    /// Input plus output tokens
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Tool advertisement sent along with a request
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        let name = name.into();
        debug!(%name, "ToolDefinition::new: called");
        Self { name, description: description.into(), input_schema }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_from_anthropic() {
        assert_eq!(StopReason::from_anthropic("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_anthropic("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from_anthropic("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_anthropic("stop_sequence"), StopReason::StopSequence);
        assert_eq!(StopReason::from_anthropic("anything-else"), StopReason::EndTurn);
    }

    #[test]
    fn test_text_response_shape() {
        let response = CompletionResponse::text("hello");
        assert_eq!(response.content.as_deref(), Some("hello"));
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.stop_reason, StopReason::EndTurn);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage { input_tokens: 100, output_tokens: 25, ..Default::default() };
        assert_eq!(usage.total(), 125);
    }
}
