//! Model completion source

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{Source, SourceError, SourceOutput};
use crate::model::{CompletionRequest, DEFAULT_MAX_TOKENS, ModelClient, ToolDefinition};
use crate::session::{Role, Session};
use crate::validate::extract_json;

/// Source that asks a model for the next turn
///
/// The whole session travels in every request: system messages become the
/// system prompt, everything else becomes the conversation transcript. Tools
/// listed here are advertised to the model; executing the calls it makes is
/// the engine's job, not the source's.
pub struct ModelSource {
    client: Arc<dyn ModelClient>,
    tools: Vec<ToolDefinition>,
    max_tokens: Option<u32>,
    parse_structured: bool,
}

impl ModelSource {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        debug!("ModelSource::new: called");
        Self { client, tools: Vec::new(), max_tokens: None, parse_structured: false }
    }

    /// Advertise these tools to the model
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        debug!(tool_count = tools.len(), "ModelSource::with_tools: called");
        self.tools = tools;
        self
    }

    /// Override the per-request output token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Also attempt to extract a JSON payload from the reply
    pub fn structured(mut self) -> Self {
        self.parse_structured = true;
        self
    }

    fn build_request(&self, session: &Session) -> CompletionRequest {
        let system_prompt = session
            .messages_by_role(Role::System)
            .iter()
            .map(|m| m.content())
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = session
            .messages
            .iter()
            .filter(|m| !m.has_role(Role::System))
            .cloned()
            .collect();

        CompletionRequest {
            system_prompt,
            messages,
            tools: self.tools.clone(),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }
}

#[async_trait]
impl Source for ModelSource {
    async fn content(&self, session: &Session) -> Result<SourceOutput, SourceError> {
        debug!(message_count = session.messages.len(), "ModelSource::content: called");
        let request = self.build_request(session);
        let response = self.client.complete(request).await?;

        let content = response.content.unwrap_or_default();
        if content.is_empty() && response.tool_calls.is_empty() {
            return Err(SourceError::Empty {
                reason: "model returned neither text nor tool calls".to_string(),
            });
        }

        let structured = if self.parse_structured { extract_json(&content) } else { None };

        Ok(SourceOutput { content, structured, tool_calls: response.tool_calls })
    }
}
