//! Sources backed by a remote MCP-shaped server

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::{Source, SourceError, SourceOutput};
use crate::session::Session;

/// Source that calls one remote tool and uses its text output as content
pub struct RemoteToolSource {
    client: Arc<mcplink::Client>,
    tool: String,
    arguments: Value,
}

impl RemoteToolSource {
    pub fn new(client: Arc<mcplink::Client>, tool: impl Into<String>, arguments: Value) -> Self {
        let tool = tool.into();
        debug!(%tool, "RemoteToolSource::new: called");
        Self { client, tool, arguments }
    }
}

#[async_trait]
impl Source for RemoteToolSource {
    async fn content(&self, _session: &Session) -> Result<SourceOutput, SourceError> {
        debug!(tool = %self.tool, "RemoteToolSource::content: called");
        let result = self.client.call_tool(&self.tool, self.arguments.clone()).await?;
        if result.is_error {
            return Err(SourceError::Empty {
                reason: format!("remote tool '{}' reported failure: {}", self.tool, result.text()),
            });
        }
        let text = result.text();
        if text.is_empty() {
            return Err(SourceError::Empty {
                reason: format!("remote tool '{}' returned no text content", self.tool),
            });
        }
        Ok(SourceOutput::text(text))
    }
}

/// Source that reads one remote resource and uses its text as content
pub struct RemoteResourceSource {
    client: Arc<mcplink::Client>,
    uri: String,
}

impl RemoteResourceSource {
    pub fn new(client: Arc<mcplink::Client>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        debug!(%uri, "RemoteResourceSource::new: called");
        Self { client, uri }
    }
}

#[async_trait]
impl Source for RemoteResourceSource {
    async fn content(&self, _session: &Session) -> Result<SourceOutput, SourceError> {
        debug!(uri = %self.uri, "RemoteResourceSource::content: called");
        let contents = self.client.read_resource(&self.uri).await?;
        let text = contents.text();
        if text.is_empty() {
            return Err(SourceError::Empty {
                reason: format!("resource '{}' has no text content", self.uri),
            });
        }
        Ok(SourceOutput::text(text))
    }
}

/// Source that fetches a remote prompt and flattens it to text
///
/// The server returns a small conversation; it is flattened to role-prefixed
/// lines because a leaf produces exactly one message.
pub struct RemotePromptSource {
    client: Arc<mcplink::Client>,
    prompt: String,
    arguments: Value,
}

impl RemotePromptSource {
    pub fn new(client: Arc<mcplink::Client>, prompt: impl Into<String>, arguments: Value) -> Self {
        let prompt = prompt.into();
        debug!(%prompt, "RemotePromptSource::new: called");
        Self { client, prompt, arguments }
    }
}

#[async_trait]
impl Source for RemotePromptSource {
    async fn content(&self, _session: &Session) -> Result<SourceOutput, SourceError> {
        debug!(prompt = %self.prompt, "RemotePromptSource::content: called");
        let result = self.client.get_prompt(&self.prompt, self.arguments.clone()).await?;
        let text = result
            .messages
            .iter()
            .filter_map(|m| m.content.text.as_deref().map(|t| format!("{}: {}", m.role, t)))
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return Err(SourceError::Empty {
                reason: format!("prompt '{}' rendered no text messages", self.prompt),
            });
        }
        Ok(SourceOutput::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcplink::test_support::StaticTransport;
    use serde_json::json;

    async fn connected_client(transport: &StaticTransport) -> Arc<mcplink::Client> {
        let client = Arc::new(mcplink::Client::new(Box::new(transport.clone())));
        client.connect().await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_remote_tool_source_flattens_text() {
        let transport = StaticTransport::new("srv");
        transport.route(
            "tools/call",
            json!({ "content": [
                { "type": "text", "text": "first" },
                { "type": "text", "text": "second" }
            ]}),
        );
        let client = connected_client(&transport).await;

        let source = RemoteToolSource::new(client, "fetch", json!({ "id": 7 }));
        let output = source.content(&Session::new()).await.unwrap();

        assert_eq!(output.content, "first\nsecond");
        let (method, params) = transport.requests().pop().unwrap();
        assert_eq!(method, "tools/call");
        assert_eq!(params["arguments"]["id"], 7);
    }

    #[tokio::test]
    async fn test_remote_tool_failure_result_is_empty_error() {
        let transport = StaticTransport::new("srv");
        transport.route(
            "tools/call",
            json!({ "content": [{ "type": "text", "text": "boom" }], "isError": true }),
        );
        let client = connected_client(&transport).await;

        let source = RemoteToolSource::new(client, "fetch", json!({}));
        let err = source.content(&Session::new()).await.unwrap_err();

        assert!(matches!(err, SourceError::Empty { .. }));
    }

    #[tokio::test]
    async fn test_remote_source_before_connect_is_remote_error() {
        let transport = StaticTransport::new("srv");
        let client = Arc::new(mcplink::Client::new(Box::new(transport.clone())));

        let source = RemoteResourceSource::new(client, "doc://readme");
        let err = source.content(&Session::new()).await.unwrap_err();

        match err {
            SourceError::Remote(inner) => assert!(inner.is_not_connected()),
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remote_resource_source_reads_text() {
        let transport = StaticTransport::new("srv");
        transport.route(
            "resources/read",
            json!({ "contents": [{ "uri": "doc://readme", "text": "# Title" }] }),
        );
        let client = connected_client(&transport).await;

        let source = RemoteResourceSource::new(client, "doc://readme");
        let output = source.content(&Session::new()).await.unwrap();

        assert_eq!(output.content, "# Title");
    }

    #[tokio::test]
    async fn test_remote_prompt_source_prefixes_roles() {
        let transport = StaticTransport::new("srv");
        transport.route(
            "prompts/get",
            json!({ "messages": [
                { "role": "user", "content": { "type": "text", "text": "review this" } },
                { "role": "assistant", "content": { "type": "text", "text": "gladly" } }
            ]}),
        );
        let client = connected_client(&transport).await;

        let source = RemotePromptSource::new(client, "review", json!({}));
        let output = source.content(&Session::new()).await.unwrap();

        assert_eq!(output.content, "user: review this\nassistant: gladly");
    }

    #[tokio::test]
    async fn test_remote_prompt_without_messages_is_empty_error() {
        let transport = StaticTransport::new("srv");
        transport.route("prompts/get", json!({ "messages": [] }));
        let client = connected_client(&transport).await;

        let source = RemotePromptSource::new(client, "review", json!({}));
        let err = source.content(&Session::new()).await.unwrap_err();

        assert!(matches!(err, SourceError::Empty { .. }));
    }
}
