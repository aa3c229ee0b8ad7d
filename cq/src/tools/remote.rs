//! Remote tool adapter
//!
//! Wraps one tool reported by an MCP server so it can live in a
//! [`ToolRegistry`](super::ToolRegistry) next to local tools.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::{Tool, ToolError};

/// A registry entry backed by a connected MCP server
pub struct RemoteTool {
    client: Arc<mcplink::Client>,
    name: String,
    description: String,
    input_schema: Value,
}

impl RemoteTool {
    /// Wrap a listed server tool
    pub fn new(client: Arc<mcplink::Client>, info: mcplink::ToolInfo) -> Self {
        debug!(name = %info.name, "RemoteTool::new: called");
        let description =
            info.description.unwrap_or_else(|| format!("Remote tool '{}'", info.name));
        Self { client, name: info.name, description, input_schema: info.input_schema }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        debug!(name = %self.name, "RemoteTool::execute: called");
        let result = self.client.call_tool(&self.name, args).await?;
        if result.is_error {
            return Err(ToolError::Failed(result.text()));
        }
        Ok(Value::String(result.text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcplink::test_support::StaticTransport;
    use mcplink::ToolInfo;
    use serde_json::json;

    fn tool_info(name: &str) -> ToolInfo {
        serde_json::from_value(json!({ "name": name })).unwrap()
    }

    #[tokio::test]
    async fn test_execute_returns_text_as_string_value() {
        let transport = StaticTransport::new("srv");
        transport.route("tools/call", json!({ "content": [{ "type": "text", "text": "42" }] }));
        let client = Arc::new(mcplink::Client::new(Box::new(transport.clone())));
        client.connect().await.unwrap();

        let tool = RemoteTool::new(client, tool_info("answer"));
        let value = tool.execute(json!({})).await.unwrap();

        assert_eq!(value, Value::String("42".to_string()));
    }

    #[tokio::test]
    async fn test_server_side_failure_becomes_tool_error() {
        let transport = StaticTransport::new("srv");
        transport.route(
            "tools/call",
            json!({ "content": [{ "type": "text", "text": "no such row" }], "isError": true }),
        );
        let client = Arc::new(mcplink::Client::new(Box::new(transport.clone())));
        client.connect().await.unwrap();

        let tool = RemoteTool::new(client, tool_info("lookup"));
        let err = tool.execute(json!({})).await.unwrap_err();

        match err {
            ToolError::Failed(message) => assert_eq!(message, "no such row"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disconnected_client_surfaces_remote_error() {
        let transport = StaticTransport::new("srv");
        let client = Arc::new(mcplink::Client::new(Box::new(transport.clone())));

        let tool = RemoteTool::new(client, tool_info("lookup"));
        let err = tool.execute(json!({})).await.unwrap_err();

        assert!(matches!(err, ToolError::Remote(_)));
    }

    #[test]
    fn test_description_defaults_when_server_omits_it() {
        let transport = StaticTransport::new("srv");
        let client = Arc::new(mcplink::Client::new(Box::new(transport)));

        let tool = RemoteTool::new(client, tool_info("fetch"));

        assert_eq!(tool.description(), "Remote tool 'fetch'");
        assert_eq!(tool.input_schema(), json!({ "type": "object" }));
    }
}
