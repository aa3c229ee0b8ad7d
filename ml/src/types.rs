//! Wire shapes for MCP requests and results
//!
//! Mirrors the camelCase JSON the protocol puts on the wire, keeping only the
//! fields callers consume. Unknown fields are ignored on deserialization so
//! servers can run ahead of this crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server identity reported during the initialize handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name, e.g. "filesystem"
    pub name: String,
    /// Server version string, empty when the server omits it
    #[serde(default)]
    pub version: String,
}

/// Payload of a successful `initialize` request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeResult {
    pub protocol_version: String,
    pub server_info: ServerInfo,
}

/// One block of content inside a tool result or prompt message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    /// Content discriminator, e.g. "text" or "image"
    #[serde(rename = "type")]
    pub kind: String,
    /// Text payload, present when `kind` is "text"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentPart {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self { kind: "text".to_string(), text: Some(text.into()) }
    }
}

/// Result of `tools/call`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content blocks produced by the tool
    #[serde(default)]
    pub content: Vec<ContentPart>,
    /// True when the tool ran but reported a domain failure
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Concatenate all text parts, one per line
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One chunk of a resource's contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceChunk {
    /// URI of the chunk, when the server echoes it back
    #[serde(default)]
    pub uri: Option<String>,
    /// MIME type, e.g. "text/plain"
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Text payload for textual resources
    #[serde(default)]
    pub text: Option<String>,
}

/// Result of `resources/read`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContents {
    /// Chunks in server order
    #[serde(default)]
    pub contents: Vec<ResourceChunk>,
}

impl ResourceContents {
    /// Concatenate the text of all chunks, one per line
    pub fn text(&self) -> String {
        self.contents
            .iter()
            .filter_map(|chunk| chunk.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One message of a rendered prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Speaker role, "user" or "assistant"
    pub role: String,
    /// Message content
    pub content: ContentPart,
}

/// Result of `prompts/get`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPromptResult {
    /// Human-readable prompt description
    #[serde(default)]
    pub description: Option<String>,
    /// Rendered messages in conversation order
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
}

/// One entry of `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    /// Tool name as the server expects it in `tools/call`
    pub name: String,
    /// What the tool does
    #[serde(default)]
    pub description: Option<String>,
    /// JSON Schema for the tool's arguments
    #[serde(default = "default_input_schema")]
    pub input_schema: Value,
}

fn default_input_schema() -> Value {
    serde_json::json!({ "type": "object" })
}

/// Payload of a successful `tools/list` request
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ToolsListResult {
    #[serde(default)]
    pub tools: Vec<ToolInfo>,
}
