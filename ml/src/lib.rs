//! McpLink - transport-agnostic client for MCP-shaped servers
//!
//! Speaks the request/response shapes of the Model Context Protocol (tools,
//! resources, prompts) without owning a wire. The transport is injected as a
//! [`Transport`] object, so the same client drives stdio pipes, HTTP bridges,
//! or in-process fakes.
//!
//! # Architecture
//!
//! ```text
//! Client ──request("tools/call", {..})──▶ Transport ──frames──▶ server
//!   │                                        │
//!   ├─ connection gate (initialize handshake)│
//!   └─ typed results (CallToolResult, ...)  ◀┘
//! ```
//!
//! A fresh client is disconnected: every protocol method fails with
//! [`ClientError::NotConnected`] until [`Client::connect`] has completed the
//! initialize handshake and sent the `notifications/initialized` notification.
//!
//! # Example
//!
//! ```ignore
//! use mcplink::Client;
//!
//! let client = Client::new(transport);
//! let info = client.connect().await?;
//! println!("connected to {}", info.name);
//!
//! let result = client.call_tool("search", serde_json::json!({"query": "rust"})).await?;
//! println!("{}", result.text());
//! ```

pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod transport;
pub mod types;

pub use client::{Client, PROTOCOL_VERSION};
pub use error::ClientError;
pub use transport::{Transport, TransportError};
pub use types::{
    CallToolResult, ContentPart, GetPromptResult, PromptMessage, ResourceChunk, ResourceContents,
    ServerInfo, ToolInfo,
};
