//! Connection-gated MCP client
//!
//! Wraps a [`Transport`] with the protocol layer: the initialize handshake,
//! method names, parameter shapes, and typed results. All methods take
//! `&self`; the connection state lives behind an async mutex that `connect`
//! holds for the whole handshake, so concurrent connects serialize and the
//! other methods only peek at it.

use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::transport::{Transport, TransportError};
use crate::types::{
    CallToolResult, GetPromptResult, InitializeResult, ResourceContents, ServerInfo, ToolInfo,
    ToolsListResult,
};

/// Protocol revision sent in the initialize handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Client for one MCP server over an injected transport
///
/// A fresh client is disconnected. [`connect`](Client::connect) runs the
/// initialize handshake; until it completes, every protocol method fails with
/// [`ClientError::NotConnected`].
pub struct Client {
    transport: Box<dyn Transport>,
    /// `Some` between a successful connect and disconnect
    server: Mutex<Option<ServerInfo>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("server", &self.server).finish_non_exhaustive()
    }
}

impl Client {
    /// Create a disconnected client over the given transport
    pub fn new(transport: Box<dyn Transport>) -> Self {
        debug!("Client::new: called");
        Self { transport, server: Mutex::new(None) }
    }

    /// Run the initialize handshake and mark the client connected
    ///
    /// Sends `initialize`, validates the result shape, then sends the
    /// `notifications/initialized` notification. A protocol version mismatch
    /// is logged but tolerated. The connection slot stays locked for the
    /// whole handshake, so of two concurrent connects one wins and the other
    /// fails with [`ClientError::AlreadyConnected`].
    pub async fn connect(&self) -> Result<ServerInfo, ClientError> {
        debug!("Client::connect: called");
        // Held until the handshake is stored; a concurrent connect waits
        // here and then sees the winner's server info.
        let mut server = self.server.lock().await;
        if let Some(info) = server.as_ref() {
            return Err(ClientError::AlreadyConnected { server: info.name.clone() });
        }

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": "mcplink",
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {},
        });
        let result = self.request("initialize", params).await?;
        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| ClientError::Protocol(format!("bad initialize result: {e}")))?;

        if init.protocol_version != PROTOCOL_VERSION {
            warn!(
                server_version = %init.protocol_version,
                client_version = PROTOCOL_VERSION,
                "Client::connect: protocol version mismatch, continuing"
            );
        }

        self.transport.notify("notifications/initialized", json!({})).await?;

        info!(
            server = %init.server_info.name,
            version = %init.server_info.version,
            "connected to MCP server"
        );
        *server = Some(init.server_info.clone());
        Ok(init.server_info)
    }

    /// Close the transport and mark the client disconnected
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        debug!("Client::disconnect: called");
        let info = self.server.lock().await.take().ok_or(ClientError::NotConnected)?;
        self.transport.close().await?;
        info!(server = %info.name, "disconnected from MCP server");
        Ok(())
    }

    /// Identity of the connected server, `None` while disconnected
    pub async fn server_info(&self) -> Option<ServerInfo> {
        self.server.lock().await.clone()
    }

    /// True once `connect()` has completed and `disconnect()` has not
    pub async fn is_connected(&self) -> bool {
        self.server.lock().await.is_some()
    }

    /// Invoke a tool by name with JSON arguments
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ClientError> {
        debug!(%name, "Client::call_tool: called");
        self.ensure_connected().await?;
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| ClientError::Protocol(format!("bad tools/call result: {e}")))
    }

    /// Read the resource at `uri`
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContents, ClientError> {
        debug!(%uri, "Client::read_resource: called");
        self.ensure_connected().await?;
        let result = self.request("resources/read", json!({ "uri": uri })).await?;
        serde_json::from_value(result)
            .map_err(|e| ClientError::Protocol(format!("bad resources/read result: {e}")))
    }

    /// Fetch a rendered prompt by name with JSON arguments
    pub async fn get_prompt(&self, name: &str, arguments: Value) -> Result<GetPromptResult, ClientError> {
        debug!(%name, "Client::get_prompt: called");
        self.ensure_connected().await?;
        let result = self
            .request("prompts/get", json!({ "name": name, "arguments": arguments }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| ClientError::Protocol(format!("bad prompts/get result: {e}")))
    }

    /// List the tools the server exposes
    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>, ClientError> {
        debug!("Client::list_tools: called");
        self.ensure_connected().await?;
        let result = self.request("tools/list", json!({})).await?;
        let listed: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| ClientError::Protocol(format!("bad tools/list result: {e}")))?;
        debug!(count = listed.tools.len(), "Client::list_tools: got tools");
        Ok(listed.tools)
    }

    async fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.server.lock().await.is_none() {
            return Err(ClientError::NotConnected);
        }
        Ok(())
    }

    /// Issue a request, attaching the method name to server-side rejections
    async fn request(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        self.transport.request(method, params).await.map_err(|e| match e {
            TransportError::Rpc { code, message } => {
                ClientError::Rpc { method: method.to_string(), code, message }
            }
            other => ClientError::Transport(other),
        })
    }
}
