//! Transport abstraction for MCP connections
//!
//! A transport moves JSON-RPC requests and notifications between the client
//! and one server. Implementations own framing and the wire (child-process
//! stdio, HTTP, an in-process fake); [`Client`](crate::Client) owns method
//! names, parameter shapes, and connection state.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by a transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered the request with a JSON-RPC error object
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The connection is gone and no further traffic is possible
    #[error("transport closed")]
    Closed,

    /// The wire failed underneath the protocol
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),

    /// The server sent bytes that do not parse as a JSON-RPC frame
    #[error("malformed frame: {0}")]
    Malformed(String),
}

impl TransportError {
    /// True when the error carries a server-side JSON-RPC error object
    pub fn is_rpc(&self) -> bool {
        matches!(self, TransportError::Rpc { .. })
    }
}

/// One JSON-RPC connection to an MCP server
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for its result object.
    ///
    /// A JSON-RPC error response must surface as [`TransportError::Rpc`],
    /// never as a successful `Value`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError>;

    /// Send a fire-and-forget notification.
    async fn notify(&self, method: &str, params: Value) -> Result<(), TransportError>;

    /// Tear down the connection. Later calls fail with [`TransportError::Closed`].
    async fn close(&self) -> Result<(), TransportError>;
}
