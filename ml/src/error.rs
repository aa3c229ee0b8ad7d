//! Client error types

use thiserror::Error;

use crate::transport::TransportError;

/// Errors returned by [`Client`](crate::Client) methods
#[derive(Debug, Error)]
pub enum ClientError {
    /// A protocol method was called before `connect()` completed
    #[error("not connected: call connect() before issuing requests")]
    NotConnected,

    /// `connect()` was called on a client that already finished its handshake
    #[error("already connected to '{server}'")]
    AlreadyConnected {
        /// Name of the server the client is connected to
        server: String,
    },

    /// The server rejected a request with a JSON-RPC error object
    #[error("server rejected {method}: {message} (code {code})")]
    Rpc {
        /// Protocol method that failed, e.g. "tools/call"
        method: String,
        /// JSON-RPC error code
        code: i64,
        /// JSON-RPC error message
        message: String,
    },

    /// The server answered with JSON that does not match the expected shape
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The wire failed underneath the protocol
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// True for the connection-gate error
    pub fn is_not_connected(&self) -> bool {
        matches!(self, ClientError::NotConnected)
    }

    /// JSON-RPC error code, when the server rejected the request
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            ClientError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}
