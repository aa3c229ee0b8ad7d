//! Tool error types

use thiserror::Error;

/// Errors a tool execution can fail with
///
/// These never escape the dispatcher: they become error tool results in the
/// transcript so the model can react to them.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("remote call failed: {0}")]
    Remote(#[from] mcplink::ClientError),

    #[error("{0}")]
    Failed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
