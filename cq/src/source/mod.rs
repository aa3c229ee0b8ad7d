//! Content sources for template leaves
//!
//! A [`Source`] produces the content of one message when its leaf executes.
//! Sources read the session but never change it; all state flows through the
//! engine. The closed set of implementations covers fixed text, model
//! completions, and the three remote (MCP-shaped) acquisition paths.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::model::ModelError;
use crate::session::{Session, ToolCall};

mod model;
mod remote;
mod text;

pub use model::ModelSource;
pub use remote::{RemotePromptSource, RemoteResourceSource, RemoteToolSource};
pub use text::StringSource;

/// What a source produced for one leaf execution
#[derive(Debug, Clone, Default)]
pub struct SourceOutput {
    /// Message text
    pub content: String,

    /// Structured payload extracted from the content, when requested
    pub structured: Option<Value>,

    /// Tool calls requested alongside the content (model sources only)
    pub tool_calls: Vec<ToolCall>,
}

impl SourceOutput {
    /// Plain text output with no calls and no structured payload
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), structured: None, tool_calls: Vec::new() }
    }
}

/// Errors a source can fail with
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("remote call failed: {0}")]
    Remote(#[from] mcplink::ClientError),

    #[error("template render failed: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("source produced no usable content: {reason}")]
    Empty { reason: String },
}

/// Produces the content of one message
#[async_trait]
pub trait Source: Send + Sync {
    /// Produce content for the current session
    async fn content(&self, session: &Session) -> Result<SourceOutput, SourceError>;
}

#[async_trait]
impl<T: Source + ?Sized> Source for Arc<T> {
    async fn content(&self, session: &Session) -> Result<SourceOutput, SourceError> {
        (**self).content(session).await
    }
}
