//! Model client module
//!
//! Provides the provider-neutral completion contract and the Anthropic
//! adapter behind it.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
mod client;
mod error;
mod types;

pub use anthropic::AnthropicClient;
pub use client::ModelClient;
pub use error::ModelError;
pub use types::{
    CompletionRequest, CompletionResponse, DEFAULT_MAX_TOKENS, StopReason, TokenUsage, ToolDefinition,
};

use crate::config::ProviderConfig;

/// Create a model client for the provider named in config
pub fn create_client(config: &ProviderConfig) -> Result<Arc<dyn ModelClient>, ModelError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicClient::from_config(config)?)),
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(ModelError::InvalidResponse(format!(
                "Unknown model provider: '{}'. Supported: anthropic",
                other
            )))
        }
    }
}
