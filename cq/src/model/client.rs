//! ModelClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, ModelError};

/// Stateless model client - each call is independent
///
/// This is the core abstraction for talking to a language model. The full
/// conversation travels in every request; no state is kept between calls, so
/// one client can serve any number of concurrent executions.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a single completion request and wait for the full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError>;
}
