//! Colloquy - Template-Driven Conversation Orchestration
//!
//! Colloquy runs model conversations from declarative templates. A
//! [`Template`] describes the shape of a conversation: which turns happen,
//! in what order, under which conditions, and how often. The [`Engine`]
//! interprets that shape against an immutable [`Session`], deriving a new
//! session at every step and leaving each intermediate state intact.
//!
//! # Core Concepts
//!
//! - **Templates are data**: control flow (sequence, conditional, loop,
//!   subroutine) is declared, not coded, so conversation shapes compose
//! - **Sessions are values**: every step derives a fresh session; retries
//!   and branches never fight over shared state
//! - **Grounded completion**: loops end on host predicates over the session
//!   or on explicit `check_goal` reports, not on prose claims
//! - **Soft tool failures**: a failing tool becomes an error result the
//!   model can react to; only an unknown tool halts execution
//!
//! # Modules
//!
//! - [`config`] - Engine configuration types and loading
//! - [`engine`] - Template executor and error taxonomy
//! - [`model`] - Model client trait and Anthropic implementation
//! - [`session`] - Immutable conversation state
//! - [`source`] - Content sources for template leaves
//! - [`template`] - Composable control-flow templates
//! - [`tools`] - Tool registry and dispatch
//! - [`validate`] - Content validation for template leaves

pub mod config;
pub mod engine;
pub mod model;
pub mod session;
pub mod source;
pub mod template;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
pub mod validate;

// Re-export commonly used types
pub use config::{EngineConfig, LimitsConfig, ProviderConfig};
pub use engine::{Engine, EngineError, ExecutionError};
pub use model::{
    AnthropicClient, CompletionRequest, CompletionResponse, DEFAULT_MAX_TOKENS, ModelClient,
    ModelError, StopReason, TokenUsage, ToolDefinition, create_client,
};
pub use session::{Message, Role, RoleTag, Session, ToolCall};
pub use source::{
    ModelSource, RemotePromptSource, RemoteResourceSource, RemoteToolSource, Source, SourceError,
    SourceOutput, StringSource,
};
pub use template::{ExhaustionPolicy, Predicate, Template, VarScope};
pub use tools::{
    GOAL_REPORT_KEY, GOAL_TOOL, GoalReport, GoalTool, RemoteTool, TOOL_CALLS_META, TOOLS_USED_VAR,
    Tool, ToolError, ToolRegistry, latest_report,
};
pub use validate::{FnValidator, SchemaValidator, Validation, Validator};
