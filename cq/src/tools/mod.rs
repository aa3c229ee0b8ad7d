//! Tool registry and dispatch
//!
//! Tools are host-side capabilities the model can invoke from a leaf turn.
//! Each implements [`Tool`], lives in a [`ToolRegistry`], and is described
//! to the model by a JSON Schema. The dispatcher in this module runs the
//! calls an accepted assistant message carries and appends their results
//! to the session, one result per call, in order.
//!
//! One name is special: `check_goal` is the model's progress signal and is
//! handled before any registry lookup, so it works even in an empty
//! registry.

mod dispatch;
mod error;
mod goal;
mod registry;
mod remote;

use async_trait::async_trait;
use serde_json::Value;

pub use dispatch::{TOOL_CALLS_META, TOOLS_USED_VAR};
pub(crate) use dispatch::{DispatchResult, dispatch_tool_calls};
pub use error::ToolError;
pub use goal::{GOAL_REPORT_KEY, GOAL_TOOL, GoalReport, GoalTool, latest_report};
pub use registry::ToolRegistry;
pub use remote::RemoteTool;

/// A host-side capability the model can invoke
///
/// Implementations must be safe to call concurrently; the dispatcher runs
/// calls sequentially, but a registry may be shared across sessions.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model addresses this tool by
    fn name(&self) -> &str;

    /// Human-readable description, shown to the model
    fn description(&self) -> &str;

    /// JSON Schema for the arguments object
    fn input_schema(&self) -> Value;

    /// Run the tool against already-validated arguments
    ///
    /// Errors returned here become error results in the transcript; they
    /// do not abort the conversation.
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}
