//! Message and tool-call types for conversation transcripts
//!
//! Messages are tagged by role on the wire (`{"role": "user", ...}`), which
//! keeps serialized sessions readable and lets providers map them directly
//! onto their own chat formats.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Speaker role a template leaf can produce
///
/// Tool results are not a speaker role: they are appended by the dispatcher
/// in response to assistant tool calls, never authored by a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Transcript tag of a stored message, tool results included
///
/// [`Role`] covers only what a leaf may author; filters over a transcript
/// range over this enum so dispatcher-appended tool results are selectable
/// too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTag {
    System,
    User,
    Assistant,
    ToolResult,
}

impl RoleTag {
    /// Tag string as it appears on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            RoleTag::System => "system",
            RoleTag::User => "user",
            RoleTag::Assistant => "assistant",
            RoleTag::ToolResult => "tool_result",
        }
    }
}

impl From<Role> for RoleTag {
    fn from(role: Role) -> Self {
        match role {
            Role::System => RoleTag::System,
            Role::User => RoleTag::User,
            Role::Assistant => RoleTag::Assistant,
        }
    }
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, echoed back in the matching tool result
    pub id: String,
    /// Tool name as registered
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call with a fresh id
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        let name = name.into();
        debug!(%name, "ToolCall::new: called");
        Self { id: Uuid::now_v7().to_string(), name, arguments }
    }

    /// Create a tool call with a caller-supplied id (provider-issued ids)
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self { id: id.into(), name: name.into(), arguments }
    }
}

/// One entry in a conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// Instruction framing the conversation
    System { content: String },

    /// Host- or user-authored turn
    User { content: String },

    /// Model-authored turn, possibly requesting tool calls
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        structured: Option<Value>,
    },

    /// Outcome of one tool call, paired by `tool_call_id`
    ToolResult {
        content: String,
        tool_call_id: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        debug!("Message::system: called");
        Message::System { content: content.into() }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Message::User { content: content.into() }
    }

    /// Create a plain assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Message::Assistant { content: content.into(), tool_calls: Vec::new(), structured: None }
    }

    /// Create an assistant message carrying tool calls
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        debug!(call_count = tool_calls.len(), "Message::assistant_with_calls: called");
        Message::Assistant { content: content.into(), tool_calls, structured: None }
    }

    /// Create a successful tool result for the given call id
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        debug!("Message::tool_result: called");
        Message::ToolResult { content: content.into(), tool_call_id: tool_call_id.into(), is_error: false }
    }

    /// Create a failed tool result for the given call id
    pub fn tool_error(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        debug!("Message::tool_error: called");
        Message::ToolResult { content: content.into(), tool_call_id: tool_call_id.into(), is_error: true }
    }

    /// Transcript tag of this message
    pub fn tag(&self) -> RoleTag {
        match self {
            Message::System { .. } => RoleTag::System,
            Message::User { .. } => RoleTag::User,
            Message::Assistant { .. } => RoleTag::Assistant,
            Message::ToolResult { .. } => RoleTag::ToolResult,
        }
    }

    /// Role tag of this message as it appears on the wire
    pub fn role_name(&self) -> &'static str {
        self.tag().as_str()
    }

    /// Text content of this message
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content, .. }
            | Message::ToolResult { content, .. } => content,
        }
    }

    /// Tool calls carried by this message (empty for non-assistant roles)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Structured payload parsed from this message, if any
    pub fn structured(&self) -> Option<&Value> {
        match self {
            Message::Assistant { structured, .. } => structured.as_ref(),
            _ => None,
        }
    }

    /// Call id this result answers, for tool-result messages
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Message::ToolResult { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }

    /// True when this message matches the given speaker role
    pub fn has_role(&self, role: Role) -> bool {
        self.tag() == RoleTag::from(role)
    }
}
