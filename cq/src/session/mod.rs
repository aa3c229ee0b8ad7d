//! Immutable conversation state
//!
//! A [`Session`] is a value: the transcript so far, a variable map, and an
//! engine metadata side-channel. Every "mutation" returns a fresh `Session`
//! and leaves the receiver untouched, so callers can hold onto any
//! intermediate state (for retries, branching, or inspection) without
//! defensive copying. The lineage id and creation time survive derivation.

mod message;

pub use message::{Message, Role, RoleTag, ToolCall};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Conversation state threaded through template execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Lineage id, preserved across derivations
    pub id: String,

    /// When the lineage started (UTC), preserved across derivations
    pub created_at: DateTime<Utc>,

    /// Transcript in append order
    pub messages: Vec<Message>,

    /// Caller-visible variables, last write wins
    pub vars: HashMap<String, Value>,

    /// Engine and host bookkeeping, separate from caller variables
    pub metadata: HashMap<String, Value>,
}

impl Session {
    /// Create an empty session with a fresh lineage id
    pub fn new() -> Self {
        let id = Uuid::now_v7().to_string();
        debug!(%id, "Session::new: called");
        Self {
            id,
            created_at: Utc::now(),
            messages: Vec::new(),
            vars: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Derive a session with `message` appended
    pub fn add_message(&self, message: Message) -> Session {
        debug!(role = message.role_name(), "Session::add_message: called");
        let mut next = self.clone();
        next.messages.push(message);
        next
    }

    /// Derive a session with `key` set to `value`
    pub fn with_var(&self, key: impl Into<String>, value: Value) -> Session {
        let key = key.into();
        debug!(%key, "Session::with_var: called");
        let mut next = self.clone();
        next.vars.insert(key, value);
        next
    }

    /// Derive a session with every pair applied, in iteration order
    pub fn with_vars(&self, vars: impl IntoIterator<Item = (String, Value)>) -> Session {
        let mut next = self.clone();
        for (key, value) in vars {
            next.vars.insert(key, value);
        }
        next
    }

    /// Derive a session with metadata `key` set to `value`
    pub fn with_meta(&self, key: impl Into<String>, value: Value) -> Session {
        let mut next = self.clone();
        next.metadata.insert(key.into(), value);
        next
    }

    /// Derive a session keeping this transcript but adopting `other`'s
    /// vars and metadata
    ///
    /// Supports isolated subroutines: the body's messages survive while its
    /// variable and metadata writes revert to the caller's view.
    pub fn with_scope_of(&self, other: &Session) -> Session {
        debug!("Session::with_scope_of: called");
        let mut next = self.clone();
        next.vars = other.vars.clone();
        next.metadata = other.metadata.clone();
        next
    }

    /// Look up a variable
    pub fn var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Integer variable, or `default` when absent or not a number
    pub fn var_i64(&self, key: &str, default: i64) -> i64 {
        self.vars.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    /// Boolean variable, or `default` when absent or not a boolean
    pub fn var_bool(&self, key: &str, default: bool) -> bool {
        self.vars.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// String variable, `None` when absent or not a string
    pub fn var_str(&self, key: &str) -> Option<&str> {
        self.vars.get(key).and_then(Value::as_str)
    }

    /// Look up a metadata entry
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Most recently appended message
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Messages with the given transcript tag, in transcript order
    ///
    /// Accepts a speaker [`Role`] directly; [`RoleTag::ToolResult`] selects
    /// dispatcher-appended tool results.
    pub fn messages_by_role(&self, role: impl Into<RoleTag>) -> Vec<&Message> {
        let tag = role.into();
        self.messages.iter().filter(|m| m.tag() == tag).collect()
    }

    /// Assistant tool calls with no matching tool result yet, in call order
    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        let resolved: std::collections::HashSet<&str> =
            self.messages.iter().filter_map(Message::tool_call_id).collect();
        self.messages
            .iter()
            .flat_map(|m| m.tool_calls())
            .filter(|call| !resolved.contains(call.id.as_str()))
            .collect()
    }

    /// True when a tool result answering `call_id` is in the transcript
    pub fn is_resolved(&self, call_id: &str) -> bool {
        self.messages.iter().any(|m| m.tool_call_id() == Some(call_id))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
