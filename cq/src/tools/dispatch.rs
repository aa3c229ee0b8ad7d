//! Tool-call dispatcher
//!
//! Runs the tool calls of one accepted assistant message, sequentially and
//! in emission order, appending one tool result per dispatched call. Tool
//! failures are soft: they land in the transcript as error results for the
//! model to react to. The only hard stop is a call to a name the registry
//! does not know.

use serde_json::{Value, json};
use tracing::{debug, warn};

use super::goal::{GOAL_TOOL, record_report};
use super::registry::ToolRegistry;
use crate::session::{Message, Session, ToolCall};

/// Session var counting every dispatched call
pub const TOOLS_USED_VAR: &str = "tools_used";

/// Metadata key holding per-tool call counts
pub const TOOL_CALLS_META: &str = "tools.calls";

/// What one dispatch pass produced
pub(crate) struct DispatchResult {
    /// Session with results and accumulator updates applied
    pub session: Session,
    /// Name of the first unknown tool; dispatch halted there
    pub unknown_tool: Option<String>,
}

/// Dispatch `calls` against `registry`, threading the session through
pub(crate) async fn dispatch_tool_calls(
    registry: &ToolRegistry,
    mut session: Session,
    calls: &[ToolCall],
) -> DispatchResult {
    debug!(call_count = calls.len(), "dispatch_tool_calls: called");

    for call in calls {
        // The goal signal is recognized by name, registered or not
        if call.name == GOAL_TOOL {
            session = dispatch_goal_report(session, call);
            session = bump_counters(session, &call.name);
            continue;
        }

        let Some(tool) = registry.get(&call.name) else {
            warn!(name = %call.name, "dispatch_tool_calls: unknown tool, halting");
            return DispatchResult { session, unknown_tool: Some(call.name.clone()) };
        };

        if let Some(violations) = schema_violations(tool.input_schema(), &call.arguments) {
            debug!(name = %call.name, "dispatch_tool_calls: arguments rejected by schema");
            let message = format!("invalid arguments for '{}': {}", call.name, violations);
            session = session.add_message(Message::tool_error(&call.id, message));
            session = bump_counters(session, &call.name);
            continue;
        }

        debug!(name = %call.name, id = %call.id, "dispatch_tool_calls: executing");
        let result = match tool.execute(call.arguments.clone()).await {
            Ok(value) => Message::tool_result(&call.id, render_value(value)),
            Err(e) => {
                debug!(name = %call.name, error = %e, "dispatch_tool_calls: tool failed");
                Message::tool_error(&call.id, format!("tool '{}' failed: {}", call.name, e))
            }
        };
        session = session.add_message(result);
        session = bump_counters(session, &call.name);
    }

    DispatchResult { session, unknown_tool: None }
}

/// Record a well-formed goal report, or answer a malformed one with an error
fn dispatch_goal_report(session: Session, call: &ToolCall) -> Session {
    match call.arguments.get("satisfied").and_then(Value::as_bool) {
        Some(satisfied) => {
            let note = call
                .arguments
                .get("note")
                .and_then(Value::as_str)
                .map(str::to_string);
            let session = record_report(&session, satisfied, note);
            session.add_message(Message::tool_result(
                &call.id,
                format!("Goal report recorded (satisfied: {satisfied})"),
            ))
        }
        None => {
            warn!("dispatch_goal_report: missing boolean 'satisfied', not recording");
            session.add_message(Message::tool_error(
                &call.id,
                "check_goal requires a boolean 'satisfied' argument",
            ))
        }
    }
}

/// Check arguments against the tool's schema; `None` means acceptable
///
/// A schema that fails to compile disables checking for that call rather
/// than blocking the tool.
fn schema_violations(schema: Value, arguments: &Value) -> Option<String> {
    let compiled = match jsonschema::validator_for(&schema) {
        Ok(compiled) => compiled,
        Err(e) => {
            warn!(error = %e, "schema_violations: tool schema does not compile, skipping check");
            return None;
        }
    };
    let violations: Vec<String> = compiled.iter_errors(arguments).map(|e| e.to_string()).collect();
    if violations.is_empty() { None } else { Some(violations.join("; ")) }
}

/// Render a tool's value for the transcript: bare text for strings,
/// compact JSON for everything else
fn render_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Advance `tools_used` and the per-tool call counts
fn bump_counters(session: Session, name: &str) -> Session {
    let used = session.var_i64(TOOLS_USED_VAR, 0) + 1;
    let mut counts = session
        .meta(TOOL_CALLS_META)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let per_tool = counts.get(name).and_then(Value::as_i64).unwrap_or(0) + 1;
    counts.insert(name.to_string(), json!(per_tool));
    session.with_var(TOOLS_USED_VAR, json!(used)).with_meta(TOOL_CALLS_META, Value::Object(counts))
}

#[cfg(test)]
mod tests {
    use super::super::goal::latest_report;
    use super::*;
    use crate::test_support::{CalculatorTool, FailingTool, InspectTool};
    use crate::tools::{Tool, ToolError};

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(CalculatorTool);
        registry.register(FailingTool);
        registry.register(InspectTool);
        registry
    }

    fn call(id: &str, name: &str, args: Value) -> ToolCall {
        ToolCall::with_id(id, name, args)
    }

    #[tokio::test]
    async fn test_results_match_calls_in_order() {
        let calls = vec![
            call("c1", "calculate", json!({ "expression": "5+3" })),
            call("c2", "calculate", json!({ "expression": "2*2" })),
        ];

        let out = dispatch_tool_calls(&registry(), Session::new(), &calls).await;

        assert!(out.unknown_tool.is_none());
        let messages = &out.session.messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].tool_call_id(), Some("c1"));
        assert_eq!(messages[0].content(), "8");
        assert_eq!(messages[1].tool_call_id(), Some("c2"));
        assert_eq!(messages[1].content(), "4");
        assert!(out.session.pending_tool_calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_halts_dispatch() {
        let calls = vec![
            call("c1", "calculate", json!({ "expression": "1+1" })),
            call("c2", "no_such_tool", json!({})),
            call("c3", "calculate", json!({ "expression": "3+3" })),
        ];

        let out = dispatch_tool_calls(&registry(), Session::new(), &calls).await;

        assert_eq!(out.unknown_tool.as_deref(), Some("no_such_tool"));
        // First result is in; the halting call and everything after are not
        assert_eq!(out.session.messages.len(), 1);
        assert_eq!(out.session.var_i64(TOOLS_USED_VAR, 0), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_is_soft() {
        let calls = vec![
            call("c1", "explode", json!({})),
            call("c2", "calculate", json!({ "expression": "2+2" })),
        ];

        let out = dispatch_tool_calls(&registry(), Session::new(), &calls).await;

        assert!(out.unknown_tool.is_none());
        let first = &out.session.messages[0];
        assert!(matches!(first, Message::ToolResult { is_error: true, .. }));
        assert!(first.content().contains("kaboom"));
        // Dispatch continued past the failure
        assert_eq!(out.session.messages[1].content(), "4");
    }

    #[tokio::test]
    async fn test_schema_violation_is_soft_and_still_counted() {
        let calls = vec![call("c1", "calculate", json!({ "wrong_key": true }))];

        let out = dispatch_tool_calls(&registry(), Session::new(), &calls).await;

        let first = &out.session.messages[0];
        assert!(matches!(first, Message::ToolResult { is_error: true, .. }));
        assert!(first.content().contains("invalid arguments for 'calculate'"));
        assert_eq!(out.session.var_i64(TOOLS_USED_VAR, 0), 1);
    }

    #[tokio::test]
    async fn test_non_string_values_render_compact_json() {
        let calls = vec![call("c1", "inspect", json!({ "k": 1 }))];

        let out = dispatch_tool_calls(&registry(), Session::new(), &calls).await;

        let content = out.session.messages[0].content();
        let parsed: Value = serde_json::from_str(content).unwrap();
        assert_eq!(parsed["received"]["k"], 1);
        assert!(!content.contains('\n'), "compact, not pretty-printed");
    }

    #[tokio::test]
    async fn test_check_goal_recorded_without_registry_entry() {
        let empty = ToolRegistry::new();
        let calls = vec![call("g1", GOAL_TOOL, json!({ "satisfied": true, "note": "all done" }))];

        let out = dispatch_tool_calls(&empty, Session::new(), &calls).await;

        assert!(out.unknown_tool.is_none());
        let report = latest_report(&out.session).unwrap();
        assert!(report.satisfied);
        assert_eq!(report.note.as_deref(), Some("all done"));
        assert_eq!(report.seq, 1);
        assert_eq!(out.session.messages[0].tool_call_id(), Some("g1"));
        assert_eq!(out.session.var_i64(TOOLS_USED_VAR, 0), 1);
    }

    #[tokio::test]
    async fn test_malformed_goal_report_not_recorded() {
        let calls = vec![call("g1", GOAL_TOOL, json!({ "note": "forgot the flag" }))];

        let out = dispatch_tool_calls(&ToolRegistry::new(), Session::new(), &calls).await;

        assert!(latest_report(&out.session).is_none());
        assert!(matches!(out.session.messages[0], Message::ToolResult { is_error: true, .. }));
    }

    #[tokio::test]
    async fn test_counters_accumulate_per_tool() {
        let calls = vec![
            call("c1", "calculate", json!({ "expression": "1+1" })),
            call("c2", "calculate", json!({ "expression": "2+2" })),
            call("c3", "inspect", json!({})),
        ];

        let session = Session::new().with_var(TOOLS_USED_VAR, json!(5));
        let out = dispatch_tool_calls(&registry(), session, &calls).await;

        assert_eq!(out.session.var_i64(TOOLS_USED_VAR, 0), 8);
        let counts = out.session.meta(TOOL_CALLS_META).unwrap();
        assert_eq!(counts["calculate"], 2);
        assert_eq!(counts["inspect"], 1);
    }

    struct BrokenSchemaTool;

    #[async_trait::async_trait]
    impl Tool for BrokenSchemaTool {
        fn name(&self) -> &str {
            "broken_schema"
        }

        fn description(&self) -> &str {
            "Tool whose schema does not compile"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": 1 })
        }

        async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
            Ok(Value::String("ran anyway".to_string()))
        }
    }

    #[tokio::test]
    async fn test_uncompilable_schema_skips_checking() {
        let mut registry = ToolRegistry::new();
        registry.register(BrokenSchemaTool);
        let calls = vec![call("c1", "broken_schema", json!({ "whatever": true }))];

        let out = dispatch_tool_calls(&registry, Session::new(), &calls).await;

        assert_eq!(out.session.messages[0].content(), "ran anyway");
    }
}
