//! Reserved goal-report tool
//!
//! `check_goal` is how the model reports on goal satisfaction. The name is
//! reserved: the dispatcher recognizes it before any registry lookup and
//! records the report into session metadata, where the loop controller reads
//! it back. Registering the tool only affects what gets advertised to the
//! model; the signal works either way.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{Tool, ToolError};
use crate::session::Session;

/// Reserved name of the goal-report tool
pub const GOAL_TOOL: &str = "check_goal";

/// Metadata key the latest goal report is stored under
pub const GOAL_REPORT_KEY: &str = "goal.report";

/// One model self-report on goal satisfaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalReport {
    /// The model's claim about the goal
    pub satisfied: bool,

    /// Free-form explanation, when the model gave one
    #[serde(default)]
    pub note: Option<String>,

    /// Position in this session's report stream, starting at 1
    ///
    /// Lets the loop controller tell a report emitted during the current
    /// attempt from one left over by an earlier attempt.
    pub seq: u64,
}

/// Latest goal report recorded in the session, if any
pub fn latest_report(session: &Session) -> Option<GoalReport> {
    session.meta(GOAL_REPORT_KEY).and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Record a fresh goal report, advancing the sequence number
pub(crate) fn record_report(session: &Session, satisfied: bool, note: Option<String>) -> Session {
    let seq = latest_report(session).map(|r| r.seq + 1).unwrap_or(1);
    debug!(satisfied, seq, "goal::record_report: called");
    session.with_meta(GOAL_REPORT_KEY, json!({ "satisfied": satisfied, "note": note, "seq": seq }))
}

/// The advertised form of the goal-report signal
pub struct GoalTool;

#[async_trait]
impl Tool for GoalTool {
    fn name(&self) -> &str {
        GOAL_TOOL
    }

    fn description(&self) -> &str {
        "Report whether the stated goal is satisfied. Call with satisfied=true \
         once the goal's success condition holds, or satisfied=false to keep working."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "satisfied": {
                    "type": "boolean",
                    "description": "Whether the goal is satisfied"
                },
                "note": {
                    "type": "string",
                    "description": "Brief justification for the report"
                }
            },
            "required": ["satisfied"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let satisfied = args
            .get("satisfied")
            .and_then(Value::as_bool)
            .ok_or_else(|| ToolError::InvalidArgument("check_goal requires a boolean 'satisfied'".to_string()))?;
        Ok(Value::String(format!("Goal report recorded (satisfied: {satisfied})")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_report_advances_sequence() {
        let session = Session::new();
        let session = record_report(&session, false, None);
        let session = record_report(&session, true, Some("done".to_string()));

        let report = latest_report(&session).unwrap();
        assert!(report.satisfied);
        assert_eq!(report.note.as_deref(), Some("done"));
        assert_eq!(report.seq, 2);
    }

    #[test]
    fn test_latest_report_absent_on_fresh_session() {
        assert!(latest_report(&Session::new()).is_none());
    }

    #[tokio::test]
    async fn test_goal_tool_acknowledges() {
        let tool = GoalTool;
        let result = tool.execute(json!({ "satisfied": true })).await.unwrap();
        assert!(result.as_str().unwrap().contains("satisfied: true"));
    }

    #[tokio::test]
    async fn test_goal_tool_rejects_missing_flag() {
        let tool = GoalTool;
        let err = tool.execute(json!({ "note": "hm" })).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}
