//! Test doubles for engine, source, and tool tests
//!
//! Compiled for this crate's own tests and for downstream crates that
//! enable the `test-support` feature. Everything here is deterministic:
//! scripted doubles replay a fixed list and then fail loudly, so a test
//! that consumes more than it scripted cannot pass by accident.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::model::{CompletionRequest, CompletionResponse, ModelClient, ModelError};
use crate::session::Session;
use crate::source::{Source, SourceError, SourceOutput};
use crate::tools::{Tool, ToolError};

static INIT_TRACING: Once = Once::new();

/// Route engine logs to the test harness when `TEST_LOG` is set
///
/// Safe to call from every test; only the first call installs the
/// subscriber. `RUST_LOG` narrows the filter, defaulting to `debug`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        if std::env::var("TEST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
                .init();
        }
    });
}

/// Model client that replays scripted responses in order
///
/// Records every request it sees; exhausting the script is an
/// `InvalidResponse` error.
pub struct ScriptedModelClient {
    responses: Vec<CompletionResponse>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_count: AtomicUsize,
}

impl ScriptedModelClient {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        debug!(response_count = responses.len(), "ScriptedModelClient::new: called");
        Self { responses, requests: Mutex::new(Vec::new()), call_count: AtomicUsize::new(0) }
    }

    /// How many completions have been requested
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request seen so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError> {
        debug!("ScriptedModelClient::complete: called");
        self.requests.lock().unwrap().push(request);
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(idx)
            .cloned()
            .ok_or_else(|| ModelError::InvalidResponse("no more scripted responses".to_string()))
    }
}

/// Source that replays scripted outputs in order
///
/// Exhausting the script is a `SourceError::Empty`, which doubles as a
/// convenient always-failing source when constructed empty.
pub struct ScriptedSource {
    outputs: Vec<SourceOutput>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(outputs: Vec<SourceOutput>) -> Self {
        debug!(output_count = outputs.len(), "ScriptedSource::new: called");
        Self { outputs, calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// Shared call counter, usable after the source moves into a template
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Source for ScriptedSource {
    async fn content(&self, _session: &Session) -> Result<SourceOutput, SourceError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(idx, "ScriptedSource::content: called");
        self.outputs
            .get(idx)
            .cloned()
            .ok_or_else(|| SourceError::Empty { reason: "no more scripted outputs".to_string() })
    }
}

/// Integer arithmetic tool for dispatch tests
///
/// Evaluates `"A+B"`, `"A-B"`, or `"A*B"` and answers with the bare result
/// string, e.g. `"5+3"` to `"8"`.
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate a simple arithmetic expression"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": { "type": "string", "description": "Expression like '5+3'" }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let expression = args
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'expression' must be a string".to_string()))?;
        let result = eval(expression).ok_or_else(|| {
            ToolError::InvalidArgument(format!("cannot evaluate '{expression}'"))
        })?;
        Ok(Value::String(result.to_string()))
    }
}

/// Evaluate one binary integer expression
///
/// The operator search skips the first character so a leading minus sign
/// reads as part of the left operand.
fn eval(expression: &str) -> Option<i64> {
    let expression = expression.trim();
    let (idx, op) = expression
        .char_indices()
        .skip(1)
        .find(|(_, c)| matches!(c, '+' | '-' | '*'))?;
    let lhs: i64 = expression[..idx].trim().parse().ok()?;
    let rhs: i64 = expression[idx + 1..].trim().parse().ok()?;
    match op {
        '+' => Some(lhs + rhs),
        '-' => Some(lhs - rhs),
        '*' => Some(lhs * rhs),
        _ => None,
    }
}

/// Tool that always fails, for soft-failure tests
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "explode"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        Err(ToolError::Failed("kaboom".to_string()))
    }
}

/// Tool that answers with a JSON object wrapping its arguments
///
/// Useful for asserting argument passthrough and non-string result
/// rendering.
pub struct InspectTool;

#[async_trait]
impl Tool for InspectTool {
    fn name(&self) -> &str {
        "inspect"
    }

    fn description(&self) -> &str {
        "Echo the received arguments as JSON"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        Ok(json!({ "received": args }))
    }
}
