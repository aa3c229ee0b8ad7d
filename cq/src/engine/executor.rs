//! Template executor
//!
//! Walks a [`Template`] tree, threading an immutable [`Session`] through it.
//! Each node consumes the session it is handed and yields a derived one;
//! failures carry the session as it stood, so nothing a conversation built
//! is lost to an error.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use super::attempts::{AttemptOutcome, AttemptRecord, judge_attempt, report_baseline};
use super::error::{EngineError, ExecutionError};
use crate::config::EngineConfig;
use crate::session::{Message, Role, Session};
use crate::source::{Source, SourceOutput};
use crate::template::{ExhaustionPolicy, Predicate, Template, VarScope};
use crate::tools::{ToolRegistry, dispatch_tool_calls};
use crate::validate::Validator;

/// Executes templates against sessions
///
/// An engine is cheap to keep around and safe to share: it holds only
/// configuration and the tool registry, never per-execution state.
pub struct Engine {
    config: EngineConfig,
    tools: ToolRegistry,
}

impl Engine {
    /// Create an engine with the standard tool registry
    pub fn new(config: EngineConfig) -> Self {
        debug!("Engine::new: called");
        Self { config, tools: ToolRegistry::standard() }
    }

    /// Replace the tool registry
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        debug!(tool_count = tools.tool_names().len(), "Engine::with_tools: called");
        self.tools = tools;
        self
    }

    /// Registry this engine dispatches against
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Configured loop ceiling, for callers building loop nodes
    ///
    /// Loop nodes carry their own `max_attempts`; this is the configured
    /// default to reach for when a caller has no better number.
    pub fn suggested_loop_attempts(&self) -> u32 {
        self.config.limits.loop_attempts
    }

    /// Execute `template` against `session`, returning the derived session
    ///
    /// The input session is consumed but, being a value, callers who cloned
    /// it beforehand still hold the pre-execution state.
    pub async fn execute(
        &self,
        template: &Template,
        session: Session,
    ) -> Result<Session, ExecutionError> {
        debug!(kind = template.kind(), session_id = %session.id, "execute: called");
        info!("Executing {} template (session {})", template.kind(), session.id);

        let result = self.execute_node(template, session).await;
        match &result {
            Ok(session) => {
                info!("Execution complete ({} messages)", session.messages.len());
            }
            Err(e) => {
                warn!("Execution failed: {}", e.kind);
            }
        }
        result
    }

    /// Recursive walk; boxed because the future type is self-referential
    fn execute_node<'a>(
        &'a self,
        template: &'a Template,
        session: Session,
    ) -> BoxFuture<'a, Result<Session, ExecutionError>> {
        Box::pin(async move {
            match template {
                Template::Leaf { role, source, validator, validation_attempts } => {
                    self.execute_leaf(*role, source, validator.as_ref(), *validation_attempts, session)
                        .await
                }
                Template::Sequence { children } => {
                    debug!(child_count = children.len(), "execute_node: sequence");
                    let mut current = session;
                    for child in children {
                        current = self.execute_node(child, current).await?;
                    }
                    Ok(current)
                }
                Template::Conditional { predicate, then_branch, else_branch } => {
                    let take_then = predicate(&session);
                    debug!(take_then, has_else = else_branch.is_some(), "execute_node: conditional");
                    if take_then {
                        self.execute_node(then_branch, session).await
                    } else if let Some(branch) = else_branch {
                        self.execute_node(branch, session).await
                    } else {
                        Ok(session)
                    }
                }
                Template::Loop { body, max_attempts, is_satisfied, on_exhausted } => {
                    self.execute_loop(body, *max_attempts, is_satisfied.as_ref(), *on_exhausted, session)
                        .await
                }
                Template::Subroutine { body, scope } => {
                    debug!(?scope, "execute_node: subroutine");
                    let caller = session.clone();
                    let result = self.execute_node(body, session).await?;
                    match scope {
                        VarScope::Shared => Ok(result),
                        VarScope::Isolated => Ok(result.with_scope_of(&caller)),
                    }
                }
            }
        })
    }

    /// Produce one message, commit it, and dispatch any tool calls it carries
    async fn execute_leaf(
        &self,
        role: Role,
        source: &Arc<dyn Source>,
        validator: Option<&Arc<dyn Validator>>,
        validation_attempts: Option<u32>,
        session: Session,
    ) -> Result<Session, ExecutionError> {
        debug!(%role, validated = validator.is_some(), "execute_leaf: called");

        let output = match validator {
            None => source
                .content(&session)
                .await
                .map_err(|e| ExecutionError::new(e, session.clone()))?,
            Some(validator) => {
                let budget = validation_attempts.unwrap_or(self.config.limits.validation_attempts);
                self.produce_validated(source, validator, budget, &session).await?
            }
        };

        if role != Role::Assistant {
            if !output.tool_calls.is_empty() {
                warn!(%role, call_count = output.tool_calls.len(), "execute_leaf: only assistant leaves may call tools, dropping");
            }
            if output.structured.is_some() {
                warn!(%role, "execute_leaf: only assistant leaves carry structured payloads, dropping");
            }
        }

        match role {
            Role::System => Ok(session.add_message(Message::system(output.content))),
            Role::User => Ok(session.add_message(Message::user(output.content))),
            Role::Assistant => {
                let calls = output.tool_calls.clone();
                let session = session.add_message(Message::Assistant {
                    content: output.content,
                    tool_calls: output.tool_calls,
                    structured: output.structured,
                });
                if calls.is_empty() {
                    return Ok(session);
                }

                debug!(call_count = calls.len(), "execute_leaf: dispatching tool calls");
                let dispatched = dispatch_tool_calls(&self.tools, session, &calls).await;
                match dispatched.unknown_tool {
                    Some(name) => Err(ExecutionError::new(
                        EngineError::ToolNotFound { name },
                        dispatched.session,
                    )),
                    None => Ok(dispatched.session),
                }
            }
        }
    }

    /// Ask the source until the validator accepts or the budget runs out
    ///
    /// Every retry re-reads the same input session; rejected content is
    /// dropped on the floor and never influences the next attempt.
    async fn produce_validated(
        &self,
        source: &Arc<dyn Source>,
        validator: &Arc<dyn Validator>,
        budget: u32,
        session: &Session,
    ) -> Result<SourceOutput, ExecutionError> {
        debug!(budget, "produce_validated: called");
        let mut last_errors = Vec::new();

        for attempt in 1..=budget {
            let output = source
                .content(session)
                .await
                .map_err(|e| ExecutionError::new(e, session.clone()))?;

            let verdict = validator.validate(&output.content).await;
            if verdict.valid {
                debug!(attempt, "produce_validated: accepted");
                return Ok(output);
            }
            warn!(attempt, budget, errors = ?verdict.errors, "produce_validated: content rejected");
            last_errors = verdict.errors;
        }

        Err(ExecutionError::new(
            EngineError::ValidationExhausted { attempts: budget, errors: last_errors },
            session.clone(),
        ))
    }

    /// Run the loop body until an attempt satisfies the goal
    ///
    /// Unsatisfied attempts thread their session into the next attempt, so
    /// later attempts see everything earlier ones did. An attempt lost to
    /// validation exhaustion is the exception: its partial session is
    /// discarded and the next attempt starts over from the pre-attempt
    /// state.
    async fn execute_loop(
        &self,
        body: &Template,
        max_attempts: u32,
        is_satisfied: Option<&Predicate>,
        on_exhausted: ExhaustionPolicy,
        session: Session,
    ) -> Result<Session, ExecutionError> {
        debug!(max_attempts, host_predicate = is_satisfied.is_some(), "execute_loop: called");

        let mut current = session;
        let mut attempt = 0;
        let mut records: Vec<AttemptRecord> = Vec::new();

        while attempt < max_attempts {
            attempt += 1;
            info!("Loop attempt {}/{}", attempt, max_attempts);
            let baseline = report_baseline(&current);

            let derived = match self.execute_node(body, current.clone()).await {
                Ok(derived) => derived,
                Err(e) if matches!(e.kind, EngineError::ValidationExhausted { .. }) => {
                    warn!(attempt, error = %e.kind, "execute_loop: attempt lost to validation, retrying");
                    records.push(AttemptRecord::new(attempt, AttemptOutcome::ValidationFailed));
                    continue;
                }
                Err(e) => return Err(e),
            };

            let outcome = judge_attempt(is_satisfied, baseline, &derived);
            records.push(AttemptRecord::new(attempt, outcome));
            if let AttemptOutcome::Satisfied(by) = outcome {
                debug!(attempt, ?by, "execute_loop: satisfied");
                info!("Loop satisfied after {} attempt(s)", attempt);
                return Ok(derived);
            }
            debug!(attempt, "execute_loop: unsatisfied, threading session forward");
            current = derived;
        }

        let lost: Vec<u32> =
            records.iter().filter(|r| r.lost_to_validation()).map(|r| r.index).collect();
        match on_exhausted {
            ExhaustionPolicy::Promote => {
                warn!(max_attempts, lost_attempts = ?lost, "execute_loop: exhausted, promoting last session");
                Ok(current)
            }
            ExhaustionPolicy::Fail => {
                debug!(max_attempts, lost_attempts = ?lost, "execute_loop: exhausted");
                Err(ExecutionError::new(EngineError::LoopAttemptsExhausted { max_attempts }, current))
            }
        }
    }
}
