//! Composable control-flow templates
//!
//! A [`Template`] is an immutable description of a conversation shape: which
//! turns happen, in what order, under which conditions, and how often. It
//! carries no per-execution state, so one template can drive any number of
//! concurrent executions. Sources, validators, and predicates sit behind
//! `Arc`, making `clone()` cheap.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::session::{Role, Session};
use crate::source::Source;
use crate::validate::Validator;

/// Host-side check evaluated against the current session
pub type Predicate = Arc<dyn Fn(&Session) -> bool + Send + Sync>;

/// Variable visibility for a subroutine body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarScope {
    /// The body reads and writes the caller's vars directly
    Shared,
    /// The body sees the caller's vars; its writes revert afterwards
    Isolated,
}

/// What a loop does when it hits its attempt ceiling unsatisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// The ceiling is an error
    #[default]
    Fail,
    /// The ceiling is an accepted outcome: return the last session
    Promote,
}

/// One node of a conversation template
#[derive(Clone)]
pub enum Template {
    /// Produce one message and append it
    Leaf {
        /// Speaker role of the produced message
        role: Role,
        /// Where the content comes from
        source: Arc<dyn Source>,
        /// Optional acceptance gate for the produced content
        validator: Option<Arc<dyn Validator>>,
        /// Per-leaf validation budget, `None` → engine default
        validation_attempts: Option<u32>,
    },

    /// Execute children left to right, threading the session
    Sequence { children: Vec<Template> },

    /// Execute exactly one branch, chosen by a host predicate
    Conditional {
        predicate: Predicate,
        then_branch: Box<Template>,
        else_branch: Option<Box<Template>>,
    },

    /// Re-execute the body until satisfied or the ceiling is hit
    Loop {
        body: Box<Template>,
        /// Hard ceiling on body executions
        max_attempts: u32,
        /// Host satisfaction check; when present it alone decides
        is_satisfied: Option<Predicate>,
        on_exhausted: ExhaustionPolicy,
    },

    /// Execute the body as a nested unit with its own variable scope
    Subroutine { body: Box<Template>, scope: VarScope },
}

impl Template {
    /// Leaf producing a message of `role` from `source`
    pub fn leaf(role: Role, source: impl Source + 'static) -> Self {
        debug!(%role, "Template::leaf: called");
        Template::Leaf { role, source: Arc::new(source), validator: None, validation_attempts: None }
    }

    /// Leaf whose content must pass `validator` before it is committed
    pub fn validated(
        role: Role,
        source: impl Source + 'static,
        validator: impl Validator + 'static,
    ) -> Self {
        debug!(%role, "Template::validated: called");
        Template::Leaf {
            role,
            source: Arc::new(source),
            validator: Some(Arc::new(validator)),
            validation_attempts: None,
        }
    }

    /// Run `children` in order
    pub fn sequence(children: Vec<Template>) -> Self {
        debug!(child_count = children.len(), "Template::sequence: called");
        Template::Sequence { children }
    }

    /// Run `then` only when `predicate` holds
    pub fn when(predicate: impl Fn(&Session) -> bool + Send + Sync + 'static, then: Template) -> Self {
        Template::Conditional {
            predicate: Arc::new(predicate),
            then_branch: Box::new(then),
            else_branch: None,
        }
    }

    /// Run `then` when `predicate` holds, `otherwise` when it does not
    pub fn when_else(
        predicate: impl Fn(&Session) -> bool + Send + Sync + 'static,
        then: Template,
        otherwise: Template,
    ) -> Self {
        Template::Conditional {
            predicate: Arc::new(predicate),
            then_branch: Box::new(then),
            else_branch: Some(Box::new(otherwise)),
        }
    }

    /// Loop whose satisfaction comes from the model's own goal reports
    pub fn repeat(body: Template, max_attempts: u32) -> Self {
        debug!(%max_attempts, "Template::repeat: called");
        Template::Loop {
            body: Box::new(body),
            max_attempts,
            is_satisfied: None,
            on_exhausted: ExhaustionPolicy::default(),
        }
    }

    /// Loop decided by a host predicate over the session
    pub fn repeat_until(
        body: Template,
        max_attempts: u32,
        is_satisfied: impl Fn(&Session) -> bool + Send + Sync + 'static,
    ) -> Self {
        debug!(%max_attempts, "Template::repeat_until: called");
        Template::Loop {
            body: Box::new(body),
            max_attempts,
            is_satisfied: Some(Arc::new(is_satisfied)),
            on_exhausted: ExhaustionPolicy::default(),
        }
    }

    /// Nested execution with the given variable scope
    pub fn subroutine(body: Template, scope: VarScope) -> Self {
        debug!(?scope, "Template::subroutine: called");
        Template::Subroutine { body: Box::new(body), scope }
    }

    /// Accept hitting the attempt ceiling as success (loops only)
    pub fn tolerate_exhaustion(self) -> Self {
        match self {
            Template::Loop { body, max_attempts, is_satisfied, .. } => Template::Loop {
                body,
                max_attempts,
                is_satisfied,
                on_exhausted: ExhaustionPolicy::Promote,
            },
            other => {
                warn!(kind = other.kind(), "Template::tolerate_exhaustion: not a loop, ignoring");
                other
            }
        }
    }

    /// Override the validation budget (leaves only)
    pub fn with_validation_attempts(self, attempts: u32) -> Self {
        match self {
            Template::Leaf { role, source, validator, .. } => {
                Template::Leaf { role, source, validator, validation_attempts: Some(attempts) }
            }
            other => {
                warn!(kind = other.kind(), "Template::with_validation_attempts: not a leaf, ignoring");
                other
            }
        }
    }

    /// Node kind for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Template::Leaf { .. } => "leaf",
            Template::Sequence { .. } => "sequence",
            Template::Conditional { .. } => "conditional",
            Template::Loop { .. } => "loop",
            Template::Subroutine { .. } => "subroutine",
        }
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Template::Leaf { role, validator, validation_attempts, .. } => f
                .debug_struct("Leaf")
                .field("role", role)
                .field("validated", &validator.is_some())
                .field("validation_attempts", validation_attempts)
                .finish_non_exhaustive(),
            Template::Sequence { children } => {
                f.debug_struct("Sequence").field("children", children).finish()
            }
            Template::Conditional { then_branch, else_branch, .. } => f
                .debug_struct("Conditional")
                .field("then", then_branch)
                .field("else", else_branch)
                .finish_non_exhaustive(),
            Template::Loop { body, max_attempts, is_satisfied, on_exhausted } => f
                .debug_struct("Loop")
                .field("body", body)
                .field("max_attempts", max_attempts)
                .field("host_predicate", &is_satisfied.is_some())
                .field("on_exhausted", on_exhausted)
                .finish(),
            Template::Subroutine { body, scope } => {
                f.debug_struct("Subroutine").field("body", body).field("scope", scope).finish()
            }
        }
    }
}
