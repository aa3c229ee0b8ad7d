//! Engine error taxonomy
//!
//! Execution failures carry the session as it stood when the failure was
//! raised, so callers can inspect or resume from the partial conversation
//! instead of losing it.

use thiserror::Error;

use crate::session::Session;
use crate::source::SourceError;

/// Ways template execution can fail
#[derive(Debug, Error)]
pub enum EngineError {
    /// A leaf's source failed and the leaf produced nothing
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A leaf spent its validation budget without producing acceptable content
    #[error("validation exhausted after {attempts} attempt(s): {}", errors.join("; "))]
    ValidationExhausted { attempts: u32, errors: Vec<String> },

    /// A loop hit its attempt ceiling while still unsatisfied
    #[error("loop unsatisfied after {max_attempts} attempt(s)")]
    LoopAttemptsExhausted { max_attempts: u32 },

    /// The model called a tool the registry does not know
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },
}

/// An engine failure paired with the session it happened in
///
/// For [`EngineError::ValidationExhausted`] the session is the leaf's input
/// session: rejected content is never committed. For tool and loop failures
/// it includes whatever the failing subtree managed to append.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ExecutionError {
    #[source]
    pub kind: EngineError,
    pub session: Session,
}

impl ExecutionError {
    pub(crate) fn new(kind: impl Into<EngineError>, session: Session) -> Self {
        Self { kind: kind.into(), session }
    }
}
