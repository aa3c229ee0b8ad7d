//! Loop attempt accounting
//!
//! Decides whether one loop attempt satisfied its goal. Two signals exist:
//! a host predicate on the loop node, and goal reports the model files via
//! `check_goal`. A host predicate, when present, decides alone. Model
//! reports only count when filed during the attempt under judgment, which
//! is what the report sequence number is for: reports left over from
//! earlier attempts (or from before the loop) are stale and ignored.

use tracing::debug;

use crate::session::Session;
use crate::template::Predicate;
use crate::tools::latest_report;

/// Which signal satisfied the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SatisfiedBy {
    HostPredicate,
    ModelReport,
}

/// Verdict on one loop attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    Satisfied(SatisfiedBy),
    Unsatisfied,
    /// The body burned its validation budget; the attempt left no session
    ValidationFailed,
}

/// Bookkeeping for one executed attempt
///
/// Lives only for the duration of the enclosing loop; dropped once the loop
/// returns.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttemptRecord {
    /// 1-based attempt number
    pub index: u32,
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    pub(crate) fn new(index: u32, outcome: AttemptOutcome) -> Self {
        debug!(index, ?outcome, "AttemptRecord::new: called");
        Self { index, outcome }
    }

    /// True when this attempt was lost to validation exhaustion
    pub(crate) fn lost_to_validation(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::ValidationFailed)
    }
}

/// Sequence number of the newest goal report, 0 when none exists
///
/// Captured before each attempt so reports filed during the attempt are
/// distinguishable from everything older.
pub(crate) fn report_baseline(session: &Session) -> u64 {
    latest_report(session).map(|r| r.seq).unwrap_or(0)
}

/// Judge the attempt that turned `session` into its current state
pub(crate) fn judge_attempt(
    is_satisfied: Option<&Predicate>,
    baseline: u64,
    session: &Session,
) -> AttemptOutcome {
    if let Some(predicate) = is_satisfied {
        let satisfied = predicate(session);
        debug!(satisfied, "judge_attempt: host predicate decides");
        return if satisfied {
            AttemptOutcome::Satisfied(SatisfiedBy::HostPredicate)
        } else {
            AttemptOutcome::Unsatisfied
        };
    }

    match latest_report(session) {
        Some(report) if report.seq > baseline => {
            debug!(seq = report.seq, satisfied = report.satisfied, "judge_attempt: fresh model report");
            if report.satisfied {
                AttemptOutcome::Satisfied(SatisfiedBy::ModelReport)
            } else {
                AttemptOutcome::Unsatisfied
            }
        }
        Some(report) => {
            debug!(seq = report.seq, baseline, "judge_attempt: only stale reports, unsatisfied");
            AttemptOutcome::Unsatisfied
        }
        None => {
            debug!("judge_attempt: no report, unsatisfied");
            AttemptOutcome::Unsatisfied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::tools::{GOAL_REPORT_KEY, GoalReport};
    use serde_json::json;

    fn with_report(session: &Session, satisfied: bool, seq: u64) -> Session {
        session.with_meta(
            GOAL_REPORT_KEY,
            serde_json::to_value(GoalReport { satisfied, note: None, seq }).unwrap(),
        )
    }

    #[test]
    fn test_host_predicate_true_satisfies() {
        let predicate: Predicate = Arc::new(|s: &Session| s.var_bool("done", false));
        let session = Session::new().with_var("done", json!(true));

        let outcome = judge_attempt(Some(&predicate), 0, &session);

        assert_eq!(outcome, AttemptOutcome::Satisfied(SatisfiedBy::HostPredicate));
    }

    #[test]
    fn test_host_predicate_overrides_model_report() {
        let predicate: Predicate = Arc::new(|_: &Session| false);
        // Fresh report claiming success; the predicate still says no
        let session = with_report(&Session::new(), true, 1);

        let outcome = judge_attempt(Some(&predicate), 0, &session);

        assert_eq!(outcome, AttemptOutcome::Unsatisfied);
    }

    #[test]
    fn test_fresh_satisfied_report_satisfies() {
        let session = with_report(&Session::new(), true, 3);

        let outcome = judge_attempt(None, 2, &session);

        assert_eq!(outcome, AttemptOutcome::Satisfied(SatisfiedBy::ModelReport));
    }

    #[test]
    fn test_fresh_unsatisfied_report_does_not() {
        let session = with_report(&Session::new(), false, 3);

        assert_eq!(judge_attempt(None, 2, &session), AttemptOutcome::Unsatisfied);
    }

    #[test]
    fn test_stale_report_is_ignored() {
        // A satisfied report from some earlier attempt must not count now
        let session = with_report(&Session::new(), true, 2);

        assert_eq!(judge_attempt(None, 2, &session), AttemptOutcome::Unsatisfied);
    }

    #[test]
    fn test_no_report_is_unsatisfied() {
        assert_eq!(judge_attempt(None, 0, &Session::new()), AttemptOutcome::Unsatisfied);
    }

    #[test]
    fn test_baseline_reads_latest_seq() {
        let session = with_report(&Session::new(), false, 7);
        assert_eq!(report_baseline(&session), 7);
        assert_eq!(report_baseline(&Session::new()), 0);
    }

    #[test]
    fn test_record_tracks_validation_losses() {
        let records = [
            AttemptRecord::new(1, AttemptOutcome::ValidationFailed),
            AttemptRecord::new(2, AttemptOutcome::Unsatisfied),
            AttemptRecord::new(3, AttemptOutcome::Satisfied(SatisfiedBy::ModelReport)),
        ];

        let lost = records.iter().filter(|r| r.lost_to_validation()).count();
        assert_eq!(lost, 1);
        assert_eq!(records[0].index, 1);
        assert!(!records[2].lost_to_validation());
    }
}
