//! Scheduler error types.

use thiserror::Error;

use cellplane_model::ExcludedCandidate;

/// Result type alias for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors that can occur during a scheduling run.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("unknown cell: {0}")]
    UnknownCell(String),

    /// Every candidate was excluded by health or gates. Carries the
    /// gate-failure report so callers can surface why.
    #[error(
        "no viable candidate: {candidates_evaluated} evaluated, \
         {candidates_healthy} healthy, 0 passed gates"
    )]
    NoViableCandidate {
        excluded: Vec<ExcludedCandidate>,
        candidates_evaluated: usize,
        candidates_healthy: usize,
    },
}
