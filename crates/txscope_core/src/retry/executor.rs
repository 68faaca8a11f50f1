//! Attempt state machine and the executor that drives it.
//!
//! `AttemptState::next` is pure, so the transition table is testable
//! without sessions. `RetryableExecutor::execute` only adds the side effects:
//! calling the operation, rolling back between attempts, logging.

use super::policy::RetryPolicy;
use crate::failure::{ClassifyFailure, FailureKind};
use crate::session::scope::ScopeError;
use crate::session::Session;
use log::{debug, warn};

/// Position of one call in the retry state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// Running attempt `n` (1-based).
    Attempting(u32),
    Succeeded,
    /// Attempt `n` failed transiently; a rollback precedes the next attempt.
    FailedTransient(u32),
    FailedFatal,
    ExhaustedRetries,
}

/// What one attempt produced, as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure(FailureKind),
}

impl AttemptOutcome {
    pub fn of<T, E: ClassifyFailure>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => Self::Failure(err.failure_kind()),
        }
    }
}

impl AttemptState {
    pub fn start() -> Self {
        Self::Attempting(1)
    }

    /// Applies one attempt outcome. Only `Attempting` states move.
    pub fn next(self, outcome: AttemptOutcome, policy: &RetryPolicy) -> Self {
        let Self::Attempting(attempt) = self else {
            return self;
        };

        match outcome {
            AttemptOutcome::Success => Self::Succeeded,
            AttemptOutcome::Failure(kind) if policy.is_retryable(kind) => {
                if attempt < policy.max_attempts() {
                    Self::FailedTransient(attempt)
                } else {
                    Self::ExhaustedRetries
                }
            }
            AttemptOutcome::Failure(_) => Self::FailedFatal,
        }
    }

    /// Moves past a completed rollback into the next attempt.
    pub fn resume(self) -> Self {
        match self {
            Self::FailedTransient(attempt) => Self::Attempting(attempt + 1),
            other => other,
        }
    }

    /// Attempt number for in-flight states.
    pub fn attempt(self) -> Option<u32> {
        match self {
            Self::Attempting(attempt) | Self::FailedTransient(attempt) => Some(attempt),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::FailedFatal | Self::ExhaustedRetries
        )
    }
}

/// Runs an operation against one session under a `RetryPolicy`.
#[derive(Debug, Clone, Copy)]
pub struct RetryableExecutor<'p> {
    policy: &'p RetryPolicy,
}

impl<'p> RetryableExecutor<'p> {
    pub fn new(policy: &'p RetryPolicy) -> Self {
        Self { policy }
    }

    /// Executes `op` until it succeeds, fails fatally, or exhausts the budget.
    ///
    /// # Contract
    /// - Rolls `session` back between transient failures, never after a
    ///   fatal one.
    /// - Returns the last error unchanged on exhaustion.
    /// - Never commits; that belongs to the owner of the session.
    ///
    /// # Errors
    /// - The operation's error on fatal failure or exhaustion.
    /// - `ScopeError::Rollback` (converted into `E`) when the rollback
    ///   between attempts fails.
    pub fn execute<S, T, E, Op>(&self, session: &mut S, mut op: Op) -> Result<T, E>
    where
        S: Session + ?Sized,
        E: ClassifyFailure + From<ScopeError>,
        Op: FnMut(&mut S) -> Result<T, E>,
    {
        let max_attempts = self.policy.max_attempts();
        let mut state = AttemptState::start();

        loop {
            let attempt = state.attempt().unwrap_or(max_attempts);
            let result = op(&mut *session);
            let outcome = AttemptOutcome::of(&result);
            let kind = match outcome {
                AttemptOutcome::Failure(kind) => kind.as_str(),
                AttemptOutcome::Success => "none",
            };
            state = state.next(outcome, self.policy);

            match state {
                AttemptState::FailedTransient(_) => {
                    warn!(
                        "event=attempt module=retry status=transient attempt={} max_attempts={} kind={}",
                        attempt, max_attempts, kind
                    );
                    session
                        .rollback()
                        .map_err(|err| E::from(ScopeError::Rollback(err)))?;
                    state = state.resume();
                }
                AttemptState::ExhaustedRetries => {
                    warn!(
                        "event=attempt module=retry status=exhausted attempt={} max_attempts={} kind={}",
                        attempt, max_attempts, kind
                    );
                    return result;
                }
                AttemptState::FailedFatal => {
                    debug!(
                        "event=attempt module=retry status=fatal attempt={} kind={}",
                        attempt, kind
                    );
                    return result;
                }
                AttemptState::Succeeded | AttemptState::Attempting(_) => {
                    debug!("event=attempt module=retry status=ok attempt={attempt}");
                    return result;
                }
            }
        }
    }
}
