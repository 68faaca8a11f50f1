//! Scoped ownership of one factory-created session.
//!
//! # Responsibility
//! - Acquire a handle from a `SessionFactory`.
//! - Commit on success, roll back on failure.
//! - Release the handle on every exit path, including unwinding.
//!
//! # Invariants
//! - `release` runs exactly once per acquired handle.
//! - A failing commit or rollback never skips the release.
//! - The operation's own error wins over a secondary rollback error.

use super::{FactoryError, Session, SessionFactory};
use crate::db::DbError;
use crate::failure::{ClassifyFailure, FailureKind};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lifecycle failures raised by the scope itself.
#[derive(Debug)]
pub enum ScopeError {
    Factory(FactoryError),
    Commit(DbError),
    Rollback(DbError),
}

impl Display for ScopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Factory(err) => write!(f, "{err}"),
            Self::Commit(err) => write!(f, "session commit failed: {err}"),
            Self::Rollback(err) => write!(f, "session rollback failed: {err}"),
        }
    }
}

impl Error for ScopeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Factory(err) => Some(err),
            Self::Commit(err) | Self::Rollback(err) => Some(err),
        }
    }
}

impl From<FactoryError> for ScopeError {
    fn from(value: FactoryError) -> Self {
        Self::Factory(value)
    }
}

// Lifecycle failures are never worth another attempt: acquisition failed
// outright, or the handle is in an unknown state.
impl ClassifyFailure for ScopeError {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Other
    }
}

/// Owns one factory-created session until the scope ends.
pub struct SessionScope<S: Session> {
    session: S,
    released: bool,
}

impl<S: Session> SessionScope<S> {
    /// Requests a new handle from `factory`.
    ///
    /// # Errors
    /// - Returns `ScopeError::Factory` immediately when the factory fails.
    pub fn acquire<F>(factory: &F) -> Result<Self, ScopeError>
    where
        F: SessionFactory<Session = S> + ?Sized,
    {
        match factory.new_session() {
            Ok(session) => {
                debug!("event=session_acquire module=session status=ok");
                Ok(Self {
                    session,
                    released: false,
                })
            }
            Err(err) => {
                error!(
                    "event=session_acquire module=session status=error error={}",
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Borrows the owned handle for binding into an operation.
    pub fn session(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn commit(&mut self) -> Result<(), ScopeError> {
        self.session.commit().map_err(|err| {
            error!("event=session_commit module=session status=error error={err}");
            ScopeError::Commit(err)
        })?;
        debug!("event=session_commit module=session status=ok");
        Ok(())
    }

    pub fn rollback(&mut self) -> Result<(), ScopeError> {
        self.session.rollback().map_err(|err| {
            error!("event=session_rollback module=session status=error error={err}");
            ScopeError::Rollback(err)
        })?;
        debug!("event=session_rollback module=session status=ok");
        Ok(())
    }

    /// Ends the scope according to the operation outcome.
    ///
    /// - `Ok`: commits; a failing commit is rolled back and reported.
    /// - `Err`: rolls back and returns the original error.
    ///
    /// The handle is released before this returns.
    pub fn finish<T, E>(mut self, outcome: Result<T, E>) -> Result<T, E>
    where
        E: From<ScopeError>,
    {
        let result = match outcome {
            Ok(value) => match self.commit() {
                Ok(()) => Ok(value),
                Err(commit_err) => {
                    self.rollback_after_failure();
                    Err(E::from(commit_err))
                }
            },
            Err(err) => {
                self.rollback_after_failure();
                Err(err)
            }
        };
        self.release();
        result
    }

    /// Releases the handle now instead of at drop.
    pub fn release(mut self) {
        self.release_once();
    }

    fn rollback_after_failure(&mut self) {
        if let Err(err) = self.rollback() {
            warn!("event=session_rollback module=session status=suppressed error={err}");
        }
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.session.close();
        debug!("event=session_release module=session status=ok");
    }
}

impl<S: Session> Drop for SessionScope<S> {
    fn drop(&mut self) {
        self.release_once();
    }
}

/// Runs `op` inside a fresh scope without retries.
///
/// Commits when `op` returns `Ok`, rolls back when it returns `Err`, and
/// releases the handle in both cases.
pub fn with_new_session<F, T, E, Op>(factory: &F, op: Op) -> Result<T, E>
where
    F: SessionFactory + ?Sized,
    E: From<ScopeError>,
    Op: FnOnce(&mut F::Session) -> Result<T, E>,
{
    let mut scope = SessionScope::acquire(factory)?;
    let outcome = op(scope.session());
    scope.finish(outcome)
}
