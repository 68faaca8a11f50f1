//! Public entry point: run an operation with a provided session.
//!
//! # Responsibility
//! - Reuse a caller-supplied handle as-is, or open a scoped one.
//! - Route every attempt through `RetryableExecutor`.
//!
//! # Invariants
//! - Caller-supplied handles are never committed or released here; they are
//!   only rolled back between transient failures.
//! - Scoped handles are committed at most once, after the final successful
//!   attempt, and released exactly once.

use super::binding::SessionArg;
use super::scope::{ScopeError, SessionScope};
use super::SessionFactory;
use crate::failure::ClassifyFailure;
use crate::retry::executor::RetryableExecutor;
use crate::retry::policy::RetryPolicy;
use log::debug;

/// Wraps operations with session provisioning and bounded retry.
///
/// The factory is an explicit dependency, so each instance can point at its
/// own store or at a test double.
#[derive(Debug, Clone)]
pub struct ProvideSession<F> {
    factory: F,
    policy: RetryPolicy,
}

impl<F: SessionFactory> ProvideSession<F> {
    /// Uses the default policy (2 attempts, transient store failures).
    pub fn new(factory: F) -> Self {
        Self::with_policy(factory, RetryPolicy::default())
    }

    pub fn with_policy(factory: F, policy: RetryPolicy) -> Self {
        Self { factory, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Runs `op` with the session described by `session`.
    ///
    /// - Supplied handle: attempts run directly against it.
    /// - Absent: a scope opens a handle, attempts run against it, then the
    ///   scope commits (on `Ok`) or rolls back (on `Err`) and releases it.
    ///
    /// Returns what `op` returns, or the error it raised, after the lifecycle
    /// above has completed.
    pub fn call<T, E, Op>(&self, session: SessionArg<'_, F::Session>, op: Op) -> Result<T, E>
    where
        E: ClassifyFailure + From<ScopeError>,
        Op: FnMut(&mut F::Session) -> Result<T, E>,
    {
        let binding = session.binding();
        let executor = RetryableExecutor::new(&self.policy);

        match session.into_session() {
            Some(session) => {
                debug!(
                    "event=provide_session module=session status=reuse binding={}",
                    binding.as_str()
                );
                executor.execute(session, op)
            }
            None => {
                debug!(
                    "event=provide_session module=session status=scoped binding={}",
                    binding.as_str()
                );
                let mut scope = SessionScope::acquire(&self.factory)?;
                let outcome = executor.execute(scope.session(), op);
                scope.finish(outcome)
            }
        }
    }

    /// Always opens a new scoped session.
    pub fn run<T, E, Op>(&self, op: Op) -> Result<T, E>
    where
        E: ClassifyFailure + From<ScopeError>,
        Op: FnMut(&mut F::Session) -> Result<T, E>,
    {
        self.call(SessionArg::Absent, op)
    }

    /// Always uses the caller's session.
    pub fn run_with<T, E, Op>(&self, session: &mut F::Session, op: Op) -> Result<T, E>
    where
        E: ClassifyFailure + From<ScopeError>,
        Op: FnMut(&mut F::Session) -> Result<T, E>,
    {
        self.call(SessionArg::Named(session), op)
    }

    /// Turns `op` into an operation taking an optional session.
    ///
    /// The returned closure behaves like [`ProvideSession::call`] with
    /// `Some` mapped to a supplied handle and `None` to a scoped one.
    pub fn wrap<'a, T, E, Op>(
        &'a self,
        mut op: Op,
    ) -> impl FnMut(Option<&mut F::Session>) -> Result<T, E> + 'a
    where
        T: 'a,
        E: ClassifyFailure + From<ScopeError> + 'a,
        Op: FnMut(&mut F::Session) -> Result<T, E> + 'a,
    {
        move |session: Option<&mut F::Session>| self.call(SessionArg::from(session), &mut op)
    }
}
