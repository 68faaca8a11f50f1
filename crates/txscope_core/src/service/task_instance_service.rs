//! Task instance use-case service.
//!
//! # Responsibility
//! - Provide task instance entry points that accept an optional session.
//! - Delegate persistence to the SQLite repository.
//!
//! # Invariants
//! - With `session = None`, each call is its own committed transaction and
//!   is retried on transient store failures.
//! - With `session = Some(..)`, nothing is committed; the caller decides.

use crate::model::task_instance::{TaskInstance, TaskInstanceKey, TaskState};
use crate::repo::task_instance_repo::{
    RepoResult, SqliteTaskInstanceRepository, TaskInstanceRepository,
};
use crate::session::provide::ProvideSession;
use crate::session::sqlite::SqliteSession;
use crate::session::SessionFactory;

/// Use-case service for task instance bookkeeping.
pub struct TaskInstanceService<F> {
    provider: ProvideSession<F>,
}

impl<F: SessionFactory<Session = SqliteSession>> TaskInstanceService<F> {
    pub fn new(provider: ProvideSession<F>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &ProvideSession<F> {
        &self.provider
    }

    /// Inserts or replaces one task instance.
    pub fn record(
        &self,
        session: Option<&mut SqliteSession>,
        instance: &TaskInstance,
    ) -> RepoResult<()> {
        self.provider.call(session.into(), |session| {
            SqliteTaskInstanceRepository::new(session.connection()?).upsert(instance)
        })
    }

    pub fn get(
        &self,
        session: Option<&mut SqliteSession>,
        key: &TaskInstanceKey,
    ) -> RepoResult<Option<TaskInstance>> {
        self.provider.call(session.into(), |session| {
            SqliteTaskInstanceRepository::new(session.connection()?).get(key)
        })
    }

    pub fn list_by_dag(
        &self,
        session: Option<&mut SqliteSession>,
        dag_id: &str,
    ) -> RepoResult<Vec<TaskInstance>> {
        self.provider.call(session.into(), |session| {
            SqliteTaskInstanceRepository::new(session.connection()?).list_by_dag(dag_id)
        })
    }

    /// Moves an existing instance to `state` and returns the stored row.
    ///
    /// Returns `RepoError::NotFound` unchanged; it is never retried.
    pub fn set_state(
        &self,
        session: Option<&mut SqliteSession>,
        key: &TaskInstanceKey,
        state: TaskState,
    ) -> RepoResult<TaskInstance> {
        self.provider.call(session.into(), |session| {
            SqliteTaskInstanceRepository::new(session.connection()?).set_state(key, state)
        })
    }
}
