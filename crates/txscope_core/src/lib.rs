//! Transactional session provisioning with bounded retry.
//!
//! Operations receive a unit-of-work handle either from their caller or from
//! a scope opened on their behalf. Scoped handles are committed on success,
//! rolled back on failure and always released; transient store failures are
//! retried a bounded number of times with a rollback in between.

pub mod auth;
pub mod db;
pub mod failure;
pub mod logging;
pub mod model;
pub mod repo;
pub mod retry;
pub mod service;
pub mod session;

pub use auth::gate::{
    guarded, AccessDenied, AllowAllGate, AuthorizationGate, CallerIdentity, Decision,
};
pub use db::{DbError, DbResult};
pub use failure::{ClassifyFailure, FailureKind};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task_instance::{
    TaskInstance, TaskInstanceKey, TaskInstanceValidationError, TaskState,
};
pub use repo::task_instance_repo::{
    RepoError, RepoResult, SqliteTaskInstanceRepository, TaskInstanceRepository,
};
pub use retry::executor::{AttemptOutcome, AttemptState, RetryableExecutor};
pub use retry::policy::{ConfigError, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use service::task_instance_service::TaskInstanceService;
pub use session::binding::{resolve_call_binding, CallBinding, SessionArg, SESSION_PARAM};
pub use session::provide::ProvideSession;
pub use session::scope::{with_new_session, ScopeError, SessionScope};
pub use session::sqlite::{SessionConfig, SqliteSession, SqliteSessionFactory};
pub use session::{FactoryError, Session, SessionFactory};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
