//! Task instance repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `task_instances` storage.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate identity before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::failure::{ClassifyFailure, FailureKind};
use crate::model::task_instance::{
    TaskInstance, TaskInstanceKey, TaskInstanceValidationError, TaskState,
};
use crate::session::scope::ScopeError;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_INSTANCE_SELECT_SQL: &str = "SELECT
    dag_id,
    task_id,
    run_id,
    state,
    try_number
FROM task_instances";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for task instance persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskInstanceValidationError),
    Db(DbError),
    Scope(ScopeError),
    NotFound(TaskInstanceKey),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Scope(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "task instance not found: {key}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted task instance data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Scope(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl ClassifyFailure for RepoError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Db(err) => err.failure_kind(),
            Self::Scope(err) => err.failure_kind(),
            Self::Validation(_) | Self::NotFound(_) | Self::InvalidData(_) => FailureKind::Other,
        }
    }
}

impl From<TaskInstanceValidationError> for RepoError {
    fn from(value: TaskInstanceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ScopeError> for RepoError {
    fn from(value: ScopeError) -> Self {
        Self::Scope(value)
    }
}

/// Repository interface for task instance operations.
pub trait TaskInstanceRepository {
    /// Inserts or replaces the row for `instance.key`.
    fn upsert(&self, instance: &TaskInstance) -> RepoResult<()>;
    fn get(&self, key: &TaskInstanceKey) -> RepoResult<Option<TaskInstance>>;
    fn list_by_dag(&self, dag_id: &str) -> RepoResult<Vec<TaskInstance>>;
    /// Moves an existing instance to `state`; entering `Running` bumps
    /// `try_number`.
    fn set_state(&self, key: &TaskInstanceKey, state: TaskState) -> RepoResult<TaskInstance>;
}

/// SQLite-backed task instance repository.
pub struct SqliteTaskInstanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskInstanceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskInstanceRepository for SqliteTaskInstanceRepository<'_> {
    fn upsert(&self, instance: &TaskInstance) -> RepoResult<()> {
        instance.validate()?;

        self.conn.execute(
            "INSERT INTO task_instances (dag_id, task_id, run_id, state, try_number)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (dag_id, task_id, run_id) DO UPDATE SET
                state = excluded.state,
                try_number = excluded.try_number,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                instance.key.dag_id,
                instance.key.task_id,
                instance.key.run_id,
                instance.state.as_str(),
                instance.try_number,
            ],
        )?;

        Ok(())
    }

    fn get(&self, key: &TaskInstanceKey) -> RepoResult<Option<TaskInstance>> {
        key.validate()?;

        let mut stmt = self.conn.prepare(&format!(
            "{TASK_INSTANCE_SELECT_SQL}
             WHERE dag_id = ?1 AND task_id = ?2 AND run_id = ?3;"
        ))?;
        let mut rows = stmt.query(params![key.dag_id, key.task_id, key.run_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_instance_row(row)?));
        }

        Ok(None)
    }

    fn list_by_dag(&self, dag_id: &str) -> RepoResult<Vec<TaskInstance>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_INSTANCE_SELECT_SQL}
             WHERE dag_id = ?1
             ORDER BY run_id ASC, task_id ASC;"
        ))?;
        let mut rows = stmt.query([dag_id])?;
        let mut instances = Vec::new();

        while let Some(row) = rows.next()? {
            instances.push(parse_task_instance_row(row)?);
        }

        Ok(instances)
    }

    fn set_state(&self, key: &TaskInstanceKey, state: TaskState) -> RepoResult<TaskInstance> {
        key.validate()?;

        let changed = self.conn.execute(
            "UPDATE task_instances
             SET
                state = ?1,
                try_number = try_number + ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE dag_id = ?3 AND task_id = ?4 AND run_id = ?5;",
            params![
                state.as_str(),
                i64::from(state == TaskState::Running),
                key.dag_id,
                key.task_id,
                key.run_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(key.clone()));
        }

        self.get(key)?
            .ok_or_else(|| RepoError::NotFound(key.clone()))
    }
}

fn parse_task_instance_row(row: &Row<'_>) -> RepoResult<TaskInstance> {
    let state_text: String = row.get("state")?;
    let state = TaskState::parse(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid state `{state_text}` in task_instances.state"
        ))
    })?;

    let try_number = row.get::<_, i64>("try_number")?;
    let try_number = u32::try_from(try_number).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid try_number `{try_number}` in task_instances.try_number"
        ))
    })?;

    let instance = TaskInstance {
        key: TaskInstanceKey {
            dag_id: row.get("dag_id")?,
            task_id: row.get("task_id")?,
            run_id: row.get("run_id")?,
        },
        state,
        try_number,
    };
    instance.validate()?;
    Ok(instance)
}
