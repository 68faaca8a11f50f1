//! Task instance domain model.
//!
//! # Responsibility
//! - Describe one scheduled execution of a task within a DAG run.
//! - Validate identity fields before they reach storage.
//!
//! # Invariants
//! - Identity fields are non-empty after trimming.
//! - `try_number` only grows; it is bumped when a run starts.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identity of one task instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskInstanceKey {
    pub dag_id: String,
    pub task_id: String,
    pub run_id: String,
}

impl TaskInstanceKey {
    pub fn new(
        dag_id: impl Into<String>,
        task_id: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            dag_id: dag_id.into(),
            task_id: task_id.into(),
            run_id: run_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), TaskInstanceValidationError> {
        for (field, value) in [
            ("dag_id", &self.dag_id),
            ("task_id", &self.task_id),
            ("run_id", &self.run_id),
        ] {
            if value.trim().is_empty() {
                return Err(TaskInstanceValidationError::EmptyField(field));
            }
        }
        Ok(())
    }
}

impl Display for TaskInstanceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}@{}", self.dag_id, self.task_id, self.run_id)
    }
}

/// Execution state of a task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    Running,
    Success,
    Failed,
    UpForRetry,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::UpForRetry => "up_for_retry",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "up_for_retry" => Some(Self::UpForRetry),
            _ => None,
        }
    }

    /// Whether no further transition is expected.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// One scheduled execution of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInstance {
    #[serde(flatten)]
    pub key: TaskInstanceKey,
    pub state: TaskState,
    pub try_number: u32,
}

impl TaskInstance {
    /// New queued instance that has not been tried yet.
    pub fn queued(key: TaskInstanceKey) -> Self {
        Self {
            key,
            state: TaskState::Queued,
            try_number: 0,
        }
    }

    pub fn validate(&self) -> Result<(), TaskInstanceValidationError> {
        self.key.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskInstanceValidationError {
    EmptyField(&'static str),
}

impl Display for TaskInstanceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "task instance {field} must not be empty"),
        }
    }
}

impl Error for TaskInstanceValidationError {}
