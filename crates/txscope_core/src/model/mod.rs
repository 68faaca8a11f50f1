//! Domain records persisted through provided sessions.
//!
//! # Invariants
//! - A task instance is identified by `(dag_id, task_id, run_id)`.
//! - State strings stored in SQLite match the serde names of `TaskState`.

pub mod task_instance;
