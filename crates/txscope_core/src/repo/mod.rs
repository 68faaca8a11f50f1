//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories borrow a connection; they never commit or roll back.
//!   Transaction boundaries belong to the session that lent the connection.

pub mod task_instance_repo;
