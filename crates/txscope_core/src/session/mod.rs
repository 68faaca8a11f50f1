//! Unit-of-work handles and their provisioning.
//!
//! # Responsibility
//! - Define the session handle and session factory contracts.
//! - Resolve whether a call already carries a handle (`binding`).
//! - Own scoped acquisition/commit/rollback/release (`scope`).
//! - Compose scope and retry into the public entry point (`provide`).
//!
//! # Invariants
//! - A handle created by this module is released exactly once.
//! - A caller-supplied handle is never committed or released here.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod binding;
pub mod provide;
pub mod scope;
pub mod sqlite;

/// One database conversation that can be committed or rolled back.
pub trait Session {
    /// Makes pending changes durable.
    fn commit(&mut self) -> Result<(), DbError>;
    /// Discards pending changes. The handle stays usable.
    fn rollback(&mut self) -> Result<(), DbError>;
    /// Releases the handle. Later calls are no-ops.
    fn close(&mut self);
    fn is_open(&self) -> bool;
    fn has_pending_changes(&self) -> bool;
}

/// Produces fresh session handles on demand.
pub trait SessionFactory {
    type Session: Session;

    fn new_session(&self) -> Result<Self::Session, FactoryError>;
}

impl<F: SessionFactory + ?Sized> SessionFactory for &F {
    type Session = F::Session;

    fn new_session(&self) -> Result<Self::Session, FactoryError> {
        (**self).new_session()
    }
}

/// A session factory could not produce a handle.
#[derive(Debug)]
pub struct FactoryError {
    source: DbError,
}

impl FactoryError {
    pub fn new(source: DbError) -> Self {
        Self { source }
    }

    pub fn db_error(&self) -> &DbError {
        &self.source
    }
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to acquire session: {}", self.source)
    }
}

impl Error for FactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl From<DbError> for FactoryError {
    fn from(value: DbError) -> Self {
        Self::new(value)
    }
}
