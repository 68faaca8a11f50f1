//! Failure classification used by the retry layer.
//!
//! # Responsibility
//! - Map concrete store errors onto a small, stable taxonomy.
//! - Let retry policies decide by kind instead of by concrete error type.
//!
//! # Invariants
//! - Only `TransientStore` failures are retryable under the default policy.
//! - Classification is a pure function of the error value.

use crate::db::DbError;
use rusqlite::ErrorCode;
use serde::{Deserialize, Serialize};

/// Classification of one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Lock conflict or connectivity problem likely cured by trying again.
    TransientStore,
    /// Constraint violation. Retrying cannot change the outcome.
    Integrity,
    /// Anything else, including programming errors.
    Other,
}

impl FailureKind {
    /// Stable id used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransientStore => "transient_store",
            Self::Integrity => "integrity",
            Self::Other => "other",
        }
    }
}

/// Errors that can be routed through the retry layer.
pub trait ClassifyFailure {
    fn failure_kind(&self) -> FailureKind;
}

impl ClassifyFailure for rusqlite::Error {
    fn failure_kind(&self) -> FailureKind {
        match self.sqlite_error_code() {
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::FileLockingProtocolFailed,
            ) => FailureKind::TransientStore,
            Some(ErrorCode::ConstraintViolation) => FailureKind::Integrity,
            _ => FailureKind::Other,
        }
    }
}

impl ClassifyFailure for DbError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Sqlite(err) => err.failure_kind(),
            Self::UnsupportedSchemaVersion { .. } | Self::SessionClosed => FailureKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassifyFailure, FailureKind};
    use crate::db::DbError;
    use rusqlite::ffi;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn busy_and_locked_are_transient() {
        assert_eq!(
            sqlite_failure(ffi::SQLITE_BUSY).failure_kind(),
            FailureKind::TransientStore
        );
        assert_eq!(
            sqlite_failure(ffi::SQLITE_LOCKED).failure_kind(),
            FailureKind::TransientStore
        );
        assert_eq!(
            DbError::Sqlite(sqlite_failure(ffi::SQLITE_IOERR)).failure_kind(),
            FailureKind::TransientStore
        );
    }

    #[test]
    fn constraint_violation_is_integrity() {
        assert_eq!(
            sqlite_failure(ffi::SQLITE_CONSTRAINT).failure_kind(),
            FailureKind::Integrity
        );
    }

    #[test]
    fn non_store_errors_are_other() {
        assert_eq!(
            rusqlite::Error::QueryReturnedNoRows.failure_kind(),
            FailureKind::Other
        );
        assert_eq!(DbError::SessionClosed.failure_kind(), FailureKind::Other);
        assert_eq!(
            DbError::UnsupportedSchemaVersion {
                db_version: 9,
                latest_supported: 1,
            }
            .failure_kind(),
            FailureKind::Other
        );
    }

    #[test]
    fn kind_ids_are_stable() {
        assert_eq!(FailureKind::TransientStore.as_str(), "transient_store");
        assert_eq!(
            serde_json::to_value(FailureKind::Integrity).expect("serialize kind"),
            "integrity"
        );
    }
}
