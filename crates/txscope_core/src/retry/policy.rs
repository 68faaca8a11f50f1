//! Retry policy configuration.

use crate::failure::FailureKind;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Total attempts allowed when callers do not override it.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Construction-time retry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    retryable: BTreeSet<FailureKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retryable: BTreeSet::from([FailureKind::TransientStore]),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with `max_attempts` total attempts and the default
    /// retryable set.
    ///
    /// # Errors
    /// - `ConfigError::ZeroAttempts` when `max_attempts` is 0.
    pub fn new(max_attempts: u32) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            ..Self::default()
        })
    }

    /// Policy that never retries.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Replaces the retryable set.
    pub fn with_retryable(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.retryable = kinds.into_iter().collect();
        self
    }

    pub fn retry_on(mut self, kind: FailureKind) -> Self {
        self.retryable.insert(kind);
        self
    }

    pub fn without(mut self, kind: FailureKind) -> Self {
        self.retryable.remove(&kind);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_retryable(&self, kind: FailureKind) -> bool {
        self.retryable.contains(&kind)
    }

    pub fn retryable_kinds(&self) -> impl Iterator<Item = FailureKind> + '_ {
        self.retryable.iter().copied()
    }
}

/// Rejected retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ZeroAttempts,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroAttempts => write!(f, "retry policy needs at least one attempt"),
        }
    }
}

impl Error for ConfigError {}
