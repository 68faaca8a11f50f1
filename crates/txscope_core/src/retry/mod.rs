//! Bounded retry of session-bound operations.
//!
//! # Responsibility
//! - Hold the retry configuration (`policy`).
//! - Drive attempts through an explicit state machine (`executor`).
//!
//! # Invariants
//! - Only failures whose kind the policy marks retryable consume budget.
//! - Attempts are sequential and immediate; there is no backoff.

pub mod executor;
pub mod policy;
