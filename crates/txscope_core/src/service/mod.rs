//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Run every use case through `ProvideSession`, so callers may pass their
//!   own session or let the service open one.

pub mod task_instance_service;
