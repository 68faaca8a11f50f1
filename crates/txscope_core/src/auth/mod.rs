//! Authorization gate contracts.
//!
//! Callers consult a gate before reaching a protected operation. The only
//! backend shipped here allows everything and records who asked; real
//! enforcement plugs in through `AuthorizationGate`.

pub mod gate;
