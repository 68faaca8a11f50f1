//! Caller identity and the authorization gate seam.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Who is calling, as far as the gate is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub name: String,
    pub roles: BTreeSet<String>,
}

impl CallerIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Comma-joined role list in stable order, for log events.
    pub fn roles_label(&self) -> String {
        self.roles.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }
}

/// Gate verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Capability check run before a protected operation.
pub trait AuthorizationGate {
    fn authorize(&self, caller: &CallerIdentity) -> Decision;
}

/// Default backend: every caller is allowed.
///
/// Emits one `authorize` event with the caller name and roles per check;
/// nothing is enforced.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllGate;

impl AuthorizationGate for AllowAllGate {
    fn authorize(&self, caller: &CallerIdentity) -> Decision {
        info!(
            "event=authorize module=auth status=allow caller={} roles={}",
            caller.name,
            caller.roles_label()
        );
        Decision::Allow
    }
}

/// Returned by [`guarded`] when a gate denies the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub caller: String,
    pub reason: String,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "access denied for `{}`: {}", self.caller, self.reason)
    }
}

impl Error for AccessDenied {}

/// Consults `gate`, then runs `op` only when the caller is allowed.
pub fn guarded<G, T>(
    gate: &G,
    caller: &CallerIdentity,
    op: impl FnOnce() -> T,
) -> Result<T, AccessDenied>
where
    G: AuthorizationGate + ?Sized,
{
    match gate.authorize(caller) {
        Decision::Allow => Ok(op()),
        Decision::Deny { reason } => Err(AccessDenied {
            caller: caller.name.clone(),
            reason,
        }),
    }
}
