//! Resolution of caller-supplied session handles.
//!
//! Operations follow one convention: a parameter named `session` carries
//! the handle when the caller already has one. Name-based adapters use
//! [`resolve_call_binding`]; typed callers pass a [`SessionArg`] directly.

/// Conventional parameter name for the session handle.
pub const SESSION_PARAM: &str = "session";

/// Where, if anywhere, a call supplies the session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallBinding {
    /// Supplied positionally at this index.
    ExplicitPositional(usize),
    /// Supplied by name.
    ExplicitNamed,
    /// Not supplied; a scope must provide one.
    Absent,
}

impl CallBinding {
    pub fn is_supplied(self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Stable id used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExplicitPositional(_) => "explicit_positional",
            Self::ExplicitNamed => "explicit_named",
            Self::Absent => "absent",
        }
    }
}

/// Decides whether one call satisfies the `session` parameter.
///
/// `declared` lists parameter names in order, `positional_count` is the
/// number of positional arguments of the call and `named` the names of its
/// keyword arguments. A named `session` takes precedence.
pub fn resolve_call_binding<I, K>(
    declared: &[&str],
    positional_count: usize,
    named: I,
) -> CallBinding
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    if named.into_iter().any(|name| name.as_ref() == SESSION_PARAM) {
        return CallBinding::ExplicitNamed;
    }

    match declared.iter().position(|name| *name == SESSION_PARAM) {
        Some(index) if index < positional_count => CallBinding::ExplicitPositional(index),
        _ => CallBinding::Absent,
    }
}

/// Typed form of a call's session argument, carrying the handle itself.
#[derive(Debug)]
pub enum SessionArg<'s, S> {
    Positional { index: usize, session: &'s mut S },
    Named(&'s mut S),
    Absent,
}

impl<'s, S> SessionArg<'s, S> {
    pub fn binding(&self) -> CallBinding {
        match self {
            Self::Positional { index, .. } => CallBinding::ExplicitPositional(*index),
            Self::Named(_) => CallBinding::ExplicitNamed,
            Self::Absent => CallBinding::Absent,
        }
    }

    /// Yields the supplied handle value, if any.
    pub fn into_session(self) -> Option<&'s mut S> {
        match self {
            Self::Positional { session, .. } | Self::Named(session) => Some(session),
            Self::Absent => None,
        }
    }
}

impl<'s, S> From<Option<&'s mut S>> for SessionArg<'s, S> {
    fn from(value: Option<&'s mut S>) -> Self {
        value.map_or(Self::Absent, Self::Named)
    }
}
