//! Recording session doubles shared by integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use txscope_core::{
    ClassifyFailure, DbError, FactoryError, FailureKind, ScopeError, Session, SessionFactory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Open(u32),
    Op(u32),
    Commit(u32),
    Rollback(u32),
    Close(u32),
}

type EventLog = Rc<RefCell<Vec<Event>>>;

pub struct RecordingSession {
    id: u32,
    events: EventLog,
    open: bool,
    dirty: bool,
    fail_rollback: bool,
}

impl RecordingSession {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Marks one operation invocation against this session.
    pub fn touch(&mut self) {
        self.dirty = true;
        self.events.borrow_mut().push(Event::Op(self.id));
    }
}

impl Session for RecordingSession {
    fn commit(&mut self) -> Result<(), DbError> {
        self.events.borrow_mut().push(Event::Commit(self.id));
        self.dirty = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        self.events.borrow_mut().push(Event::Rollback(self.id));
        if self.fail_rollback {
            return Err(DbError::SessionClosed);
        }
        self.dirty = false;
        Ok(())
    }

    fn close(&mut self) {
        self.events.borrow_mut().push(Event::Close(self.id));
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn has_pending_changes(&self) -> bool {
        self.dirty
    }
}

#[derive(Default)]
pub struct RecordingFactory {
    events: EventLog,
    next_id: Cell<u32>,
    broken: bool,
    fail_rollback: bool,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose `new_session` always fails.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// Factory whose sessions fail every rollback.
    pub fn with_failing_rollback() -> Self {
        Self {
            fail_rollback: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.borrow().iter().filter(|event| matches(event)).count()
    }

    pub fn sessions_opened(&self) -> usize {
        self.count(|event| matches!(event, Event::Open(_)))
    }
}

impl SessionFactory for RecordingFactory {
    type Session = RecordingSession;

    fn new_session(&self) -> Result<RecordingSession, FactoryError> {
        if self.broken {
            return Err(FactoryError::new(DbError::SessionClosed));
        }
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.events.borrow_mut().push(Event::Open(id));
        Ok(RecordingSession {
            id,
            events: Rc::clone(&self.events),
            open: true,
            dirty: false,
            fail_rollback: self.fail_rollback,
        })
    }
}

/// Operation error with a caller-chosen classification.
#[derive(Debug)]
pub enum OpError {
    Transient(u32),
    Integrity,
    Fatal(&'static str),
    Scope(ScopeError),
}

impl ClassifyFailure for OpError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transient(_) => FailureKind::TransientStore,
            Self::Integrity => FailureKind::Integrity,
            Self::Fatal(_) | Self::Scope(_) => FailureKind::Other,
        }
    }
}

impl From<ScopeError> for OpError {
    fn from(value: ScopeError) -> Self {
        Self::Scope(value)
    }
}
