mod common;

use common::{Event, OpError, RecordingFactory, RecordingSession};
use txscope_core::{
    FailureKind, ProvideSession, RetryPolicy, ScopeError, Session, SessionArg, SessionFactory,
};

fn provider(factory: &RecordingFactory, attempts: u32) -> ProvideSession<&RecordingFactory> {
    ProvideSession::with_policy(factory, RetryPolicy::new(attempts).expect("policy"))
}

/// Operation failing transiently on its first `failures` invocations.
fn flaky(
    failures: u32,
) -> impl FnMut(&mut RecordingSession) -> Result<&'static str, OpError> {
    let mut calls = 0;
    move |session: &mut RecordingSession| {
        session.touch();
        calls += 1;
        if calls <= failures {
            Err(OpError::Transient(calls))
        } else {
            Ok("ok")
        }
    }
}

#[test]
fn transient_then_success_commits_once_after_final_attempt() {
    let factory = RecordingFactory::new();

    let value = provider(&factory, 2)
        .run(flaky(1))
        .expect("second attempt should succeed");

    assert_eq!(value, "ok");
    assert_eq!(
        factory.events(),
        vec![
            Event::Open(1),
            Event::Op(1),
            Event::Rollback(1),
            Event::Op(1),
            Event::Commit(1),
            Event::Close(1),
        ]
    );
}

#[test]
fn succeeds_on_nth_attempt_after_n_minus_one_transient_failures() {
    for attempts in 1..=5 {
        let factory = RecordingFactory::new();

        let value = provider(&factory, attempts)
            .run(flaky(attempts - 1))
            .expect("last attempt should succeed");

        assert_eq!(value, "ok");
        assert_eq!(
            factory.count(|event| matches!(event, Event::Op(_))),
            attempts as usize
        );
        assert_eq!(factory.count(|event| matches!(event, Event::Commit(_))), 1);
        assert_eq!(factory.count(|event| matches!(event, Event::Close(_))), 1);
    }
}

#[test]
fn exhaustion_returns_last_transient_failure_and_releases_once() {
    let factory = RecordingFactory::new();

    let err = provider(&factory, 3)
        .run(flaky(u32::MAX))
        .expect_err("every attempt fails");

    assert!(matches!(err, OpError::Transient(3)));
    // Two rollbacks between attempts, one from the scope's error path.
    assert_eq!(
        factory.events(),
        vec![
            Event::Open(1),
            Event::Op(1),
            Event::Rollback(1),
            Event::Op(1),
            Event::Rollback(1),
            Event::Op(1),
            Event::Rollback(1),
            Event::Close(1),
        ]
    );
    assert_eq!(factory.count(|event| matches!(event, Event::Commit(_))), 0);
}

#[test]
fn non_retryable_failure_fails_fast_and_releases() {
    let factory = RecordingFactory::new();

    let err = provider(&factory, 5)
        .run(|session: &mut RecordingSession| -> Result<(), OpError> {
            session.touch();
            Err(OpError::Fatal("bad input"))
        })
        .expect_err("fatal failure must propagate");

    assert!(matches!(err, OpError::Fatal("bad input")));
    assert_eq!(
        factory.events(),
        vec![
            Event::Open(1),
            Event::Op(1),
            Event::Rollback(1),
            Event::Close(1),
        ]
    );
}

#[test]
fn integrity_failures_are_not_retried_by_default_but_can_be_opted_in() {
    let factory = RecordingFactory::new();
    let strict = provider(&factory, 3);
    let err = strict
        .run(|session: &mut RecordingSession| -> Result<(), OpError> {
            session.touch();
            Err(OpError::Integrity)
        })
        .expect_err("integrity failure must propagate");
    assert!(matches!(err, OpError::Integrity));
    assert_eq!(factory.count(|event| matches!(event, Event::Op(_))), 1);

    let factory = RecordingFactory::new();
    let lenient = ProvideSession::with_policy(
        &factory,
        RetryPolicy::new(3)
            .expect("policy")
            .retry_on(FailureKind::Integrity),
    );
    let _ = lenient.run(|session: &mut RecordingSession| -> Result<(), OpError> {
        session.touch();
        Err(OpError::Integrity)
    });
    assert_eq!(factory.count(|event| matches!(event, Event::Op(_))), 3);
}

#[test]
fn factory_failure_propagates_without_invoking_operation() {
    let factory = RecordingFactory::broken();
    let mut invoked = false;

    let err = provider(&factory, 2)
        .run(|_session: &mut RecordingSession| -> Result<(), OpError> {
            invoked = true;
            Ok(())
        })
        .expect_err("factory failure must propagate");

    assert!(matches!(err, OpError::Scope(ScopeError::Factory(_))));
    assert!(!invoked);
    assert!(factory.events().is_empty());
}

#[test]
fn caller_supplied_session_is_never_opened_committed_or_released() {
    let factory = RecordingFactory::new();
    let mut session = factory.new_session().expect("caller session");
    let provider = provider(&factory, 2);

    let value = provider
        .run_with(&mut session, flaky(1))
        .expect("retry on caller session");

    assert_eq!(value, "ok");
    assert_eq!(factory.sessions_opened(), 1);
    assert_eq!(
        factory.events(),
        vec![
            Event::Open(1),
            Event::Op(1),
            Event::Rollback(1),
            Event::Op(1),
        ]
    );
    assert!(session.is_open());
    assert!(session.has_pending_changes());
}

#[test]
fn caller_supplied_session_is_kept_open_on_failure() {
    let factory = RecordingFactory::new();
    let mut session = factory.new_session().expect("caller session");

    let err = provider(&factory, 2)
        .call(
            SessionArg::Positional {
                index: 0,
                session: &mut session,
            },
            |session: &mut RecordingSession| -> Result<(), OpError> {
                session.touch();
                Err(OpError::Fatal("nope"))
            },
        )
        .expect_err("failure must propagate");

    assert!(matches!(err, OpError::Fatal("nope")));
    assert_eq!(factory.events(), vec![Event::Open(1), Event::Op(1)]);
    assert!(session.is_open());
}

#[test]
fn every_absent_call_gets_its_own_session() {
    let factory = RecordingFactory::new();
    let provider = provider(&factory, 2);
    let mut seen = Vec::new();

    for _ in 0..3 {
        let id = provider
            .run(|session: &mut RecordingSession| -> Result<u32, OpError> {
                session.touch();
                Ok(session.id())
            })
            .expect("call succeeds");
        seen.push(id);
    }

    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(factory.count(|event| matches!(event, Event::Close(_))), 3);
}

#[test]
fn failing_rollback_between_attempts_stops_retrying_and_still_releases() {
    let factory = RecordingFactory::with_failing_rollback();

    let err = provider(&factory, 3)
        .run(flaky(u32::MAX))
        .expect_err("rollback failure must surface");

    assert!(matches!(err, OpError::Scope(ScopeError::Rollback(_))));
    assert_eq!(factory.count(|event| matches!(event, Event::Op(_))), 1);
    assert_eq!(factory.count(|event| matches!(event, Event::Close(_))), 1);
}

#[test]
fn wrapped_operation_keeps_optional_session_shape() {
    let factory = RecordingFactory::new();
    let provider = provider(&factory, 2);
    let mut calls = 0;
    let mut wrapped = provider.wrap(|session: &mut RecordingSession| -> Result<u32, OpError> {
        session.touch();
        calls += 1;
        Ok(session.id())
    });

    assert_eq!(wrapped(None).expect("scoped call"), 1);

    let mut own = factory.new_session().expect("caller session");
    assert_eq!(wrapped(Some(&mut own)).expect("supplied call"), 2);
    drop(wrapped);

    assert_eq!(calls, 2);
    assert_eq!(
        factory.events(),
        vec![
            Event::Open(1),
            Event::Op(1),
            Event::Commit(1),
            Event::Close(1),
            Event::Open(2),
            Event::Op(2),
        ]
    );
}
