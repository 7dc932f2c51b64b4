/*!
 * Tests for the session state machine and its shared slot
 */

use topic_relay::errors::SessionError;
use topic_relay::session::{PositionRange, ReferenceStep, Session, SessionPhase, SessionSlot};
use topic_relay::transport::{StatusMessage, ThreadId};

fn session_with_thread(name: &str) -> Session {
    let mut session = Session::default();
    session.begin(name).unwrap();
    session.attach_thread(ThreadId(12));
    session
}

#[test]
fn test_session_fullConversation_shouldWalkThroughPhases() {
    let mut session = Session::default();
    assert_eq!(session.phase(), SessionPhase::Idle);

    session.begin("Season 1").unwrap();
    assert_eq!(session.phase(), SessionPhase::CreatingThread);

    session.attach_thread(ThreadId(12));
    assert_eq!(session.phase(), SessionPhase::AwaitingStart);

    assert_eq!(session.record_reference(10), Ok(ReferenceStep::StartRecorded(10)));
    assert_eq!(session.phase(), SessionPhase::AwaitingEnd);

    let range = PositionRange::new(10, 10).unwrap();
    assert_eq!(session.record_reference(10), Ok(ReferenceStep::RangeComplete(range)));
    assert_eq!(range.total(), 1);
    assert_eq!(session.phase(), SessionPhase::RangeReady);

    session.attach_progress(StatusMessage { chat_id: 1, message_id: 2 });
    assert_eq!(session.phase(), SessionPhase::Transferring);
    assert!(session.is_transfer_active());

    session.reset();
    assert!(session.is_idle());
}

#[test]
fn test_session_endBeforeStart_shouldResetEverything() {
    let mut session = session_with_thread("Archive");
    session.record_reference(100).unwrap();

    let result = session.record_reference(90);
    assert_eq!(result, Err(SessionError::EndBeforeStart { start: 100, end: 90 }));
    assert!(session.is_idle());
    assert_eq!(session.topic_name(), None);
}

#[test]
fn test_session_beginWithTrimmedName_shouldStoreTrimmed() {
    let mut session = Session::default();
    session.begin("  Notes  ").unwrap();
    assert_eq!(session.topic_name(), Some("Notes"));
}

#[test]
fn test_positionRange_positions_shouldBeStrictlyIncreasing() {
    let range = PositionRange::new(3, 7).unwrap();
    let positions: Vec<i64> = range.positions().collect();
    assert_eq!(positions, vec![3, 4, 5, 6, 7]);
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(range.total(), positions.len() as u64);
}

#[test]
fn test_sessionSlot_resetOnIdle_shouldBeNoOp() {
    let slot = SessionSlot::new();
    slot.reset();
    let session = slot.snapshot();
    assert!(session.is_idle());
    assert_eq!(session.thread_id(), None);
    assert_eq!(session.start_position(), None);
    assert_eq!(session.end_position(), None);
    assert_eq!(session.progress_handle(), None);
}

#[test]
fn test_sessionSlot_resetFromOtherThread_shouldBeVisible() {
    let slot = SessionSlot::new();
    slot.with(|session| {
        session.begin("Threaded").unwrap();
        session.attach_thread(ThreadId(1));
    });

    let task_side = slot.clone();
    std::thread::spawn(move || task_side.reset()).join().unwrap();

    assert_eq!(slot.phase(), SessionPhase::Idle);
}
