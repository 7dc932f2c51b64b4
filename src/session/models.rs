/*!
 * Session record for one operator-driven range transfer.
 */

use crate::errors::SessionError;
use crate::transport::{StatusMessage, ThreadId};

/// Closed interval of source positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRange {
    start: i64,
    end: i64,
}

impl PositionRange {
    /// Create a range, rejecting `end < start`
    pub fn new(start: i64, end: i64) -> Result<Self, SessionError> {
        if end < start {
            return Err(SessionError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of positions, both ends included
    pub fn total(&self) -> u64 {
        (self.end - self.start) as u64 + 1
    }

    /// Positions in increasing order
    pub fn positions(&self) -> std::ops::RangeInclusive<i64> {
        self.start..=self.end
    }
}

/// Which operator input the session expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing in progress
    Idle,
    /// Topic named, thread creation pending
    CreatingThread,
    /// Thread exists, waiting for the start reference
    AwaitingStart,
    /// Start known, waiting for the end reference
    AwaitingEnd,
    /// Range complete, waiting for the range task to start
    RangeReady,
    /// A range task owns the progress message
    Transferring,
}

/// What a reference did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceStep {
    /// The reference became the start position
    StartRecorded(i64),
    /// The reference closed the range
    RangeComplete(PositionRange),
}

/// The single in-flight session
///
/// Fields are only changed through the transition methods, which keep the
/// ordering invariants: a thread before references, a start before an end,
/// an end never before the start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    topic_name: Option<String>,
    thread_id: Option<ThreadId>,
    start_position: Option<i64>,
    end_position: Option<i64>,
    progress_handle: Option<StatusMessage>,
}

impl Session {
    pub fn topic_name(&self) -> Option<&str> {
        self.topic_name.as_deref()
    }

    pub fn thread_id(&self) -> Option<ThreadId> {
        self.thread_id
    }

    pub fn start_position(&self) -> Option<i64> {
        self.start_position
    }

    pub fn end_position(&self) -> Option<i64> {
        self.end_position
    }

    pub fn progress_handle(&self) -> Option<StatusMessage> {
        self.progress_handle
    }

    /// Whether every field is unset
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        match (
            &self.topic_name,
            self.thread_id,
            self.start_position,
            self.end_position,
            self.progress_handle,
        ) {
            (_, _, _, _, Some(_)) => SessionPhase::Transferring,
            (_, _, _, Some(_), None) => SessionPhase::RangeReady,
            (_, Some(_), Some(_), None, None) => SessionPhase::AwaitingEnd,
            (_, Some(_), None, None, None) => SessionPhase::AwaitingStart,
            (Some(_), None, _, _, _) => SessionPhase::CreatingThread,
            _ => SessionPhase::Idle,
        }
    }

    /// Whether a range has been handed to, or is owned by, a range task
    pub fn is_transfer_active(&self) -> bool {
        matches!(self.phase(), SessionPhase::RangeReady | SessionPhase::Transferring)
    }

    /// Start a new session named `name`, discarding any previous one
    pub fn begin(&mut self, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyTopicName);
        }
        if self.is_transfer_active() {
            return Err(SessionError::TransferInProgress);
        }
        self.reset();
        self.topic_name = Some(name.to_string());
        Ok(())
    }

    /// Record the thread created for the current topic
    pub fn attach_thread(&mut self, thread_id: ThreadId) {
        self.thread_id = Some(thread_id);
    }

    /// Apply a parsed reference: first the start, then the end
    ///
    /// An end before the start resets the whole session.
    pub fn record_reference(&mut self, position: i64) -> Result<ReferenceStep, SessionError> {
        if self.thread_id.is_none() {
            return Err(SessionError::NoThread);
        }
        if self.is_transfer_active() {
            return Err(SessionError::TransferInProgress);
        }

        match self.start_position {
            None => {
                self.start_position = Some(position);
                Ok(ReferenceStep::StartRecorded(position))
            }
            Some(start) => match PositionRange::new(start, position) {
                Ok(range) => {
                    self.end_position = Some(position);
                    Ok(ReferenceStep::RangeComplete(range))
                }
                Err(e) => {
                    self.reset();
                    Err(e)
                }
            },
        }
    }

    /// Record the status message handed to the range task
    pub fn attach_progress(&mut self, status: StatusMessage) {
        self.progress_handle = Some(status);
    }

    /// Return every field to unset
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
