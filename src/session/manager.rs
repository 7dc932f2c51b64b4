/*!
 * Single-slot owner of the session record.
 *
 * The command handler and the background range task both hold a clone of
 * the same `SessionSlot`. The handler writes the session until the range task
 * is launched; from then on the only write is the task's terminating reset.
 * The lock is never held across an await point.
 */

use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

use super::models::{Session, SessionPhase};

/// Shared handle on the one session of the process
#[derive(Debug, Clone, Default)]
pub struct SessionSlot {
    inner: Arc<Mutex<Session>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the session
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.inner.lock();
        f(&mut session)
    }

    /// Copy of the current session
    pub fn snapshot(&self) -> Session {
        self.inner.lock().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.lock().phase()
    }

    /// Return the session to the idle state
    pub fn reset(&self) {
        let mut session = self.inner.lock();
        if !session.is_idle() {
            debug!("Resetting session (was {:?})", session.phase());
        }
        session.reset();
    }
}
