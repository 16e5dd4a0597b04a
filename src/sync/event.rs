use parking_lot::{Condvar, Mutex};
use std::fmt;

/// A one-shot event used to block a thread until another one signals it.
///
/// The event starts out unsignaled. `notify` transitions it into the signaled
/// state and wakes the waiter, after which `wait` returns immediately. There
/// is no way back to the unsignaled state.
///
/// Everything written before `notify` is visible to the thread returning from
/// `wait`, as both sides synchronize on the same lock.
#[derive(Default)]
pub struct Event {
    is_set: Mutex<bool>,
    cond: Condvar,
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("is_set", &self.is_set())
            .finish()
    }
}

impl Event {
    pub fn is_set(&self) -> bool {
        *self.is_set.lock()
    }

    pub fn notify(&self) {
        let mut is_set = self.is_set.lock();
        debug_assert!(!*is_set, "Event notified more than once");

        if !*is_set {
            *is_set = true;
            self.cond.notify_one();
        }
    }

    pub fn wait(&self) {
        let mut is_set = self.is_set.lock();
        while !*is_set {
            self.cond.wait(&mut is_set);
        }
    }
}
