//! One-shot, timeout-bounded gate.
//!
//! [`Barrier::pair`] hands out the waiting side and a cloneable [`Releaser`].
//! A release that happens before anyone waits is kept, so the order of
//! "hub answers" and "host starts waiting" does not matter. There is no reset:
//! each step gets a brand-new pair.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Result of waiting on a [`Barrier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Released,
    TimedOut,
}

#[derive(Debug, Default)]
struct Gate {
    released: Mutex<bool>,
    cond: Condvar,
}

/// Waiting side of a one-shot gate.
#[derive(Debug)]
pub struct Barrier {
    gate: Arc<Gate>,
}

/// Releasing side of a one-shot gate. Safe to call from any thread, any
/// number of times; only the first call has an effect.
#[derive(Debug, Clone)]
pub struct Releaser {
    gate: Arc<Gate>,
}

impl Barrier {
    pub fn pair() -> (Barrier, Releaser) {
        let gate = Arc::new(Gate::default());
        (
            Barrier { gate: gate.clone() },
            Releaser { gate },
        )
    }

    /// Block until released or until `timeout` elapses.
    ///
    /// Once released, every later call returns `Released` immediately.
    pub fn wait(&self, timeout: Duration) -> GateStatus {
        let released = self
            .gate
            .released
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (released, _) = self
            .gate
            .cond
            .wait_timeout_while(released, timeout, |released| !*released)
            .unwrap_or_else(PoisonError::into_inner);
        if *released {
            GateStatus::Released
        } else {
            GateStatus::TimedOut
        }
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        *self
            .gate
            .released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Releaser {
    pub fn release(&self) {
        let mut released = self
            .gate
            .released
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !*released {
            *released = true;
            self.gate.cond.notify_all();
        }
    }
}
