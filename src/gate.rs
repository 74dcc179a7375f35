//! Start and stop barriers for a benchmark run.
//!
//! [`StartupGate`] is a one-shot latch: the sampler opens it after its first
//! reading and the driver waits on it before spawning any worker.
//! [`ShutdownGate`] is a countdown latch with one [`ShutdownSlot`] per
//! participant (every worker plus the sampler). A slot releases exactly once,
//! either explicitly or when it is dropped, so a participant that unwinds
//! still lets the driver through.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct StartupGate {
    open: Mutex<bool>,
    cond: Condvar,
}

impl StartupGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate. Later calls are no-ops.
    pub fn open(&self) {
        let mut open = self.open.lock();
        if !*open {
            *open = true;
            self.cond.notify_all();
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }

    /// Blocks until the gate is open.
    pub fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.cond.wait(&mut open);
        }
    }
}

#[derive(Debug)]
struct Countdown {
    remaining: usize,
    issued: usize,
    released: usize,
}

#[derive(Debug)]
pub struct ShutdownGate {
    participants: usize,
    state: Mutex<Countdown>,
    cond: Condvar,
}

impl ShutdownGate {
    #[must_use]
    pub fn new(participants: usize) -> Arc<Self> {
        Arc::new(Self {
            participants,
            state: Mutex::new(Countdown {
                remaining: participants,
                issued: 0,
                released: 0,
            }),
            cond: Condvar::new(),
        })
    }

    /// Hands out the next participant slot, or `None` once all are issued.
    #[must_use]
    pub fn slot(self: &Arc<Self>) -> Option<ShutdownSlot> {
        let mut state = self.state.lock();
        if state.issued == self.participants {
            return None;
        }
        state.issued += 1;
        Some(ShutdownSlot {
            gate: Some(Arc::clone(self)),
        })
    }

    fn count_down(&self) {
        let mut state = self.state.lock();
        state.remaining -= 1;
        state.released += 1;
        if state.remaining == 0 {
            self.cond.notify_all();
        }
    }

    /// Blocks until every participant has released its slot.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        while state.remaining > 0 {
            self.cond.wait(&mut state);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`. Returns
    /// whether the gate opened.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if state.remaining > 0 {
            let _ = self
                .cond
                .wait_while_for(&mut state, |s| s.remaining > 0, timeout);
        }
        state.remaining == 0
    }

    #[must_use]
    pub fn released(&self) -> usize {
        self.state.lock().released
    }
}

/// One participant's share of a [`ShutdownGate`].
#[derive(Debug)]
pub struct ShutdownSlot {
    gate: Option<Arc<ShutdownGate>>,
}

impl ShutdownSlot {
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if let Some(gate) = self.gate.take() {
            gate.count_down();
        }
    }
}

impl Drop for ShutdownSlot {
    fn drop(&mut self) {
        self.release_once();
    }
}
