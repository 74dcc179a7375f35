//! Cooperative stop signals.

use crate::error::HarnessError;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Running = 0,
    StopRequested = 1,
    Stopped = 2,
}

impl WorkerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::StopRequested,
            _ => Self::Stopped,
        }
    }
}

/// Per-worker state shared between the driver (writer of stop requests) and
/// the worker (which polls it at the top of every iteration).
#[derive(Debug)]
pub struct WorkerControl {
    id: usize,
    state: AtomicU8,
    completed: AtomicU64,
}

impl WorkerControl {
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            state: AtomicU8::new(WorkerState::Running as u8),
            completed: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Driver side. Only moves `Running` to `StopRequested`.
    pub fn request_stop(&self) {
        let _ = self.state.compare_exchange(
            WorkerState::Running as u8,
            WorkerState::StopRequested as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.state() != WorkerState::Running
    }

    /// Worker side, on its terminal path.
    pub fn mark_stopped(&self) {
        self.state
            .store(WorkerState::Stopped as u8, Ordering::Release);
    }

    pub(crate) fn record_pair(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Pairs this worker has completed and counted.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }
}

/// First-wins latch for a fatal error raised by any participant.
///
/// The driver sleeps on it for the run duration so a fatal error cuts the
/// run short instead of waiting for the deadline.
#[derive(Debug, Default)]
pub struct RunAbort {
    tripped: AtomicBool,
    error: Mutex<Option<HarnessError>>,
    cond: Condvar,
}

impl RunAbort {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `err` unless another error got there first.
    pub fn trip(&self, err: HarnessError) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            tracing::error!(error = ?err, "fatal error, aborting run");
            *slot = Some(err);
            self.tripped.store(true, Ordering::Release);
            self.cond.notify_all();
        }
    }

    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Sleeps for `duration` or until tripped. Returns `true` if tripped.
    ///
    /// A `duration` too large to express as a deadline waits for the trip
    /// alone.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        let mut slot = self.error.lock();
        while slot.is_none() {
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut slot, deadline).timed_out() {
                        break;
                    }
                }
                None => self.cond.wait(&mut slot),
            }
        }
        slot.is_some()
    }

    pub fn take(&self) -> Option<HarnessError> {
        self.error.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn worker_state_transitions() {
        let control = WorkerControl::new(0);
        assert_eq!(control.state(), WorkerState::Running);
        assert!(!control.stop_requested());

        control.request_stop();
        assert_eq!(control.state(), WorkerState::StopRequested);

        control.mark_stopped();
        control.request_stop();
        assert_eq!(control.state(), WorkerState::Stopped);
    }

    #[test]
    fn abort_keeps_first_error() {
        let abort = RunAbort::new();
        abort.trip(HarnessError::InvalidInput("first".into()));
        abort.trip(HarnessError::InvalidInput("second".into()));
        assert!(abort.is_tripped());
        match abort.take() {
            Some(HarnessError::InvalidInput(msg)) => assert_eq!(msg, "first"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn abort_wakes_sleeping_driver() {
        let abort = Arc::new(RunAbort::new());
        let tripper = {
            let abort = Arc::clone(&abort);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                abort.trip(HarnessError::InvalidInput("boom".into()));
            })
        };
        let start = Instant::now();
        assert!(abort.wait_timeout(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(10));
        tripper.join().unwrap();
    }

    #[test]
    fn unbounded_wait_ends_on_trip() {
        let abort = Arc::new(RunAbort::new());
        let tripper = {
            let abort = Arc::clone(&abort);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                abort.trip(HarnessError::InvalidInput("boom".into()));
            })
        };
        assert!(abort.wait_timeout(Duration::from_secs(u64::MAX)));
        assert!(abort.wait_timeout(Duration::MAX));
        tripper.join().unwrap();
    }

    #[test]
    fn untripped_wait_runs_full_duration() {
        let abort = RunAbort::new();
        let start = Instant::now();
        assert!(!abort.wait_timeout(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
