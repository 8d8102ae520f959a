//! Deterministic lab executor with virtual time.
//!
//! The lab executor never spawns threads. Submitted jobs accumulate in a
//! ready queue until the test pumps them with [`run_until_idle`]; delayed
//! submissions sit in a timer heap until the test advances the virtual
//! clock with [`advance`]. Handlers therefore run at well-defined points
//! in a test and in a deterministic order, while still never running
//! synchronously inside `observe`/`resolve`.
//!
//! [`run_until_idle`]: LabExecutor::run_until_idle
//! [`advance`]: LabExecutor::advance

use super::timer::TimerHeap;
use super::{Executor, Job};
use crate::tracing_compat::trace;
use crate::types::{Qos, Time};
use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A deterministic executor for tests.
///
/// Jobs may be submitted from any thread; they execute only on the
/// thread that pumps.
pub struct LabExecutor {
    ready: SegQueue<Job>,
    timers: Mutex<TimerHeap<Job>>,
    now: AtomicU64,
    qos: Qos,
}

impl LabExecutor {
    /// Creates a lab executor at virtual time zero, default QoS.
    #[must_use]
    pub fn new() -> Self {
        Self::with_qos(Qos::Default)
    }

    /// Creates a lab executor at virtual time zero with the given QoS.
    #[must_use]
    pub fn with_qos(qos: Qos) -> Self {
        Self {
            ready: SegQueue::new(),
            timers: Mutex::new(TimerHeap::new()),
            now: AtomicU64::new(0),
            qos,
        }
    }

    /// Runs ready jobs until the queue stays empty.
    ///
    /// Jobs enqueued by running jobs are pumped in the same call.
    /// Returns the number of jobs executed.
    pub fn run_until_idle(&self) -> usize {
        let mut executed = 0;
        while let Some(job) = self.ready.pop() {
            job();
            executed += 1;
        }
        executed
    }

    /// Advances virtual time by `duration`, releasing and running every
    /// timer that falls due along the way.
    ///
    /// Time advances timer by timer so that a job scheduling a new timer
    /// inside the window sees it fire at the correct virtual instant.
    /// Returns the number of jobs executed.
    pub fn advance(&self, duration: Duration) -> usize {
        self.advance_to(self.now() + duration)
    }

    /// Advances virtual time to `target`, releasing timers in deadline
    /// order. Returns the number of jobs executed.
    pub fn advance_to(&self, target: Time) -> usize {
        let mut executed = self.run_until_idle();
        loop {
            let next = {
                let timers = self.timers.lock();
                timers.peek_deadline().filter(|d| *d <= target)
            };
            let Some(deadline) = next else {
                break;
            };
            self.now.store(deadline.as_nanos(), Ordering::SeqCst);
            trace!(now = %deadline, "lab clock advanced");
            let due = self.timers.lock().pop_expired(deadline);
            for job in due {
                self.ready.push(job);
            }
            executed += self.run_until_idle();
        }
        self.now.store(target.as_nanos(), Ordering::SeqCst);
        executed
    }

    /// Returns the number of pending delayed submissions.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.lock().len()
    }
}

impl Default for LabExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for LabExecutor {
    fn submit(&self, job: Job) {
        self.ready.push(job);
    }

    fn submit_after(&self, deadline: Time, job: Job) {
        if deadline <= self.now() {
            self.ready.push(job);
        } else {
            self.timers.lock().insert(deadline, job);
        }
    }

    fn qos(&self) -> Qos {
        self.qos
    }

    fn now(&self) -> Time {
        Time::from_nanos(self.now.load(Ordering::SeqCst))
    }
}

impl std::fmt::Debug for LabExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabExecutor")
            .field("now", &self.now())
            .field("ready", &self.ready.len())
            .field("timers", &self.timers.lock().len())
            .finish()
    }
}
