//! Production thread-pool executor.
//!
//! Worker threads drain a shared queue, parking on a condvar when idle.
//! A dedicated timer thread drives a min-heap of delayed submissions and
//! feeds expired jobs back into the queue. The pool's clock is monotonic
//! wall-clock time measured from pool construction.
//!
//! Panics in submitted jobs are caught and logged; a panicking handler
//! never takes a worker thread down with it.

use super::config::{ConfigError, PoolConfig};
use super::timer::TimerHeap;
use super::{Executor, Job};
use crate::tracing_compat::{debug, trace};
use crate::types::{Qos, Time};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

struct PoolShared {
    queue: Mutex<VecDeque<Job>>,
    available: Condvar,
    timers: Mutex<TimerHeap<Job>>,
    timer_wake: Condvar,
    shutdown: AtomicBool,
    epoch: Instant,
    qos: Qos,
}

impl PoolShared {
    fn now(&self) -> Time {
        let nanos = self.epoch.elapsed().as_nanos();
        Time::from_nanos(if nanos > u128::from(u64::MAX) {
            u64::MAX
        } else {
            nanos as u64
        })
    }

    fn enqueue(&self, job: Job) {
        self.queue.lock().push_back(job);
        self.available.notify_one();
    }

    fn run_job(job: Job) {
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            debug!("pool job panicked; worker continues");
        }
    }

    fn worker_loop(&self) {
        loop {
            let job = {
                let mut queue = self.queue.lock();
                loop {
                    if let Some(job) = queue.pop_front() {
                        break job;
                    }
                    if self.shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    self.available.wait(&mut queue);
                }
            };
            Self::run_job(job);
        }
    }

    fn timer_loop(&self) {
        let mut timers = self.timers.lock();
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                return;
            }
            for job in timers.pop_expired(self.now()) {
                self.enqueue(job);
            }
            match timers.peek_deadline() {
                Some(deadline) => {
                    let wait = self.now().until(deadline);
                    let _ = self.timer_wake.wait_for(&mut timers, wait);
                }
                None => self.timer_wake.wait(&mut timers),
            }
        }
    }
}

/// A thread-pool executor with delayed-submission support.
///
/// Pools are usually obtained through the global registry
/// ([`global`](super::global)); explicitly constructed pools shut down
/// and join their threads on drop.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
    /// Creates a pool for the given QoS class with the default
    /// configuration.
    #[must_use]
    pub fn new(qos: Qos) -> Arc<Self> {
        Self::with_config(qos, PoolConfig::default()).expect("default pool config is valid")
    }

    /// Creates a pool for the given QoS class with the given
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_config(qos: Qos, config: PoolConfig) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;

        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            timers: Mutex::new(TimerHeap::new()),
            timer_wake: Condvar::new(),
            shutdown: AtomicBool::new(false),
            epoch: Instant::now(),
            qos,
        });

        let mut handles = Vec::with_capacity(config.workers + 1);
        for index in 0..config.workers {
            let worker_shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name_prefix))
                .stack_size(config.thread_stack_size)
                .spawn(move || worker_shared.worker_loop())
                .expect("failed to spawn pool worker");
            handles.push(handle);
        }

        let timer_shared = Arc::clone(&shared);
        let timer_handle = thread::Builder::new()
            .name(format!("{}-timer", config.thread_name_prefix))
            .spawn(move || timer_shared.timer_loop())
            .expect("failed to spawn pool timer");
        handles.push(timer_handle);

        debug!(workers = config.workers, qos = %qos, "thread pool started");

        Ok(Arc::new(Self {
            shared,
            handles: Mutex::new(handles),
        }))
    }
}

impl Executor for ThreadPool {
    fn submit(&self, job: Job) {
        self.shared.enqueue(job);
    }

    fn submit_after(&self, deadline: Time, job: Job) {
        if deadline <= self.shared.now() {
            self.shared.enqueue(job);
            return;
        }
        trace!(deadline = %deadline, "delayed submission armed");
        self.shared.timers.lock().insert(deadline, job);
        self.shared.timer_wake.notify_one();
    }

    fn submit_with_qos(&self, qos: Qos, job: Job) {
        if qos == self.shared.qos {
            self.shared.enqueue(job);
        } else {
            // QoS-keyed routing: hinted submissions land on the shared
            // pool for that class.
            super::global(qos).submit(job);
        }
    }

    fn qos(&self) -> Qos {
        self.shared.qos
    }

    fn now(&self) -> Time {
        self.shared.now()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.available.notify_all();
        self.shared.timer_wake.notify_all();

        let current = thread::current().id();
        for handle in self.handles.lock().drain(..) {
            // A job owning the last pool handle drops the pool from a
            // worker thread; joining that thread would deadlock.
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("qos", &self.shared.qos)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    fn test_pool() -> Arc<ThreadPool> {
        ThreadPool::with_config(
            Qos::Default,
            PoolConfig::new()
                .with_workers(2)
                .with_thread_name_prefix("pool-test"),
        )
        .expect("test pool config is valid")
    }

    #[test]
    fn submit_runs_the_job() {
        let pool = test_pool();
        let (tx, rx) = mpsc::channel();
        pool.submit(Box::new(move || tx.send(7).expect("receiver alive")));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(7));
    }

    #[test]
    fn submit_after_waits_for_the_deadline() {
        let pool = test_pool();
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();
        let deadline = pool.now() + Duration::from_millis(50);
        pool.submit_after(
            deadline,
            Box::new(move || tx.send(()).expect("receiver alive")),
        );
        rx.recv_timeout(Duration::from_secs(5)).expect("job ran");
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn past_deadlines_run_immediately() {
        let pool = test_pool();
        let (tx, rx) = mpsc::channel();
        pool.submit_after(
            Time::ZERO,
            Box::new(move || tx.send(()).expect("receiver alive")),
        );
        rx.recv_timeout(Duration::from_secs(5)).expect("job ran");
    }

    #[test]
    fn delayed_jobs_release_in_deadline_order() {
        let pool = ThreadPool::with_config(
            Qos::Default,
            PoolConfig::new()
                .with_workers(1)
                .with_thread_name_prefix("pool-order"),
        )
        .expect("test pool config is valid");

        let (tx, rx) = mpsc::channel();
        let now = pool.now();
        for (offset_ms, tag) in [(60u64, "late"), (20, "early")] {
            let tx = tx.clone();
            pool.submit_after(
                now + Duration::from_millis(offset_ms),
                Box::new(move || tx.send(tag).expect("receiver alive")),
            );
        }
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok("early"));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok("late"));
    }

    #[test]
    fn panicking_job_does_not_kill_the_worker() {
        let pool = ThreadPool::with_config(
            Qos::Default,
            PoolConfig::new()
                .with_workers(1)
                .with_thread_name_prefix("pool-panic"),
        )
        .expect("test pool config is valid");

        pool.submit(Box::new(|| panic!("boom")));

        let (tx, rx) = mpsc::channel();
        pool.submit(Box::new(move || tx.send(()).expect("receiver alive")));
        rx.recv_timeout(Duration::from_secs(5))
            .expect("worker survived the panic");
    }

    #[test]
    fn drop_joins_workers() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = test_pool();
            for _ in 0..16 {
                let counter = Arc::clone(&counter);
                pool.submit(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
            // Give workers a chance to drain before shutdown races the
            // remaining queue entries.
            std::thread::sleep(Duration::from_millis(100));
        }
        assert!(counter.load(Ordering::SeqCst) <= 16);
    }
}
