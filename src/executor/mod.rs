//! Executor interface and implementations.
//!
//! The core contains no threads of its own; it submits closures to an
//! [`Executor`]. Two implementations ship with the crate:
//!
//! - [`ThreadPool`]: production executor backed by worker threads and a
//!   dedicated timer thread. One global pool per [`Qos`] class is built
//!   lazily through [`global`].
//! - [`LabExecutor`]: deterministic single-pump executor with virtual
//!   time, for tests.
//!
//! Every deferred is associated with exactly one executor; combinators
//! inherit it unless redirected with `enqueuing_on`/`enqueuing_at`.

pub mod config;
pub mod lab;
pub mod pool;
pub mod timer;

pub use config::{ConfigError, PoolConfig};
pub use lab::LabExecutor;
pub use pool::ThreadPool;

use crate::types::{Qos, Time};
use std::sync::{Arc, OnceLock};

/// A unit of work submitted to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A closure-submission facility provided by the host.
///
/// The core requires only: run a closure later, optionally after a
/// deadline, optionally with a quality-of-service hint. Handlers must
/// never run synchronously inside `submit`; they run when the executor
/// gets to them.
pub trait Executor: Send + Sync + 'static {
    /// Submits a job to run asynchronously.
    fn submit(&self, job: Job);

    /// Submits a job to run once `deadline` (on this executor's clock)
    /// has passed.
    fn submit_after(&self, deadline: Time, job: Job);

    /// Submits a job with a quality-of-service hint.
    ///
    /// The hint is advisory; the default implementation ignores it.
    fn submit_with_qos(&self, qos: Qos, job: Job) {
        let _ = qos;
        self.submit(job);
    }

    /// Returns the nominal quality-of-service class of this executor.
    fn qos(&self) -> Qos;

    /// Returns the current time on this executor's clock.
    fn now(&self) -> Time;
}

/// An executor adapter that pins every submission to a fixed QoS hint.
///
/// Used by `enqueuing_at`: the wrapped executor receives each plain
/// `submit` as a `submit_with_qos` carrying the pinned class. Delayed
/// submissions pass through unhinted.
pub struct WithQos {
    inner: Arc<dyn Executor>,
    qos: Qos,
}

impl WithQos {
    /// Wraps `inner`, pinning submissions to `qos`.
    #[must_use]
    pub fn new(inner: Arc<dyn Executor>, qos: Qos) -> Self {
        Self { inner, qos }
    }
}

impl Executor for WithQos {
    fn submit(&self, job: Job) {
        self.inner.submit_with_qos(self.qos, job);
    }

    fn submit_after(&self, deadline: Time, job: Job) {
        self.inner.submit_after(deadline, job);
    }

    fn submit_with_qos(&self, qos: Qos, job: Job) {
        self.inner.submit_with_qos(qos, job);
    }

    fn qos(&self) -> Qos {
        self.qos
    }

    fn now(&self) -> Time {
        self.inner.now()
    }
}

static GLOBALS: [OnceLock<Arc<ThreadPool>>; 5] = [const { OnceLock::new() }; 5];

/// Returns the global thread pool for the given QoS class.
///
/// Pools are built lazily on first use and live for the remainder of the
/// process.
#[must_use]
pub fn global(qos: Qos) -> Arc<ThreadPool> {
    GLOBALS[qos.rank() as usize]
        .get_or_init(|| ThreadPool::new(qos))
        .clone()
}

/// Returns the global default-QoS thread pool.
///
/// Pre-resolved constructors without an explicit executor land here.
#[must_use]
pub fn default_global() -> Arc<ThreadPool> {
    global(Qos::Default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU8, Ordering};

    #[test]
    fn global_pools_are_cached_per_class() {
        let a = global(Qos::Utility);
        let b = global(Qos::Utility);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.qos(), Qos::Utility);
    }

    #[test]
    fn with_qos_pins_the_hint() {
        struct Recording {
            seen: AtomicU8,
        }

        impl Executor for Recording {
            fn submit(&self, job: Job) {
                job();
            }

            fn submit_after(&self, _deadline: Time, job: Job) {
                job();
            }

            fn submit_with_qos(&self, qos: Qos, job: Job) {
                self.seen.store(qos.rank() + 1, Ordering::SeqCst);
                job();
            }

            fn qos(&self) -> Qos {
                Qos::Default
            }

            fn now(&self) -> Time {
                Time::ZERO
            }
        }

        let inner = Arc::new(Recording {
            seen: AtomicU8::new(0),
        });
        let pinned = WithQos::new(inner.clone(), Qos::Background);
        assert_eq!(pinned.qos(), Qos::Background);

        pinned.submit(Box::new(|| {}));
        assert_eq!(inner.seen.load(Ordering::SeqCst), Qos::Background.rank() + 1);
    }
}
