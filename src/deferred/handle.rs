//! The public deferred handle.

use super::resolver::Resolver;
use super::shared::Shared;
use super::DeferredState;
use crate::error::Error;
use crate::executor::Executor;
use crate::types::{Outcome, Qos};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn default_executor() -> Arc<dyn Executor> {
    crate::executor::default_global()
}

/// A handle to a future single-assignment result.
///
/// Handles are cheap to clone; every clone observes the same resolution.
/// Dropping the last handle of an unresolved deferred releases its
/// upstream retainer, which propagates loss of interest up a combinator
/// chain (see [`Resolver::needs_resolution`]).
///
/// # Example
///
/// ```ignore
/// use adeferred::{Deferred, Outcome};
///
/// let doubled = Deferred::resolved(21).map(|v| v * 2);
/// assert_eq!(doubled.get(), Outcome::Success(42));
/// ```
pub struct Deferred<V, E> {
    pub(crate) shared: Arc<Shared<V, E>>,
}

impl<V, E> Clone for Deferred<V, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V, E> Deferred<V, E> {
    /// Returns the executor this deferred dispatches handlers through.
    #[must_use]
    pub fn executor(&self) -> Arc<dyn Executor> {
        Arc::clone(self.shared.executor())
    }

    /// Returns the externally visible lifecycle state.
    #[must_use]
    pub fn state(&self) -> DeferredState {
        self.shared.snapshot()
    }

    /// Returns true iff the result is final and visible.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state() == DeferredState::Resolved
    }

    /// Marks a waiting deferred as executing.
    ///
    /// A hint for producers that observe [`state`](Self::state); a no-op
    /// in any later state.
    pub fn execute(&self) {
        self.shared.mark_executing();
    }
}

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an unresolved deferred on `executor`, returning the write
    /// capability alongside the handle.
    ///
    /// This is the raw constructor adapter code builds on; most callers
    /// want [`with_producer`](Self::with_producer) or a combinator.
    #[must_use]
    pub fn pair_on(executor: Arc<dyn Executor>) -> (Resolver<V, E>, Self) {
        let shared = Arc::new(Shared::new(executor));
        (Resolver::new(Arc::downgrade(&shared)), Self { shared })
    }

    /// Creates a deferred already resolved with `outcome`, on the global
    /// default executor.
    #[must_use]
    pub fn from_outcome(outcome: Outcome<V, E>) -> Self {
        Self::from_outcome_on(default_executor(), outcome)
    }

    /// Creates a deferred already resolved with `outcome`, on `executor`.
    #[must_use]
    pub fn from_outcome_on(executor: Arc<dyn Executor>, outcome: Outcome<V, E>) -> Self {
        Self {
            shared: Arc::new(Shared::new_resolved(executor, outcome)),
        }
    }

    /// Creates a deferred already resolved with `value`.
    #[must_use]
    pub fn resolved(value: V) -> Self {
        Self::from_outcome(Outcome::Success(value))
    }

    /// Creates a deferred already resolved with `value`, on `executor`.
    #[must_use]
    pub fn resolved_on(executor: Arc<dyn Executor>, value: V) -> Self {
        Self::from_outcome_on(executor, Outcome::Success(value))
    }

    /// Creates a deferred already failed with `error`.
    #[must_use]
    pub fn failed(error: E) -> Self {
        Self::from_outcome(Outcome::Failure(error))
    }

    /// Creates a deferred already failed with `error`, on `executor`.
    #[must_use]
    pub fn failed_on(executor: Arc<dyn Executor>, error: E) -> Self {
        Self::from_outcome_on(executor, Outcome::Failure(error))
    }

    /// Creates a deferred whose producer is submitted to `executor` at
    /// construction.
    ///
    /// The producer receives the [`Resolver`] and is expected to resolve
    /// it eventually; if it never does, the deferred stays unresolved
    /// until the last handle drops.
    #[must_use]
    pub fn with_producer<P>(executor: Arc<dyn Executor>, producer: P) -> Self
    where
        P: FnOnce(Resolver<V, E>) + Send + 'static,
    {
        Self::spawn_producer(executor, None, producer)
    }

    /// Like [`with_producer`](Self::with_producer), submitting the
    /// producer with a QoS hint.
    #[must_use]
    pub fn with_producer_at<P>(executor: Arc<dyn Executor>, qos: Qos, producer: P) -> Self
    where
        P: FnOnce(Resolver<V, E>) + Send + 'static,
    {
        Self::spawn_producer(executor, Some(qos), producer)
    }

    fn spawn_producer<P>(executor: Arc<dyn Executor>, qos: Option<Qos>, producer: P) -> Self
    where
        P: FnOnce(Resolver<V, E>) + Send + 'static,
    {
        let (resolver, deferred) = Self::pair_on(Arc::clone(&executor));
        deferred.execute();
        let job = Box::new(move || producer(resolver));
        match qos {
            Some(qos) => executor.submit_with_qos(qos, job),
            None => executor.submit(job),
        }
        deferred
    }

    /// Registers a handler for the final result.
    ///
    /// Thread-safe and lock-free. Handlers registered before resolution
    /// run in registration order; handlers registered after resolution
    /// are submitted immediately. Either way the handler runs on the
    /// deferred's executor, never on the caller's stack.
    pub fn observe<F>(&self, handler: F)
    where
        F: FnOnce(Outcome<V, E>) + Send + 'static,
    {
        self.shared.observe(None, Box::new(handler));
    }

    /// Registers a handler whose dispatch carries a QoS hint.
    pub fn observe_at<F>(&self, qos: Qos, handler: F)
    where
        F: FnOnce(Outcome<V, E>) + Send + 'static,
    {
        self.shared.observe(Some(qos), Box::new(handler));
    }

    /// Registers a handler invoked only on success.
    pub fn on_value<F>(&self, handler: F)
    where
        F: FnOnce(V) + Send + 'static,
    {
        self.observe(move |outcome| {
            if let Outcome::Success(value) = outcome {
                handler(value);
            }
        });
    }

    /// Registers a handler invoked only on failure.
    pub fn on_error<F>(&self, handler: F)
    where
        F: FnOnce(E) + Send + 'static,
    {
        self.observe(move |outcome| {
            if let Outcome::Failure(error) = outcome {
                handler(error);
            }
        });
    }

    /// Returns the result without blocking, iff resolved.
    #[must_use]
    pub fn peek(&self) -> Option<Outcome<V, E>> {
        self.shared.peek()
    }

    /// Blocks the calling thread until the deferred resolves.
    ///
    /// Do not call this from a thread of the deferred's own executor
    /// when that executor is what will run the resolution: the wait
    /// would starve the very thread it depends on.
    #[must_use]
    pub fn get(&self) -> Outcome<V, E> {
        if let Some(outcome) = self.peek() {
            return outcome;
        }
        let gate = Arc::new((Mutex::new(None), Condvar::new()));
        {
            let gate = Arc::clone(&gate);
            self.observe(move |outcome| {
                *gate.0.lock() = Some(outcome);
                gate.1.notify_all();
            });
        }
        let mut slot = gate.0.lock();
        while slot.is_none() {
            gate.1.wait(&mut slot);
        }
        slot.take().expect("signalled gate holds the result")
    }

    /// Blocks until the deferred resolves or `timeout` elapses.
    ///
    /// Returns `None` on timeout; the deferred itself is untouched.
    #[must_use]
    pub fn get_within(&self, timeout: Duration) -> Option<Outcome<V, E>> {
        if let Some(outcome) = self.peek() {
            return Some(outcome);
        }
        let gate = Arc::new((Mutex::new(None), Condvar::new()));
        {
            let gate = Arc::clone(&gate);
            self.observe(move |outcome| {
                *gate.0.lock() = Some(outcome);
                gate.1.notify_all();
            });
        }
        let deadline = Instant::now() + timeout;
        let mut slot = gate.0.lock();
        while slot.is_none() {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let _ = gate.1.wait_for(&mut slot, deadline - now);
        }
        slot.take()
    }

    /// Blocks until resolution; returns the value, or `None` on failure.
    #[must_use]
    pub fn value(&self) -> Option<V> {
        self.get().success()
    }

    /// Blocks until resolution; returns the error, or `None` on success.
    #[must_use]
    pub fn error(&self) -> Option<E> {
        self.get().failure()
    }
}

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static + From<Error>,
{
    /// Cancels the deferred: resolves it with a canceled failure.
    ///
    /// Returns true iff this call performed the resolution; false means
    /// the deferred had already resolved and kept its result.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        self.shared
            .resolve(Outcome::Failure(E::from(Error::canceled(reason))))
    }
}

impl<V, E> std::fmt::Debug for Deferred<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
