//! The shared resolution cell.
//!
//! One cell backs every [`Deferred`](super::Deferred) handle: an atomic
//! state word, the lock-free waiter list, a write-once result slot, the
//! associated executor, and the upstream retainer used by combinators.
//!
//! # State machine
//!
//! ```text
//! WAITING ──► EXECUTING ──► RESOLVING ──► RESOLVED
//!    └──────────────────────────┘   (resolve may skip EXECUTING)
//! ```
//!
//! Transitions are monotonic; exactly one resolution attempt wins the
//! CAS into `RESOLVING`. The winner writes the result slot, closes the
//! waiter list (publishing the result with release semantics), and
//! dispatches the drained waiters through the executor.

use super::waiters::{Waiter, WaiterList};
use super::DeferredState;
use crate::executor::{Executor, Job};
use crate::tracing_compat::trace;
use crate::types::{Outcome, Qos};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

const WAITING: u8 = 0;
const EXECUTING: u8 = 1;
const RESOLVING: u8 = 2;
const RESOLVED: u8 = 3;

/// The shared state cell behind a deferred and its resolver.
pub(crate) struct Shared<V, E> {
    /// Monotonic state word.
    state: AtomicU8,
    /// Pending observers, or `CLOSED` once resolved.
    waiters: WaiterList<V, E>,
    /// Write-once final result; readable only after `waiters` closes.
    result: OnceLock<Outcome<V, E>>,
    /// Executor handlers dispatch through.
    executor: Arc<dyn Executor>,
    /// Strong upstream reference held until resolution.
    source: Mutex<Option<Box<dyn Any + Send>>>,
}

impl<V, E> Shared<V, E> {
    pub(crate) fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            state: AtomicU8::new(WAITING),
            waiters: WaiterList::new(),
            result: OnceLock::new(),
            executor,
            source: Mutex::new(None),
        }
    }

    pub(crate) fn new_resolved(executor: Arc<dyn Executor>, outcome: Outcome<V, E>) -> Self {
        let result = OnceLock::new();
        let unset = result.set(outcome).is_err();
        debug_assert!(!unset, "fresh result slot was occupied");
        Self {
            state: AtomicU8::new(RESOLVED),
            waiters: WaiterList::new_closed(),
            result,
            executor,
            source: Mutex::new(None),
        }
    }

    /// Marks a waiting cell as executing. A no-op in any later state.
    pub(crate) fn mark_executing(&self) {
        let _ = self
            .state
            .compare_exchange(WAITING, EXECUTING, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Returns true once a resolution attempt has won the state CAS.
    ///
    /// Used by `needs_resolution`: once claimed, producers can stop.
    pub(crate) fn is_resolution_claimed(&self) -> bool {
        self.state.load(Ordering::Acquire) >= RESOLVING
    }

    /// External view of the state word.
    ///
    /// `RESOLVING` (and the instant between the state store and the
    /// waiter-list close) collapse to `Executing`: a cell is `Resolved`
    /// exactly when its result is readable.
    pub(crate) fn snapshot(&self) -> DeferredState {
        if self.waiters.is_closed() {
            return DeferredState::Resolved;
        }
        match self.state.load(Ordering::Acquire) {
            WAITING => DeferredState::Waiting,
            _ => DeferredState::Executing,
        }
    }

    /// Stores a strong upstream reference, released at resolution.
    ///
    /// Dropped immediately if the cell already resolved (the lock orders
    /// this against the resolver's take).
    pub(crate) fn retain_source(&self, source: Box<dyn Any + Send>) {
        let mut slot = self.source.lock();
        if self.state.load(Ordering::Acquire) < RESOLVING {
            *slot = Some(source);
        }
    }

    pub(crate) fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }
}

impl<V, E> Shared<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Attempts the one resolution. Returns true iff this call won.
    pub(crate) fn resolve(&self, outcome: Outcome<V, E>) -> bool {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            if state >= RESOLVING {
                return false;
            }
            match self.state.compare_exchange_weak(
                state,
                RESOLVING,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => state = observed,
            }
        }

        // Sole writer: the CAS above admits exactly one thread.
        let occupied = self.result.set(outcome).is_err();
        debug_assert!(!occupied, "result written twice");

        self.state.store(RESOLVED, Ordering::Release);
        let drained = self.waiters.close();
        trace!(waiters = drained.len(), "deferred resolved");

        let retained = self.source.lock().take();
        for waiter in drained {
            self.dispatch(waiter);
        }
        // Upstream retainer released only after resolution is public.
        drop(retained);
        true
    }

    /// Registers an observer, queueing it or dispatching directly if the
    /// cell already resolved.
    pub(crate) fn observe(
        &self,
        qos: Option<Qos>,
        handler: Box<dyn FnOnce(Outcome<V, E>) + Send>,
    ) {
        match self.waiters.push(Waiter::boxed(handler, qos)) {
            Ok(()) => {}
            Err(waiter) => self.dispatch(waiter),
        }
    }

    /// Returns the result without blocking, iff resolved.
    pub(crate) fn peek(&self) -> Option<Outcome<V, E>> {
        if self.waiters.is_closed() {
            let outcome = self
                .result
                .get()
                .expect("closed waiter list implies a written result");
            Some(outcome.clone())
        } else {
            None
        }
    }

    /// Submits one waiter's handler through the executor.
    ///
    /// Never invokes the handler on the calling stack.
    fn dispatch(&self, waiter: Box<Waiter<V, E>>) {
        let outcome = self
            .result
            .get()
            .expect("dispatch requires a resolved cell")
            .clone();
        let (handler, qos) = waiter.into_parts();
        let job: Job = Box::new(move || handler(outcome));
        match qos {
            Some(qos) => self.executor.submit_with_qos(qos, job),
            None => self.executor.submit(job),
        }
    }
}

impl<V, E> std::fmt::Debug for Shared<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("state", &self.state.load(Ordering::Relaxed))
            .field("waiters", &self.waiters)
            .finish_non_exhaustive()
    }
}
