//! Lock-free waiter list.
//!
//! Observers registered before resolution accumulate in an intrusive
//! singly-linked stack mutated only by compare-and-swap on the head
//! pointer (a Treiber stack). Resolution swaps the head for the `CLOSED`
//! sentinel; the drained chain is reversed so handlers deliver in FIFO
//! registration order.
//!
//! ```text
//! observe:                       resolve:
//!   node.next = head               head = swap(CLOSED)
//!   CAS(head, node)                reverse(head) → FIFO
//!   └─ head == CLOSED?             dispatch each waiter once
//!      dispatch directly
//! ```
//!
//! # Invariants
//!
//! - The head is exactly one of: null (empty), a valid node pointer, or
//!   `CLOSED`. `CLOSED` is an all-ones address, distinct from null and
//!   from any allocation.
//! - Once the head becomes `CLOSED` it never changes again.
//! - Every node is freed exactly once: by the draining thread after the
//!   swap, by the enqueueing thread on `CLOSED` detection, or by `Drop`
//!   when the owning cell is destroyed unresolved. Nodes are never
//!   unlinked individually, so a freed address can never reappear at the
//!   head (no ABA window).

#![allow(unsafe_code)]

use crate::types::{Outcome, Qos};
use std::sync::atomic::{AtomicPtr, Ordering};

/// One observer record: handler, optional QoS hint, intrusive link.
pub(crate) struct Waiter<V, E> {
    handler: Box<dyn FnOnce(Outcome<V, E>) + Send>,
    qos: Option<Qos>,
    next: *mut Waiter<V, E>,
}

impl<V, E> Waiter<V, E> {
    pub(crate) fn boxed(
        handler: Box<dyn FnOnce(Outcome<V, E>) + Send>,
        qos: Option<Qos>,
    ) -> Box<Self> {
        Box::new(Self {
            handler,
            qos,
            next: std::ptr::null_mut(),
        })
    }

    /// Splits the node into its handler and QoS hint for dispatch.
    pub(crate) fn into_parts(self: Box<Self>) -> (Box<dyn FnOnce(Outcome<V, E>) + Send>, Option<Qos>) {
        let waiter = *self;
        (waiter.handler, waiter.qos)
    }
}

/// The `CLOSED` sentinel: an all-ones address.
///
/// Misaligned for any `Waiter`, so it can never collide with a real
/// allocation, and non-null. It is only ever compared, never
/// dereferenced.
fn closed<V, E>() -> *mut Waiter<V, E> {
    usize::MAX as *mut Waiter<V, E>
}

/// A Treiber-stack waiter list with a terminal `CLOSED` state.
pub(crate) struct WaiterList<V, E> {
    head: AtomicPtr<Waiter<V, E>>,
}

// SAFETY: the list owns its nodes, whose only non-Send-by-construction
// field is the intrusive link; handlers are `Box<dyn FnOnce + Send>` and
// all head mutation is CAS-synchronized, so moving or sharing the list
// across threads is sound.
unsafe impl<V, E> Send for WaiterList<V, E> {}
// SAFETY: as above; shared access goes exclusively through the atomic
// head.
unsafe impl<V, E> Sync for WaiterList<V, E> {}

impl<V, E> WaiterList<V, E> {
    /// Creates an empty, open list.
    pub(crate) fn new() -> Self {
        Self {
            head: AtomicPtr::new(std::ptr::null_mut()),
        }
    }

    /// Creates a list that is already closed (for pre-resolved cells).
    pub(crate) fn new_closed() -> Self {
        Self {
            head: AtomicPtr::new(closed::<V, E>()),
        }
    }

    /// Returns true once the list has been closed by [`close`].
    ///
    /// An acquire load: a `true` result makes the resolving thread's
    /// result write visible to the caller.
    ///
    /// [`close`]: Self::close
    pub(crate) fn is_closed(&self) -> bool {
        self.head.load(Ordering::Acquire) == closed::<V, E>()
    }

    /// Pushes a waiter, or hands it back if the list is already closed.
    ///
    /// On `Err`, the caller must dispatch the waiter directly with the
    /// published result.
    pub(crate) fn push(&self, waiter: Box<Waiter<V, E>>) -> Result<(), Box<Waiter<V, E>>> {
        let raw = Box::into_raw(waiter);
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            if head == closed::<V, E>() {
                // SAFETY: the CAS below never succeeded for `raw`, so we
                // still exclusively own the allocation from
                // `Box::into_raw` above.
                let waiter = unsafe { Box::from_raw(raw) };
                return Err(waiter);
            }
            // SAFETY: `raw` is exclusively ours until the CAS succeeds;
            // no other thread can read `next` before then.
            unsafe {
                (*raw).next = head;
            }
            match self
                .head
                .compare_exchange_weak(head, raw, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Ok(()),
                Err(observed) => head = observed,
            }
        }
    }

    /// Closes the list, returning the accumulated waiters in FIFO
    /// registration order.
    ///
    /// Must be called at most once, by the thread that won the
    /// resolution CAS, after the result slot is written. The swap is
    /// acq-rel: it publishes the result write to every subsequent
    /// [`is_closed`] observer.
    ///
    /// [`is_closed`]: Self::is_closed
    pub(crate) fn close(&self) -> Vec<Box<Waiter<V, E>>> {
        let mut head = self.head.swap(closed::<V, E>(), Ordering::AcqRel);
        debug_assert!(head != closed::<V, E>(), "waiter list closed twice");
        let mut drained = Vec::new();
        while !head.is_null() {
            // SAFETY: after the swap no other thread can reach these
            // nodes; each `head` was produced by `Box::into_raw` in
            // `push` and is traversed exactly once.
            let waiter = unsafe { Box::from_raw(head) };
            head = waiter.next;
            drained.push(waiter);
        }
        // The stack yields most-recent-first; reverse for FIFO delivery.
        drained.reverse();
        drained
    }
}

impl<V, E> Drop for WaiterList<V, E> {
    fn drop(&mut self) {
        let mut head = *self.head.get_mut();
        if head == closed::<V, E>() {
            return;
        }
        // Cell destroyed without resolution: free undelivered nodes
        // without invoking their handlers.
        while !head.is_null() {
            // SAFETY: `&mut self` guarantees exclusive access; every
            // remaining node came from `Box::into_raw` in `push`.
            let waiter = unsafe { Box::from_raw(head) };
            head = waiter.next;
        }
    }
}

impl<V, E> std::fmt::Debug for WaiterList<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaiterList")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
