//! The deferred core: resolution cell, public handle, resolver.
//!
//! A [`Deferred`] is a handle to a future single-assignment result. A
//! [`Resolver`] is the producer-side write capability for one deferred.
//! Between them sits the shared resolution cell and its lock-free waiter
//! list.
//!
//! # At-most-once resolution
//!
//! Exactly one resolution attempt succeeds per deferred; later attempts
//! report failure. Once resolved, the result is immutable and every
//! observer — registered before or after — receives it exactly once, via
//! the deferred's executor, never on the caller's stack.

mod handle;
mod resolver;
mod shared;
mod waiters;

pub use handle::Deferred;
pub use resolver::Resolver;

/// The externally visible lifecycle state of a deferred.
///
/// The transient resolving step is collapsed into `Executing`; a
/// deferred reports `Resolved` exactly when its result is readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredState {
    /// Created, producer not started.
    Waiting,
    /// A producer is (presumed) running.
    Executing,
    /// The result is final and visible.
    Resolved,
}

impl std::fmt::Display for DeferredState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Executing => write!(f, "executing"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}
