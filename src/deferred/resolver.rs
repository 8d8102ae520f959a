//! Producer-side write capability.

use super::shared::Shared;
use crate::error::Error;
use crate::types::{Outcome, Qos};
use crate::tracing_compat::trace;
use std::sync::Weak;

/// The write capability for a single [`Deferred`](super::Deferred).
///
/// A resolver holds only a weak reference to the cell. If every strong
/// handle to the deferred is dropped before resolution, the cell is
/// destroyed and [`needs_resolution`](Self::needs_resolution) starts
/// returning false — a producer polling it can abandon work the moment
/// every consumer has lost interest.
pub struct Resolver<V, E> {
    shared: Weak<Shared<V, E>>,
}

impl<V, E> Clone for Resolver<V, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<V, E> Resolver<V, E> {
    pub(crate) fn new(shared: Weak<Shared<V, E>>) -> Self {
        Self { shared }
    }

    /// Returns true iff the deferred is unresolved and some consumer
    /// still holds a strong handle.
    #[must_use]
    pub fn needs_resolution(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| !shared.is_resolution_claimed())
    }

    /// Returns the QoS class of the deferred's executor, or the default
    /// class if every consumer is gone.
    #[must_use]
    pub fn qos(&self) -> Qos {
        self.shared
            .upgrade()
            .map_or_else(Qos::default, |shared| shared.executor().qos())
    }

    /// Stores a strong reference the deferred must keep alive until it
    /// resolves.
    ///
    /// Combinators retain their upstream here; the slot is released when
    /// the deferred resolves. Storing a second source replaces (and
    /// releases) the first.
    pub fn retain_source<S: Send + 'static>(&self, source: S) {
        if let Some(shared) = self.shared.upgrade() {
            shared.retain_source(Box::new(source));
        }
    }
}

impl<V, E> Resolver<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Resolves the deferred with the given outcome.
    ///
    /// Returns true iff this call performed the resolution. Returns
    /// false if the deferred was already resolved — or if every consumer
    /// dropped it, in which case there is nothing left to resolve.
    pub fn resolve(&self, outcome: Outcome<V, E>) -> bool {
        match self.shared.upgrade() {
            Some(shared) => shared.resolve(outcome),
            None => {
                trace!("resolve on an abandoned deferred");
                false
            }
        }
    }

    /// Resolves with a success value.
    pub fn resolve_value(&self, value: V) -> bool {
        self.resolve(Outcome::Success(value))
    }

    /// Resolves with a failure.
    pub fn resolve_error(&self, error: E) -> bool {
        self.resolve(Outcome::Failure(error))
    }

    /// Resolves, surfacing a failed attempt as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::AlreadyResolved`](crate::ErrorKind) if
    /// another resolution already won (or the deferred was abandoned).
    pub fn resolve_checked(&self, outcome: Outcome<V, E>) -> Result<(), Error> {
        if self.resolve(outcome) {
            Ok(())
        } else {
            Err(Error::already_resolved())
        }
    }
}

impl<V, E> Resolver<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static + From<Error>,
{
    /// Cancels the deferred: resolves it with a canceled failure.
    ///
    /// Returns true iff this call performed the resolution.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        self.resolve_error(E::from(Error::canceled(reason)))
    }
}

impl<V, E> std::fmt::Debug for Resolver<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("live", &(self.shared.strong_count() > 0))
            .finish()
    }
}
