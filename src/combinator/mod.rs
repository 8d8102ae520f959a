//! Composition combinators and aggregators.
//!
//! Every combinator follows the same four-step pattern:
//!
//! 1. Construct a new deferred (and resolver) on an executor chosen by
//!    the caller, defaulting to the source's.
//! 2. Register an observer on the source that resolves the new deferred
//!    with the transformed outcome.
//! 3. Retain the source so it outlives the new deferred's resolution.
//! 4. Return the new deferred.
//!
//! Step 3 is what makes dropping a chain propagate upstream: the only
//! strong reference to an intermediate node is its downstream's
//! retainer, released at resolution or destruction.
//!
//! Transform combinators live as methods on
//! [`Deferred`](crate::Deferred) (one file per combinator); aggregators
//! over sequences are free functions re-exported here.

mod apply;
mod combine;
mod delay;
mod enqueue;
mod first;
mod flat_map;
mod map;
mod parallel;
mod recover;
mod reduce;
mod retry;
mod timeout;
mod validate;

pub use apply::Transform;
pub use combine::combine;
pub use first::{first_resolved, first_value};
pub use parallel::{in_parallel, in_parallel_on};
pub use reduce::reduce;
pub use retry::retrying;

use crate::deferred::{Deferred, Resolver};
use crate::executor::Executor;
use crate::types::Outcome;
use std::sync::Arc;

/// Builds a downstream deferred on `executor` whose resolution is driven
/// by observing `source` through `forward`.
pub(crate) fn derived_on<V, E, V2, E2, F>(
    source: &Deferred<V, E>,
    executor: Arc<dyn Executor>,
    forward: F,
) -> Deferred<V2, E2>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    V2: Clone + Send + Sync + 'static,
    E2: Clone + Send + Sync + 'static,
    F: FnOnce(Outcome<V, E>, Resolver<V2, E2>) + Send + 'static,
{
    let (resolver, downstream) = Deferred::pair_on(executor);
    resolver.retain_source(source.clone());
    source.observe(move |outcome| forward(outcome, resolver));
    downstream
}

/// [`derived_on`] inheriting the source's executor.
pub(crate) fn derived<V, E, V2, E2, F>(source: &Deferred<V, E>, forward: F) -> Deferred<V2, E2>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    V2: Clone + Send + Sync + 'static,
    E2: Clone + Send + Sync + 'static,
    F: FnOnce(Outcome<V, E>, Resolver<V2, E2>) + Send + 'static,
{
    derived_on(source, source.executor(), forward)
}

/// Picks the executor for an aggregator: the first input's, or the
/// global default for empty input.
pub(crate) fn executor_for<V, E>(inputs: &[Deferred<V, E>]) -> Arc<dyn Executor> {
    match inputs.first() {
        Some(first) => first.executor(),
        None => crate::executor::default_global(),
    }
}
