//! Applicative composition: `apply`.

use super::derived;
use crate::deferred::Deferred;
use crate::types::{Never, Outcome};
use std::sync::Arc;

/// A shareable transform carried by an infallible deferred, as consumed
/// by [`Deferred::apply`].
pub type Transform<V, V2> = Arc<dyn Fn(V) -> V2 + Send + Sync>;

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Applies a deferred transform to this deferred's value.
    ///
    /// Waits for both; on both successes the transform is applied. A
    /// source failure short-circuits downstream without waiting for the
    /// transform. The transform channel is infallible by construction.
    #[must_use]
    pub fn apply<V2>(&self, transform: Deferred<Transform<V, V2>, Never>) -> Deferred<V2, E>
    where
        V2: Clone + Send + Sync + 'static,
    {
        derived(self, move |outcome, resolver| match outcome {
            Outcome::Success(value) => {
                resolver.retain_source(transform.clone());
                transform.observe(move |transform_outcome| {
                    let apply = transform_outcome.into_value();
                    resolver.resolve_value(apply(value));
                });
            }
            Outcome::Failure(error) => {
                resolver.resolve_error(error);
            }
        })
    }
}
