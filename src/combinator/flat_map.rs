//! Monadic chaining: `flat_map`, `try_flat_map`.

use super::derived;
use crate::deferred::Deferred;
use crate::error::Error;
use crate::types::Outcome;

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Chains a deferred-producing function on the success branch.
    ///
    /// On source success, `f(v)` produces the next deferred whose
    /// resolution is forwarded downstream; on source failure, the error
    /// is forwarded directly. The failure channel is unchanged.
    #[must_use]
    pub fn flat_map<V2, F>(&self, f: F) -> Deferred<V2, E>
    where
        V2: Clone + Send + Sync + 'static,
        F: FnOnce(V) -> Deferred<V2, E> + Send + 'static,
    {
        derived(self, move |outcome, resolver| match outcome {
            Outcome::Success(value) => {
                let next = f(value);
                // The retainer switches from the (now resolved) source
                // to the inner deferred.
                resolver.retain_source(next.clone());
                next.observe(move |inner| {
                    resolver.resolve(inner);
                });
            }
            Outcome::Failure(error) => {
                resolver.resolve_error(error);
            }
        })
    }

    /// Chains a fallible deferred-producing function, widening the
    /// failure channel to [`Error`].
    #[must_use]
    pub fn try_flat_map<V2, E2, F>(&self, f: F) -> Deferred<V2, Error>
    where
        E: Into<Error>,
        V2: Clone + Send + Sync + 'static,
        E2: Into<Error>,
        F: FnOnce(V) -> Result<Deferred<V2, Error>, E2> + Send + 'static,
    {
        derived(self, move |outcome, resolver| match outcome {
            Outcome::Success(value) => match f(value) {
                Ok(next) => {
                    resolver.retain_source(next.clone());
                    next.observe(move |inner| {
                        resolver.resolve(inner);
                    });
                }
                Err(error) => {
                    resolver.resolve_error(error.into());
                }
            },
            Outcome::Failure(error) => {
                resolver.resolve_error(error.into());
            }
        })
    }
}
