//! Sequential aggregation: `reduce`.

use super::executor_for;
use crate::deferred::Deferred;
use crate::types::Outcome;
use std::sync::Arc;

/// Left-folds the inputs' values in input order.
///
/// Inputs are observed sequentially through a chained `flat_map`: a
/// later input contributes only after every earlier one has resolved
/// successfully. The first failure terminates the fold and propagates.
#[must_use]
pub fn reduce<U, V, E, F>(inputs: Vec<Deferred<V, E>>, initial: U, f: F) -> Deferred<U, E>
where
    U: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(U, V) -> U + Send + Sync + 'static,
{
    let executor = executor_for(&inputs);
    let f = Arc::new(f);
    let mut accumulated = Deferred::from_outcome_on(executor, Outcome::Success(initial));
    for input in inputs {
        let f = Arc::clone(&f);
        accumulated = accumulated.flat_map(move |acc| {
            let f = Arc::clone(&f);
            input.map(move |value| f(acc, value))
        });
    }
    accumulated
}
