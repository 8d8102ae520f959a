//! Any-of aggregation: `first_value`, `first_resolved`.
//!
//! "First" means first by arrival at the aggregator's resolver CAS, not
//! by position in the input collection.

use super::executor_for;
use crate::deferred::Deferred;
use crate::error::Error;
use crate::tracing_compat::trace;
use crate::types::Outcome;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Resolves with the first successful value among the inputs.
///
/// If every input fails, resolves with the last-observed failure. Empty
/// input fails as canceled. With `cancel_losers`, the remaining inputs
/// are cancelled once the aggregator resolves.
#[must_use]
pub fn first_value<V, E>(inputs: Vec<Deferred<V, E>>, cancel_losers: bool) -> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static + From<Error>,
{
    let executor = executor_for(&inputs);
    if inputs.is_empty() {
        return Deferred::failed_on(executor, E::from(Error::canceled("empty")));
    }

    let (resolver, downstream) = Deferred::pair_on(executor);
    resolver.retain_source(inputs.clone());

    let remaining_failures = Arc::new(AtomicUsize::new(inputs.len()));
    let losers = cancel_losers.then(|| Arc::new(inputs.clone()));

    for input in &inputs {
        let resolver = resolver.clone();
        let remaining_failures = Arc::clone(&remaining_failures);
        let losers = losers.clone();
        input.observe(move |outcome| {
            let won = match outcome {
                Outcome::Success(value) => resolver.resolve_value(value),
                Outcome::Failure(error) => {
                    // Only the failure that exhausts the input set
                    // resolves; earlier failures keep waiting for a
                    // success.
                    remaining_failures.fetch_sub(1, Ordering::AcqRel) == 1
                        && resolver.resolve_error(error)
                }
            };
            if won {
                if let Some(losers) = losers {
                    cancel_all(&losers);
                }
            }
        });
    }

    downstream
}

/// Resolves with the first input to resolve, success or failure.
///
/// Empty input fails as canceled. With `cancel_losers`, the remaining
/// inputs are cancelled once a winner arrives.
#[must_use]
pub fn first_resolved<V, E>(inputs: Vec<Deferred<V, E>>, cancel_losers: bool) -> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static + From<Error>,
{
    let executor = executor_for(&inputs);
    if inputs.is_empty() {
        return Deferred::failed_on(executor, E::from(Error::canceled("empty")));
    }

    let (resolver, downstream) = Deferred::pair_on(executor);
    resolver.retain_source(inputs.clone());

    let losers = cancel_losers.then(|| Arc::new(inputs.clone()));

    for input in &inputs {
        let resolver = resolver.clone();
        let losers = losers.clone();
        input.observe(move |outcome| {
            if resolver.resolve(outcome) {
                if let Some(losers) = losers {
                    cancel_all(&losers);
                }
            }
        });
    }

    downstream
}

fn cancel_all<V, E>(inputs: &[Deferred<V, E>])
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static + From<Error>,
{
    trace!(count = inputs.len(), "cancelling losing inputs");
    for input in inputs {
        // The winner is already resolved; cancelling it is a no-op.
        input.cancel("race lost");
    }
}

#[cfg(test)]
mod tests {
    use super::{first_resolved, first_value};
    use crate::error::Error;
    use crate::executor::{Executor, LabExecutor};
    use crate::types::Outcome;
    use crate::Deferred;
    use std::sync::Arc;

    fn lab() -> (Arc<LabExecutor>, Arc<dyn Executor>) {
        let lab = Arc::new(LabExecutor::new());
        let executor: Arc<dyn Executor> = Arc::clone(&lab) as _;
        (lab, executor)
    }

    #[test]
    fn first_value_skips_failures_for_a_later_success() {
        let (lab, executor) = lab();
        let (success, pending) = Deferred::<i32, Error>::pair_on(Arc::clone(&executor));
        let winner = first_value(
            vec![
                Deferred::failed_on(Arc::clone(&executor), Error::invalid("a")),
                pending,
            ],
            false,
        );

        lab.run_until_idle();
        assert_eq!(winner.peek(), None, "one failure must not resolve the race");

        success.resolve_value(5);
        lab.run_until_idle();
        assert_eq!(winner.peek(), Some(Outcome::Success(5)));
    }

    #[test]
    fn first_value_of_all_failures_is_the_last_observed() {
        let (lab, executor) = lab();
        let (last, pending) = Deferred::<i32, Error>::pair_on(Arc::clone(&executor));
        let winner = first_value(
            vec![
                Deferred::failed_on(Arc::clone(&executor), Error::invalid("first")),
                pending,
            ],
            false,
        );

        lab.run_until_idle();
        last.resolve_error(Error::invalid("last"));
        lab.run_until_idle();

        let error = winner.peek().and_then(Outcome::failure).expect("failed");
        assert_eq!(error.reason(), Some("last"));
    }

    #[test]
    fn empty_input_is_canceled() {
        let winner = first_value(Vec::<Deferred<i32, Error>>::new(), false);
        let error = winner.peek().and_then(Outcome::failure).expect("failed");
        assert!(error.is_canceled());
        assert_eq!(error.reason(), Some("empty"));
    }

    #[test]
    fn first_resolved_takes_failures_too() {
        let (lab, executor) = lab();
        let (_never, pending) = Deferred::<i32, Error>::pair_on(Arc::clone(&executor));
        let winner = first_resolved(
            vec![
                Deferred::failed_on(Arc::clone(&executor), Error::invalid("quick")),
                pending,
            ],
            false,
        );

        lab.run_until_idle();
        let error = winner.peek().and_then(Outcome::failure).expect("failed");
        assert_eq!(error.reason(), Some("quick"));
    }

    #[test]
    fn cancel_losers_cancels_the_rest() {
        let (lab, executor) = lab();
        let (slow_resolver, slow) = Deferred::<i32, Error>::pair_on(Arc::clone(&executor));
        let slow_handle = slow.clone();
        let winner = first_resolved(
            vec![Deferred::resolved_on(Arc::clone(&executor), 1), slow],
            true,
        );

        lab.run_until_idle();
        assert_eq!(winner.peek(), Some(Outcome::Success(1)));

        let error = slow_handle
            .peek()
            .and_then(Outcome::failure)
            .expect("loser cancelled");
        assert!(error.is_canceled());
        assert!(!slow_resolver.needs_resolution());
    }
}
