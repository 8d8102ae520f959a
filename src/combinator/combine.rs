//! All-of aggregation: `combine`.

use super::executor_for;
use crate::deferred::Deferred;
use crate::tracing_compat::trace;
use crate::types::Outcome;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Collects every input's value, in input order.
///
/// Succeeds when all inputs succeed. Fails with the first failure *by
/// arrival* and ignores later results; released retainers may then
/// cancel abandoned upstreams by reference drop. Empty input succeeds
/// with an empty vector.
#[must_use]
pub fn combine<V, E>(inputs: Vec<Deferred<V, E>>) -> Deferred<Vec<V>, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    let executor = executor_for(&inputs);
    if inputs.is_empty() {
        return Deferred::from_outcome_on(executor, Outcome::Success(Vec::new()));
    }

    let (resolver, downstream) = Deferred::pair_on(executor);
    resolver.retain_source(inputs.clone());

    let remaining = Arc::new(AtomicUsize::new(inputs.len()));
    let slots: Arc<Mutex<Vec<Option<V>>>> = Arc::new(Mutex::new(vec![None; inputs.len()]));

    for (index, input) in inputs.iter().enumerate() {
        let resolver = resolver.clone();
        let remaining = Arc::clone(&remaining);
        let slots = Arc::clone(&slots);
        input.observe(move |outcome| match outcome {
            Outcome::Success(value) => {
                slots.lock()[index] = Some(value);
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let values = slots
                        .lock()
                        .iter_mut()
                        .map(|slot| slot.take().expect("every slot filled before the last"))
                        .collect();
                    resolver.resolve_value(values);
                }
            }
            Outcome::Failure(error) => {
                if resolver.resolve_error(error) {
                    trace!(index, "combine short-circuited by failure");
                }
            }
        });
    }

    downstream
}

#[cfg(test)]
mod tests {
    use super::combine;
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
    fn collects_values_in_input_order() {
        let (lab, executor) = lab();
        // The middle input resolves last; order must still follow input
        // positions.
        let (late, middle) = Deferred::<i32, Error>::pair_on(Arc::clone(&executor));
        let inputs = vec![
            Deferred::resolved_on(Arc::clone(&executor), 1),
            middle,
            Deferred::resolved_on(Arc::clone(&executor), 3),
        ];
        let all = combine(inputs);

        lab.run_until_idle();
        assert_eq!(all.peek(), None);

        late.resolve_value(2);
        lab.run_until_idle();
        assert_eq!(all.peek(), Some(Outcome::Success(vec![1, 2, 3])));
    }

    #[test]
    fn empty_input_succeeds_immediately() {
        let all = combine(Vec::<Deferred<i32, Error>>::new());
        assert_eq!(all.peek(), Some(Outcome::Success(Vec::new())));
    }

    #[test]
    fn first_failure_by_arrival_wins() {
        let (lab, executor) = lab();
        let (slow, pending) = Deferred::<i32, Error>::pair_on(Arc::clone(&executor));
        let inputs = vec![
            Deferred::resolved_on(Arc::clone(&executor), 1),
            pending,
            Deferred::failed_on(Arc::clone(&executor), Error::canceled("x")),
        ];
        let all = combine(inputs);

        lab.run_until_idle();
        let error = all.peek().and_then(Outcome::failure).expect("failed");
        assert!(error.is_canceled());
        assert_eq!(error.reason(), Some("x"));

        // A late success on the remaining input changes nothing.
        slow.resolve_value(2);
        lab.run_until_idle();
        let error = all.peek().and_then(Outcome::failure).expect("still failed");
        assert!(error.is_canceled());
    }
}
