//! Failure recovery: `recover`.

use super::derived;
use crate::deferred::Deferred;
use crate::types::Outcome;

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Chains a deferred-producing function on the failure branch.
    ///
    /// On source failure, `f(e)` produces a replacement deferred whose
    /// resolution is forwarded downstream; on source success, the value
    /// is forwarded unchanged. The failure channel may change type.
    #[must_use]
    pub fn recover<E2, F>(&self, f: F) -> Deferred<V, E2>
    where
        E2: Clone + Send + Sync + 'static,
        F: FnOnce(E) -> Deferred<V, E2> + Send + 'static,
    {
        derived(self, move |outcome, resolver| match outcome {
            Outcome::Success(value) => {
                resolver.resolve_value(value);
            }
            Outcome::Failure(error) => {
                let replacement = f(error);
                resolver.retain_source(replacement.clone());
                replacement.observe(move |inner| {
                    resolver.resolve(inner);
                });
            }
        })
    }
}

#[cfg(test)]
mod tests {
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
    fn recover_replaces_a_failure() {
        let (lab, executor) = lab();
        let inner_executor = Arc::clone(&executor);
        let recovered = Deferred::<i32, Error>::failed_on(executor, Error::invalid("bad"))
            .recover(move |_| Deferred::<i32, Error>::resolved_on(inner_executor, 99));
        lab.run_until_idle();
        assert_eq!(recovered.peek(), Some(Outcome::Success(99)));
    }

    #[test]
    fn recover_passes_success_through() {
        let (lab, executor) = lab();
        let recovered = Deferred::<i32, Error>::resolved_on(executor, 4)
            .recover(|_| -> Deferred<i32, Error> { unreachable!("source succeeded") });
        lab.run_until_idle();
        assert_eq!(recovered.peek(), Some(Outcome::Success(4)));
    }

    #[test]
    fn recover_can_change_the_error_type() {
        let (lab, executor) = lab();
        let inner_executor = Arc::clone(&executor);
        let recovered = Deferred::<i32, Error>::failed_on(executor, Error::invalid("bad"))
            .recover(move |error| {
                Deferred::<i32, String>::failed_on(inner_executor, error.to_string())
            });
        lab.run_until_idle();
        assert_eq!(
            recovered.peek(),
            Some(Outcome::Failure("invalid: bad".to_string()))
        );
    }
}
