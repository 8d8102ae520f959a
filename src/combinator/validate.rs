//! Predicate gating: `validate`.

use super::derived;
use crate::deferred::Deferred;
use crate::error::Error;
use crate::types::Outcome;

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Fails the chain when `predicate` rejects the value.
    ///
    /// A rejected value becomes an invalid-failure with a generic
    /// message; successes that pass the predicate and all failures flow
    /// through (failures widened via `E: Into<Error>`).
    #[must_use]
    pub fn validate<P>(&self, predicate: P) -> Deferred<V, Error>
    where
        E: Into<Error>,
        P: FnOnce(&V) -> bool + Send + 'static,
    {
        self.validate_with(predicate, "validation failed")
    }

    /// [`validate`](Self::validate) with a custom rejection message.
    #[must_use]
    pub fn validate_with<P>(&self, predicate: P, message: impl Into<String>) -> Deferred<V, Error>
    where
        E: Into<Error>,
        P: FnOnce(&V) -> bool + Send + 'static,
    {
        let message = message.into();
        derived(self, move |outcome, resolver| {
            match outcome {
                Outcome::Success(value) => {
                    if predicate(&value) {
                        resolver.resolve_value(value)
                    } else {
                        resolver.resolve_error(Error::invalid(message))
                    }
                }
                Outcome::Failure(error) => resolver.resolve_error(error.into()),
            };
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, ErrorKind};
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
    fn passing_values_flow_through() {
        let (lab, executor) = lab();
        let validated =
            Deferred::<i32, Error>::resolved_on(executor, 8).validate(|v| v % 2 == 0);
        lab.run_until_idle();
        assert_eq!(validated.peek(), Some(Outcome::Success(8)));
    }

    #[test]
    fn rejected_values_become_invalid_failures() {
        let (lab, executor) = lab();
        let validated = Deferred::<i32, Error>::resolved_on(executor, 7)
            .validate_with(|v| v % 2 == 0, "must be even");
        lab.run_until_idle();
        let error = validated.peek().and_then(Outcome::failure).expect("failure");
        assert_eq!(error.kind(), ErrorKind::Invalid);
        assert_eq!(error.reason(), Some("must be even"));
    }

    #[test]
    fn source_failures_pass_through_widened() {
        let (lab, executor) = lab();
        let validated = Deferred::<i32, Error>::failed_on(executor, Error::canceled("gone"))
            .validate(|_| true);
        lab.run_until_idle();
        let error = validated.peek().and_then(Outcome::failure).expect("failure");
        assert!(error.is_canceled());
    }
}
