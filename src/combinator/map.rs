//! Value and error transforms: `map`, `map_err`, `try_map`.

use super::derived;
use crate::deferred::Deferred;
use crate::error::Error;
use crate::types::Outcome;

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Transforms the success value; failures pass through unchanged.
    #[must_use]
    pub fn map<V2, F>(&self, f: F) -> Deferred<V2, E>
    where
        V2: Clone + Send + Sync + 'static,
        F: FnOnce(V) -> V2 + Send + 'static,
    {
        derived(self, move |outcome, resolver| {
            resolver.resolve(outcome.map(f));
        })
    }

    /// Transforms the failure payload; successes pass through unchanged.
    #[must_use]
    pub fn map_err<E2, F>(&self, f: F) -> Deferred<V, E2>
    where
        E2: Clone + Send + Sync + 'static,
        F: FnOnce(E) -> E2 + Send + 'static,
    {
        derived(self, move |outcome, resolver| {
            resolver.resolve(outcome.map_err(f));
        })
    }

    /// Transforms the success value through a fallible function, widening
    /// the failure channel to [`Error`].
    ///
    /// A returned `Err` becomes the downstream failure; source failures
    /// convert through `E: Into<Error>`.
    #[must_use]
    pub fn try_map<V2, E2, F>(&self, f: F) -> Deferred<V2, Error>
    where
        E: Into<Error>,
        V2: Clone + Send + Sync + 'static,
        E2: Into<Error>,
        F: FnOnce(V) -> Result<V2, E2> + Send + 'static,
    {
        derived(self, move |outcome, resolver| {
            match outcome {
                Outcome::Success(value) => match f(value) {
                    Ok(mapped) => resolver.resolve_value(mapped),
                    Err(error) => resolver.resolve_error(error.into()),
                },
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
    fn map_transforms_the_value() {
        let (lab, executor) = lab();
        let mapped = Deferred::<i32, Error>::resolved_on(executor, 20).map(|v| v + 1);
        lab.run_until_idle();
        assert_eq!(mapped.peek(), Some(Outcome::Success(21)));
    }

    #[test]
    fn map_passes_failures_through() {
        let (lab, executor) = lab();
        let mapped =
            Deferred::<i32, Error>::failed_on(executor, Error::invalid("nope")).map(|v| v + 1);
        lab.run_until_idle();
        let error = mapped.peek().and_then(Outcome::failure).expect("failure");
        assert_eq!(error.kind(), ErrorKind::Invalid);
    }

    #[test]
    fn map_err_rewrites_the_failure() {
        let (lab, executor) = lab();
        let mapped = Deferred::<i32, Error>::failed_on(executor, Error::invalid("nope"))
            .map_err(|e| format!("wrapped: {e}"));
        lab.run_until_idle();
        assert_eq!(
            mapped.peek(),
            Some(Outcome::Failure("wrapped: invalid: nope".to_string()))
        );
    }

    #[test]
    fn try_map_catches_the_returned_error() {
        let (lab, executor) = lab();
        let mapped = Deferred::<i32, Error>::resolved_on(executor, 7)
            .try_map(|v| -> Result<i32, Error> { Err(Error::invalid(format!("odd: {v}"))) });
        lab.run_until_idle();
        let error = mapped.peek().and_then(Outcome::failure).expect("failure");
        assert_eq!(error.kind(), ErrorKind::Invalid);
        assert_eq!(error.reason(), Some("odd: 7"));
    }

    #[test]
    fn try_map_widens_source_failures() {
        let (lab, executor) = lab();
        let mapped = Deferred::<i32, Error>::failed_on(executor, Error::canceled("gone"))
            .try_map(|v| -> Result<i32, Error> { Ok(v) });
        lab.run_until_idle();
        let error = mapped.peek().and_then(Outcome::failure).expect("failure");
        assert!(error.is_canceled());
    }

    #[test]
    fn chained_maps_compose() {
        let (lab, executor) = lab();
        let chained = Deferred::<i32, Error>::resolved_on(executor, 1)
            .map(|v| v + 1)
            .map(|v| v * 10);
        lab.run_until_idle();
        assert_eq!(chained.peek(), Some(Outcome::Success(20)));
    }
}
