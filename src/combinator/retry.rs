//! Bounded re-execution: `retrying`.

use crate::deferred::Deferred;
use crate::error::Error;
use crate::tracing_compat::trace;
use std::sync::Arc;

/// Runs `task` up to `attempts` times, resolving with the first success
/// or the last failure.
///
/// Each failure chains a `recover` that runs `task` again. An attempt
/// count below 1 fails immediately as invalid.
#[must_use]
pub fn retrying<V, E, F>(attempts: u32, task: F) -> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static + From<Error>,
    F: Fn() -> Deferred<V, E> + Send + Sync + 'static,
{
    if attempts < 1 {
        return Deferred::failed(E::from(Error::invalid("attempts must be at least 1")));
    }
    run_attempt(Arc::new(task), attempts)
}

fn run_attempt<V, E, F>(task: Arc<F>, remaining: u32) -> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static + From<Error>,
    F: Fn() -> Deferred<V, E> + Send + Sync + 'static,
{
    let attempt = (task)();
    if remaining == 1 {
        // The last attempt's failure is the final failure.
        return attempt;
    }
    attempt.recover(move |_error| {
        trace!(remaining = remaining - 1, "retrying after failure");
        run_attempt(task, remaining - 1)
    })
}

#[cfg(test)]
mod tests {
    use super::retrying;
    use crate::error::{Error, ErrorKind};
    use crate::executor::{Executor, LabExecutor};
    use crate::types::Outcome;
    use crate::Deferred;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn lab() -> (Arc<LabExecutor>, Arc<dyn Executor>) {
        let lab = Arc::new(LabExecutor::new());
        let executor: Arc<dyn Executor> = Arc::clone(&lab) as _;
        (lab, executor)
    }

    fn flaky_task(
        executor: Arc<dyn Executor>,
        failures_before_success: u32,
    ) -> (Arc<AtomicU32>, impl Fn() -> Deferred<String, Error>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let task = move || {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= failures_before_success {
                Deferred::failed_on(Arc::clone(&executor), Error::invalid("nope"))
            } else {
                Deferred::resolved_on(Arc::clone(&executor), "ok".to_string())
            }
        };
        (calls, task)
    }

    #[test]
    fn succeeds_once_the_task_does() {
        let (lab, executor) = lab();
        let (calls, task) = flaky_task(executor, 2);

        let result = retrying(3, task);
        lab.run_until_idle();

        assert_eq!(result.peek(), Some(Outcome::Success("ok".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn exhausted_attempts_keep_the_last_failure() {
        let (lab, executor) = lab();
        let (calls, task) = flaky_task(executor, 10);

        let result = retrying(3, task);
        lab.run_until_idle();

        let error = result.peek().and_then(Outcome::failure).expect("failed");
        assert_eq!(error.kind(), ErrorKind::Invalid);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn first_success_stops_the_retries() {
        let (lab, executor) = lab();
        let (calls, task) = flaky_task(executor, 0);

        let result = retrying(5, task);
        lab.run_until_idle();

        assert_eq!(result.peek(), Some(Outcome::Success("ok".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let (_lab, executor) = lab();
        let (_calls, task) = flaky_task(executor, 0);

        let result = retrying(0, task);
        let error = result.peek().and_then(Outcome::failure).expect("failed");
        assert_eq!(error.kind(), ErrorKind::Invalid);
        assert_eq!(error.reason(), Some("attempts must be at least 1"));
    }
}
