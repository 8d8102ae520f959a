//! Deadline-gated forwarding: `delay`.

use super::derived;
use crate::deferred::Deferred;
use crate::executor::Job;
use crate::types::{Outcome, Time};
use std::time::Duration;

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Forwards the result no earlier than `duration` from now.
    ///
    /// The deadline is fixed at construction on this deferred's
    /// executor clock.
    #[must_use]
    pub fn delay(&self, duration: Duration) -> Self {
        self.delay_until(self.executor().now() + duration)
    }

    /// Forwards the result no earlier than `deadline`.
    ///
    /// Failures bypass the delay and propagate immediately. A deadline
    /// in the past reduces to an identity transform.
    #[must_use]
    pub fn delay_until(&self, deadline: Time) -> Self {
        let executor = self.executor();
        derived(self, move |outcome, resolver| match outcome {
            success @ Outcome::Success(_) => {
                let job: Job = Box::new(move || {
                    resolver.resolve(success);
                });
                executor.submit_after(deadline, job);
            }
            failure @ Outcome::Failure(_) => {
                resolver.resolve(failure);
            }
        })
    }
}
