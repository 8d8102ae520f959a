//! Deadline enforcement: `timeout`.

use crate::deferred::Deferred;
use crate::error::Error;
use crate::executor::Job;
use crate::tracing_compat::trace;
use std::sync::Arc;
use std::time::Duration;

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static + From<Error>,
{
    /// Fails the chain with a timed-out error if the source has not
    /// resolved within `duration`.
    #[must_use]
    pub fn timeout(&self, duration: Duration) -> Self {
        self.timeout_with(duration, "deadline elapsed")
    }

    /// [`timeout`](Self::timeout) with a custom reason.
    ///
    /// If the deadline fires first, downstream resolves with
    /// `TimedOut(reason)` and the source is cancelled; otherwise the
    /// source result is forwarded unchanged and the armed timer becomes
    /// a no-op.
    #[must_use]
    pub fn timeout_with(&self, duration: Duration, reason: impl Into<String>) -> Self {
        let executor = self.executor();
        let deadline = executor.now() + duration;
        let reason = reason.into();

        let (resolver, downstream) = Self::pair_on(Arc::clone(&executor));
        resolver.retain_source(self.clone());
        {
            let resolver = resolver.clone();
            self.observe(move |outcome| {
                resolver.resolve(outcome);
            });
        }

        let source = self.clone();
        let job: Job = Box::new(move || {
            if resolver.resolve_error(E::from(Error::timed_out(reason.clone()))) {
                trace!(reason = %reason, "timeout fired; cancelling source");
                source.cancel(reason);
            }
        });
        executor.submit_after(deadline, job);

        downstream
    }
}
