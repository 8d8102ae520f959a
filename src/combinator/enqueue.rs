//! Executor redirection: `enqueuing_on`, `enqueuing_at`.

use super::derived_on;
use crate::deferred::Deferred;
use crate::executor::{Executor, WithQos};
use crate::types::Qos;
use std::sync::Arc;

impl<V, E> Deferred<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Identity transform whose downstream dispatches handlers on
    /// `executor` instead of this deferred's executor.
    #[must_use]
    pub fn enqueuing_on(&self, executor: Arc<dyn Executor>) -> Self {
        derived_on(self, executor, |outcome, resolver| {
            resolver.resolve(outcome);
        })
    }

    /// Identity transform whose downstream dispatches handlers with a
    /// pinned QoS hint.
    #[must_use]
    pub fn enqueuing_at(&self, qos: Qos) -> Self {
        let pinned: Arc<dyn Executor> = Arc::new(WithQos::new(self.executor(), qos));
        self.enqueuing_on(pinned)
    }
}
