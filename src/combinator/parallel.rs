//! Fan-out helper: `in_parallel`.

use crate::deferred::Deferred;
use crate::executor::Executor;
use crate::types::Never;
use std::sync::Arc;

/// Produces `count` infallible deferreds, each computing `f(index)` on
/// the global default pool.
#[must_use]
pub fn in_parallel<V, F>(count: usize, f: F) -> Vec<Deferred<V, Never>>
where
    V: Clone + Send + Sync + 'static,
    F: Fn(usize) -> V + Send + Sync + 'static,
{
    in_parallel_on(crate::executor::default_global(), count, f)
}

/// [`in_parallel`] on an explicit executor.
#[must_use]
pub fn in_parallel_on<V, F>(
    executor: Arc<dyn Executor>,
    count: usize,
    f: F,
) -> Vec<Deferred<V, Never>>
where
    V: Clone + Send + Sync + 'static,
    F: Fn(usize) -> V + Send + Sync + 'static,
{
    let f = Arc::new(f);
    (0..count)
        .map(|index| {
            let f = Arc::clone(&f);
            Deferred::with_producer(Arc::clone(&executor), move |resolver| {
                resolver.resolve_value(f(index));
            })
        })
        .collect()
}
