//! Shared helpers for tests.
//!
//! Provides once-guarded tracing initialization and a lab fixture used
//! across unit and integration tests.

use crate::executor::{Executor, LabExecutor};
use std::sync::Arc;

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only the first call initializes.
#[cfg(feature = "tracing-integration")]
pub fn init_test_logging() {
    use std::sync::Once;

    static INIT_LOGGING: Once = Once::new();
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}

/// No-op when the `tracing-integration` feature is disabled.
#[cfg(not(feature = "tracing-integration"))]
pub fn init_test_logging() {}

/// Creates a lab executor plus its type-erased handle.
#[must_use]
pub fn lab_fixture() -> (Arc<LabExecutor>, Arc<dyn Executor>) {
    let lab = Arc::new(LabExecutor::new());
    let executor: Arc<dyn Executor> = Arc::clone(&lab) as _;
    (lab, executor)
}
