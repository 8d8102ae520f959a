//! Adeferred: composable, lock-free, typed deferreds for asynchronous
//! value propagation.
//!
//! # Overview
//!
//! A [`Deferred`] is a handle to a computation whose result — a success
//! value or a failure — becomes available at some future time. Once
//! resolved, the result is immutable and broadcast to every registered
//! observer. Producers resolve through a [`Resolver`]; consumers observe,
//! peek, block, or compose.
//!
//! # Core Guarantees
//!
//! - **At-most-once resolution**: exactly one resolution attempt per
//!   deferred succeeds; the result never changes afterwards
//! - **No lost notifications**: every observer fires exactly once,
//!   whether registered before or after resolution, with no locks on the
//!   observation path
//! - **No reentrancy**: handlers are always submitted through the
//!   deferred's executor, never invoked on the caller's stack
//! - **Transparent upstream cancellation**: dropping the last handle of
//!   a combinator chain releases the chain's retainers, letting producers
//!   watching [`Resolver::needs_resolution`] abandon work
//!
//! # Module Structure
//!
//! - [`types`]: core value types ([`Outcome`], [`Never`], [`Qos`], [`Time`])
//! - [`error`]: the error taxonomy injected and surfaced by the library
//! - [`executor`]: the host-concurrency seam and the bundled thread-pool
//!   and lab executors
//! - [`deferred`]: the resolution cell, public handle, and resolver
//! - [`combinator`]: transforms and aggregators over deferreds
//!
//! # Example
//!
//! ```ignore
//! use adeferred::{combine, Deferred, Error, Outcome};
//!
//! let total = combine(vec![
//!     Deferred::<i32, Error>::resolved(1),
//!     Deferred::resolved(2),
//!     Deferred::resolved(3),
//! ])
//! .map(|values| values.into_iter().sum::<i32>());
//!
//! assert_eq!(total.get(), Outcome::Success(6));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod combinator;
pub mod deferred;
pub mod error;
pub mod executor;
pub mod test_utils;
pub mod types;

pub(crate) mod tracing_compat;

pub use combinator::{
    combine, first_resolved, first_value, in_parallel, in_parallel_on, reduce, retrying, Transform,
};
pub use deferred::{Deferred, DeferredState, Resolver};
pub use error::{Error, ErrorKind};
pub use executor::{Executor, Job, LabExecutor, PoolConfig, ThreadPool, WithQos};
pub use types::{Never, Outcome, Qos, Time};
