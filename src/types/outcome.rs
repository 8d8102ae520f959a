//! Two-valued outcome type.
//!
//! The outcome type represents the final result of a deferred computation:
//!
//! - `Success(V)`: the computation produced a value
//! - `Failure(E)`: the computation failed with an error
//!
//! Once a deferred resolves, its outcome is immutable and is broadcast to
//! every observer. Because an outcome may fan out to any number of
//! observers, broadcast paths require `V: Clone` and `E: Clone`.

use core::fmt;

/// The final result of a deferred computation.
///
/// An `Outcome` is pure data: combinators transform it with [`map`],
/// [`map_err`] and [`and_then`] without touching the resolution machinery.
///
/// [`map`]: Outcome::map
/// [`map_err`]: Outcome::map_err
/// [`and_then`]: Outcome::and_then
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<V, E> {
    /// The computation produced a value.
    Success(V),
    /// The computation failed.
    Failure(E),
}

impl<V, E> Outcome<V, E> {
    /// Returns true if this outcome is `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if this outcome is `Failure`.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the success value, discarding a failure.
    #[must_use]
    pub fn success(self) -> Option<V> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure value, discarding a success.
    #[must_use]
    pub fn failure(self) -> Option<E> {
        match self {
            Self::Success(_) => None,
            Self::Failure(e) => Some(e),
        }
    }

    /// Converts from `&Outcome<V, E>` to `Outcome<&V, &E>`.
    #[must_use]
    pub const fn as_ref(&self) -> Outcome<&V, &E> {
        match self {
            Self::Success(v) => Outcome::Success(v),
            Self::Failure(e) => Outcome::Failure(e),
        }
    }

    /// Maps the success value using the provided function.
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Outcome<U, E> {
        match self {
            Self::Success(v) => Outcome::Success(f(v)),
            Self::Failure(e) => Outcome::Failure(e),
        }
    }

    /// Maps the failure value using the provided function.
    pub fn map_err<F2, F: FnOnce(E) -> F2>(self, f: F) -> Outcome<V, F2> {
        match self {
            Self::Success(v) => Outcome::Success(v),
            Self::Failure(e) => Outcome::Failure(f(e)),
        }
    }

    /// Chains a fallible transform on the success branch.
    pub fn and_then<U, F: FnOnce(V) -> Outcome<U, E>>(self, f: F) -> Outcome<U, E> {
        match self {
            Self::Success(v) => f(v),
            Self::Failure(e) => Outcome::Failure(e),
        }
    }

    /// Alias for [`and_then`](Self::and_then).
    pub fn flat_map<U, F: FnOnce(V) -> Outcome<U, E>>(self, f: F) -> Outcome<U, E> {
        self.and_then(f)
    }

    /// Converts this outcome into a standard [`Result`].
    pub fn into_result(self) -> Result<V, E> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Failure(e) => Err(e),
        }
    }
}

impl<V> Outcome<V, super::Never> {
    /// Unwraps an infallible outcome.
    ///
    /// `Outcome<V, Never>` has no inhabitable failure branch, so the value
    /// is always present.
    #[must_use]
    pub fn into_value(self) -> V {
        match self {
            Self::Success(v) => v,
            Self::Failure(n) => n.absurd(),
        }
    }
}

impl<V, E> From<Result<V, E>> for Outcome<V, E> {
    fn from(result: Result<V, E>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Failure(e),
        }
    }
}

impl<V: fmt::Display, E: fmt::Display> fmt::Display for Outcome<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(v) => write!(f, "success: {v}"),
            Self::Failure(e) => write!(f, "failure: {e}"),
        }
    }
}
