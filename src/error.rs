//! Error types for the deferred library.
//!
//! Errors flow through deferreds as values, not as control-flow transfers.
//! The library injects failures of this type (cancellation, timeouts,
//! contract violations); user code routes its own error types through the
//! typed failure channel, or widens into [`Error`] via the throwing
//! combinators (`try_map`, `try_flat_map`, `validate`).
//!
//! Principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - Errors are clonable so one failure can broadcast to many observers
//! - No error is recovered inside the core except by `recover`/`retrying`

use core::fmt;
use std::sync::Arc;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Explicit cancellation, or cancellation propagated from a dropped
    /// downstream.
    Canceled,
    /// A timeout combinator's deadline elapsed.
    TimedOut,
    /// A second attempt to resolve an already-resolved deferred.
    AlreadyResolved,
    /// Contract violation: empty aggregator input, failed validation,
    /// bad arguments.
    Invalid,
    /// A foreign error carried through a widened failure channel.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => write!(f, "canceled"),
            Self::TimedOut => write!(f, "timed out"),
            Self::AlreadyResolved => write!(f, "already resolved"),
            Self::Invalid => write!(f, "invalid"),
            Self::Other => write!(f, "error"),
        }
    }
}

/// The error type injected and surfaced by the library.
///
/// An `Error` is a [`kind`](Self::kind) plus optional reason text and an
/// optional source error. Cloning is cheap: the source is reference
/// counted so a single failure can fan out to every observer.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind and no reason text.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            reason: None,
            source: None,
        }
    }

    /// Creates a cancellation error with the given reason.
    #[must_use]
    pub fn canceled(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Canceled).with_reason(reason)
    }

    /// Creates a timeout error with the given reason.
    #[must_use]
    pub fn timed_out(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::TimedOut).with_reason(reason)
    }

    /// Creates an error for a second resolution attempt.
    #[must_use]
    pub const fn already_resolved() -> Self {
        Self::new(ErrorKind::AlreadyResolved)
    }

    /// Creates a contract-violation error with the given message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid).with_reason(message)
    }

    /// Wraps a foreign error for transport through a widened channel.
    #[must_use]
    pub fn other(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::new(ErrorKind::Other).with_source(source)
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason text, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns true if this error represents cancellation.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self.kind, ErrorKind::Canceled)
    }

    /// Returns true if this error represents an elapsed timeout.
    #[must_use]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self.kind, ErrorKind::TimedOut)
    }

    /// Adds reason text to the error.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }
}

// Equality ignores the source chain: two errors match when kind and
// reason text match.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.reason == other.reason
    }
}

impl Eq for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(reason) = &self.reason {
            write!(f, ": {reason}")?;
        }
        if self.reason.is_none() {
            if let Some(source) = &self.source {
                write!(f, ": {source}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug)]
    struct Underlying;

    impl fmt::Display for Underlying {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "underlying")
        }
    }

    impl std::error::Error for Underlying {}

    #[test]
    fn display_includes_kind_and_reason() {
        let err = Error::canceled("consumer went away");
        assert_eq!(err.to_string(), "canceled: consumer went away");

        let bare = Error::already_resolved();
        assert_eq!(bare.to_string(), "already resolved");
    }

    #[test]
    fn other_exposes_the_source_chain() {
        let err = Error::other(Underlying);
        assert_eq!(err.kind(), ErrorKind::Other);
        let source = err.source().expect("source missing");
        assert_eq!(source.to_string(), "underlying");
        assert_eq!(err.to_string(), "error: underlying");
    }

    #[test]
    fn predicates_match_kind() {
        assert!(Error::canceled("x").is_canceled());
        assert!(!Error::canceled("x").is_timed_out());
        assert!(Error::timed_out("slow").is_timed_out());
        assert_eq!(Error::invalid("bad").kind(), ErrorKind::Invalid);
    }

    #[test]
    fn clones_share_the_source() {
        let err = Error::other(Underlying);
        let clone = err.clone();
        assert_eq!(clone.kind(), ErrorKind::Other);
        assert!(clone.source().is_some());
    }
}
