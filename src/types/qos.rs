//! Quality-of-service classes for executor submissions.
//!
//! A [`Qos`] value is an advisory priority hint carried on submissions.
//! Executors may use it to pick a pool, raise a submission's priority, or
//! ignore it entirely. The core never depends on a hint being honored.

use core::fmt;

/// An advisory priority class for executor submissions.
///
/// Classes are ordered from least to most urgent. The ordering is advisory:
/// it influences which pool serves a submission, never correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Qos {
    /// Work the user is not waiting on (maintenance, prefetch).
    Background,
    /// Long-running work with progress the user may glance at.
    Utility,
    /// The default class for unspecified work.
    Default,
    /// Work the user explicitly started and is waiting on.
    UserInitiated,
    /// Work gating the next interaction.
    UserInteractive,
}

impl Qos {
    /// All classes, least urgent first.
    pub const ALL: [Self; 5] = [
        Self::Background,
        Self::Utility,
        Self::Default,
        Self::UserInitiated,
        Self::UserInteractive,
    ];

    /// Returns the urgency rank of this class (0 = least urgent).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Background => 0,
            Self::Utility => 1,
            Self::Default => 2,
            Self::UserInitiated => 3,
            Self::UserInteractive => 4,
        }
    }
}

impl Default for Qos {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for Qos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Background => write!(f, "background"),
            Self::Utility => write!(f, "utility"),
            Self::Default => write!(f, "default"),
            Self::UserInitiated => write!(f, "user-initiated"),
            Self::UserInteractive => write!(f, "user-interactive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_orders_classes_by_urgency() {
        let mut last = None;
        for qos in Qos::ALL {
            if let Some(prev) = last {
                assert!(qos.rank() > prev, "{qos} should outrank the previous class");
            }
            last = Some(qos.rank());
        }
    }

    #[test]
    fn derived_ordering_matches_rank() {
        assert!(Qos::Background < Qos::UserInteractive);
        assert!(Qos::Default < Qos::UserInitiated);
    }
}
