//! Submission flow phases.
//!
//! ```text
//! Idle --submit--> Validating --(local invalid)--> Idle
//! Validating --(local valid)--> Authenticating
//! Authenticating --(success)--> Idle
//! Authenticating --(failure)--> ErrorDisplayed --(resubmit)--> Validating
//! ```

use std::fmt;

/// Monotonic identifier for one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(u64);

impl AttemptId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowPhase {
    #[default]
    Idle,
    /// Local validation in progress for a submit.
    Validating,
    /// The authentication call for `attempt` is outstanding.
    Authenticating { attempt: AttemptId },
    /// The last attempt was rejected; waiting for the user to resubmit.
    ErrorDisplayed,
}

impl FlowPhase {
    #[must_use]
    pub fn is_authenticating(self) -> bool {
        matches!(self, FlowPhase::Authenticating { .. })
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FlowPhase::Idle => "idle",
            FlowPhase::Validating => "validating",
            FlowPhase::Authenticating { .. } => "authenticating",
            FlowPhase::ErrorDisplayed => "error",
        }
    }
}
