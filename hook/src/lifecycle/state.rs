//! Coordinator state machine.

use core::fmt;

use crate::domain::BranchName;

/// Whether a run currently holds the engine on a branch other than the one it found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HookState {
    /// No branch override is active.
    #[default]
    Idle,
    /// A run switched branches; `original` must be checked out again when it ends.
    BranchOverridden {
        /// Branch that was active before the switch.
        original: BranchName,
        /// Branch the engine was last successfully switched to.
        active: BranchName,
    },
}

impl HookState {
    /// Branch to restore, if an override is active.
    #[must_use]
    pub fn original_branch(&self) -> Option<&BranchName> {
        match self {
            Self::Idle => None,
            Self::BranchOverridden { original, .. } => Some(original),
        }
    }

    /// Branch the override moved the engine to, if an override is active.
    #[must_use]
    pub fn active_branch(&self) -> Option<&BranchName> {
        match self {
            Self::Idle => None,
            Self::BranchOverridden { active, .. } => Some(active),
        }
    }

    /// Whether no override is active.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for HookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::BranchOverridden { original, active } => {
                write!(f, "overridden (on {active}, restore {original})")
            }
        }
    }
}
