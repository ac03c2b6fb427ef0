//! Lifecycle configuration for the hook.

use serde::Deserialize;

use crate::domain::BranchName;

/// Settings for the run lifecycle coordinator.
#[derive(Debug, Deserialize, Clone)]
pub struct HookSettings {
    /// Branch runs work on when they do not request one (default: "master").
    pub default_branch: BranchName,
}
