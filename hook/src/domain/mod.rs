//! Domain types - validated names and commit values
//!
//! Everything that reaches the engine as user-controlled text passes through
//! one of these types first.

pub mod commit;
pub mod names;

pub use commit::{CommitId, CommitMessage};
pub use names::{BranchName, DatabaseName, NameError};
