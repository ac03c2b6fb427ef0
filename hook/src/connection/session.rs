//! Session and connector contracts.
//!
//! Controllers depend on these traits, not on a driver. A session is opened
//! per logical operation and either finished (transaction committed,
//! connection closed) or dropped (connection released, open work discarded).

use async_trait::async_trait;

use super::error::EngineError;
use crate::domain::{BranchName, CommitId, CommitMessage};

/// How a checkout reaches the requested branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    /// Switch to a branch that already exists.
    Switch,
    /// Create the branch from the current head, then switch to it.
    Create,
}

/// One short-lived conversation with the engine.
///
/// Each method maps to exactly one statement of the fixed vocabulary.
#[async_trait]
pub trait EngineSession: Send {
    /// Branch the session is on, or `None` when the engine reports none.
    ///
    /// # Errors
    /// Returns `EngineError` if the statement fails or the name is invalid.
    async fn active_branch(&mut self) -> Result<Option<BranchName>, EngineError>;

    /// Whether a branch with this name exists.
    ///
    /// # Errors
    /// Returns `EngineError` if the statement fails.
    async fn branch_exists(&mut self, name: &BranchName) -> Result<bool, EngineError>;

    /// All branches, sorted by name.
    ///
    /// # Errors
    /// Returns `EngineError` if the statement fails.
    async fn list_branches(&mut self) -> Result<Vec<BranchName>, EngineError>;

    /// Makes `name` the active branch.
    ///
    /// # Errors
    /// Returns `EngineError` if the statement fails.
    async fn checkout(&mut self, name: &BranchName, mode: CheckoutMode)
    -> Result<(), EngineError>;

    /// Whether the working set holds uncommitted changes.
    ///
    /// # Errors
    /// Returns `EngineError` if the statement fails.
    async fn has_pending_changes(&mut self) -> Result<bool, EngineError>;

    /// Stages and commits every pending change.
    ///
    /// # Errors
    /// Returns `EngineError` if the statement fails or returns no id.
    async fn commit_all(&mut self, message: &CommitMessage) -> Result<CommitId, EngineError>;

    /// Stores `commit` in the session's `@@{database}_head` variable.
    ///
    /// # Errors
    /// Returns `EngineError` if the statement fails.
    async fn record_session_head(&mut self, commit: &CommitId) -> Result<(), EngineError>;

    /// Reads the session's `@@{database}_head` variable.
    ///
    /// # Errors
    /// Returns `EngineError` if the statement fails.
    async fn session_head(&mut self) -> Result<Option<CommitId>, EngineError>;

    /// Commit the named branch points at.
    ///
    /// # Errors
    /// Returns `EngineError` if the statement fails.
    async fn branch_head(&mut self, name: &BranchName) -> Result<Option<CommitId>, EngineError>;

    /// Commits the session's transaction and closes the connection.
    ///
    /// # Errors
    /// Returns `EngineError` if the commit fails. The connection is released
    /// either way.
    async fn finish(self: Box<Self>) -> Result<(), EngineError>;
}

/// Opens sessions against one target database.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a fresh session.
    ///
    /// # Errors
    /// Returns `EngineError` if the engine cannot be reached or the target
    /// database does not exist.
    async fn open(&self) -> Result<Box<dyn EngineSession>, EngineError>;

    /// `host:port/database` description used in logs.
    fn target(&self) -> String;
}
