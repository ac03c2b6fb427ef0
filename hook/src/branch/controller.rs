//! Branch controller.
//!
//! Queries and switches the engine's active branch. The engine is the only
//! source of truth: nothing about branches is cached between calls.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::connection::{CheckoutMode, Connector, EngineError};
use crate::domain::BranchName;

/// What a checkout had to do to reach the requested branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The branch existed and is now active.
    Switched,
    /// The branch did not exist; it was created from the current head and is now active.
    Created,
}

/// Branch operations, one session each.
#[derive(Clone)]
pub struct BranchController {
    connector: Arc<dyn Connector>,
}

impl BranchController {
    /// Creates a controller opening sessions from `connector`.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Branch the engine currently has checked out.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the session cannot be opened or the query fails.
    #[instrument(skip(self), fields(target = %self.connector.target()))]
    pub async fn active_branch(&self) -> Result<Option<BranchName>, EngineError> {
        let mut session = self.connector.open().await?;
        let branch = session.active_branch().await?;
        session.finish().await?;

        debug!(branch = ?branch, "Read active branch");
        Ok(branch)
    }

    /// Makes `branch` the active branch, creating it first if it does not exist.
    ///
    /// Running the same checkout twice is harmless: the second call finds the
    /// branch and simply switches to it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the session cannot be opened or any statement fails.
    #[instrument(skip(self, branch), fields(target = %self.connector.target(), branch = %branch))]
    pub async fn checkout(&self, branch: &BranchName) -> Result<CheckoutOutcome, EngineError> {
        let mut session = self.connector.open().await?;

        let outcome = if session.branch_exists(branch).await? {
            session.checkout(branch, CheckoutMode::Switch).await?;
            CheckoutOutcome::Switched
        } else {
            session.checkout(branch, CheckoutMode::Create).await?;
            CheckoutOutcome::Created
        };
        session.finish().await?;

        info!(outcome = ?outcome, "Checked out branch {branch}");
        Ok(outcome)
    }

    /// Whether `branch` exists.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the session cannot be opened or the query fails.
    #[instrument(skip(self, branch), fields(target = %self.connector.target(), branch = %branch))]
    pub async fn branch_exists(&self, branch: &BranchName) -> Result<bool, EngineError> {
        let mut session = self.connector.open().await?;
        let exists = session.branch_exists(branch).await?;
        session.finish().await?;
        Ok(exists)
    }

    /// All branches of the target database.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the session cannot be opened or the query fails.
    #[instrument(skip(self), fields(target = %self.connector.target()))]
    pub async fn list_branches(&self) -> Result<Vec<BranchName>, EngineError> {
        let mut session = self.connector.open().await?;
        let branches = session.list_branches().await?;
        session.finish().await?;
        Ok(branches)
    }
}

impl std::fmt::Debug for BranchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchController")
            .field("target", &self.connector.target())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{MemoryEngine, Operation};
    use crate::domain::DatabaseName;
    use anyhow::Result;

    fn setup() -> (MemoryEngine, BranchController) {
        let engine = MemoryEngine::new(DatabaseName::new("foo").expect("valid name"));
        engine.create_branch("new");
        let controller = BranchController::new(Arc::new(engine.default_connector()));
        (engine, controller)
    }

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).expect("valid name")
    }

    #[tokio::test]
    async fn test_checkout_sequence_tracks_active_branch() -> Result<()> {
        let (engine, controller) = setup();

        for name in ["master", "new", "new2", "master"] {
            controller.checkout(&branch(name)).await?;
            assert_eq!(engine.active_branch(), name);
            assert_eq!(controller.active_branch().await?, Some(branch(name)));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_creates_missing_branch_once() -> Result<()> {
        let (_engine, controller) = setup();

        let first = controller.checkout(&branch("new2")).await?;
        let second = controller.checkout(&branch("new2")).await?;

        assert_eq!(first, CheckoutOutcome::Created);
        assert_eq!(second, CheckoutOutcome::Switched);
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_uses_one_session_and_commits_it() -> Result<()> {
        let (engine, controller) = setup();

        controller.checkout(&branch("new")).await?;

        assert_eq!(
            engine.journal(),
            vec![Operation::BranchExists, Operation::Checkout, Operation::Finish]
        );
        assert_eq!(engine.live_sessions(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_checkout_releases_session() {
        let (engine, controller) = setup();
        engine.fail(Operation::CheckoutNew);

        let result = controller.checkout(&branch("new3")).await;

        assert!(result.is_err());
        assert_eq!(engine.active_branch(), "master");
        assert_eq!(engine.live_sessions(), 0);
        assert!(!engine.journal().contains(&Operation::Finish));
    }

    #[tokio::test]
    async fn test_active_branch_on_unknown_database_is_an_error() {
        let (engine, _) = setup();
        let controller = BranchController::new(Arc::new(
            engine.connector(DatabaseName::new("noexist").expect("valid name")),
        ));

        let result = controller.active_branch().await;
        assert!(matches!(result, Err(e) if e.is_connectivity()));
    }

    #[tokio::test]
    async fn test_list_and_exists() -> Result<()> {
        let (_engine, controller) = setup();

        assert_eq!(
            controller.list_branches().await?,
            vec![branch("master"), branch("new")]
        );
        assert!(controller.branch_exists(&branch("new")).await?);
        assert!(!controller.branch_exists(&branch("other")).await?);
        Ok(())
    }
}
