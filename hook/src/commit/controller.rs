//! Commit controller.
//!
//! Commits only when the working set has changes, so a run that wrote
//! nothing leaves history untouched.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::connection::{Connector, EngineError};
use crate::domain::{BranchName, CommitId, CommitMessage};
use crate::lifecycle::RunParams;

/// Commit operations, one session each.
#[derive(Clone)]
pub struct CommitController {
    connector: Arc<dyn Connector>,
}

impl CommitController {
    /// Creates a controller opening sessions from `connector`.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Message recorded for a run's commit.
    #[must_use]
    pub fn commit_message(run_params: &RunParams) -> CommitMessage {
        CommitMessage::for_run(run_params.run_id())
    }

    /// Commits every pending change with `message`.
    ///
    /// Returns `Ok(None)` without committing when nothing is pending. On
    /// success the new id is also written to the session's
    /// `@@{database}_head` variable.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the session cannot be opened or any statement fails.
    #[instrument(skip(self, message), fields(target = %self.connector.target()))]
    pub async fn commit(&self, message: &CommitMessage) -> Result<Option<CommitId>, EngineError> {
        let mut session = self.connector.open().await?;

        if !session.has_pending_changes().await? {
            session.finish().await?;
            debug!("No pending changes, nothing to commit");
            return Ok(None);
        }

        let commit = session.commit_all(message).await?;
        session.record_session_head(&commit).await?;
        session.finish().await?;

        info!(commit = %commit, "Committed pending changes: {message}");
        Ok(Some(commit))
    }

    /// Head recorded in a fresh session's `@@{database}_head` variable.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the session cannot be opened or the query fails.
    #[instrument(skip(self), fields(target = %self.connector.target()))]
    pub async fn session_head(&self) -> Result<Option<CommitId>, EngineError> {
        let mut session = self.connector.open().await?;
        let head = session.session_head().await?;
        session.finish().await?;
        Ok(head)
    }

    /// Commit `branch` points at.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the session cannot be opened or the query fails.
    #[instrument(skip(self, branch), fields(target = %self.connector.target(), branch = %branch))]
    pub async fn branch_head(&self, branch: &BranchName) -> Result<Option<CommitId>, EngineError> {
        let mut session = self.connector.open().await?;
        let head = session.branch_head(branch).await?;
        session.finish().await?;
        Ok(head)
    }
}

impl std::fmt::Debug for CommitController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitController")
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

    fn setup() -> (MemoryEngine, CommitController) {
        let engine = MemoryEngine::new(DatabaseName::new("foo").expect("valid name"));
        let controller = CommitController::new(Arc::new(engine.default_connector()));
        (engine, controller)
    }

    #[tokio::test]
    async fn test_commit_without_changes_is_a_no_op() -> Result<()> {
        let (engine, controller) = setup();
        let starting_head = controller.session_head().await?;

        let commit = controller.commit(&CommitMessage::new("test")).await?;

        assert_eq!(commit, None);
        assert_eq!(controller.session_head().await?, starting_head);
        assert!(!engine.journal().contains(&Operation::CommitAll));
        assert!(engine.recorded_heads().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_with_changes_moves_head() -> Result<()> {
        let (engine, controller) = setup();
        let starting_head = controller.session_head().await?;
        engine.stage_change();

        let commit = controller
            .commit(&CommitMessage::new("test"))
            .await?
            .expect("pending changes produce a commit");

        assert_ne!(Some(commit.clone()), starting_head);
        assert_eq!(controller.session_head().await?, Some(commit.clone()));
        assert_eq!(engine.recorded_heads(), vec![commit]);
        assert_eq!(engine.live_sessions(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_statement_order() -> Result<()> {
        let (engine, controller) = setup();
        engine.stage_change();

        controller.commit(&CommitMessage::new("test")).await?;

        assert_eq!(
            engine.journal(),
            vec![
                Operation::Status,
                Operation::CommitAll,
                Operation::RecordHead,
                Operation::Finish,
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_status_leaves_changes_pending() {
        let (engine, controller) = setup();
        engine.stage_change();
        engine.fail(Operation::Status);

        assert!(controller.commit(&CommitMessage::new("test")).await.is_err());
        assert_eq!(engine.pending_changes(), 1);
        assert_eq!(engine.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_branch_head_lookup() -> Result<()> {
        let (engine, controller) = setup();
        let master = BranchName::new("master")?;
        let missing = BranchName::new("missing")?;

        assert_eq!(controller.branch_head(&master).await?, Some(engine.head()));
        assert_eq!(controller.branch_head(&missing).await?, None);
        Ok(())
    }

    #[test]
    fn test_commit_message_uses_run_id() {
        let params = RunParams::new("f");
        assert_eq!(
            CommitController::commit_message(&params).as_str(),
            "Update from run: f"
        );
    }
}
