//! Run lifecycle coordinator.
//!
//! `before_run` optionally moves the engine to the branch a run asked for and
//! remembers where it was; `after_run` commits whatever the run wrote and
//! moves the engine back. Version-control failures are logged and never
//! reach the caller: a run must not fail because its bookkeeping did.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::params::RunParams;
use super::state::HookState;
use crate::best_effort::BestEffort;
use crate::branch::{BranchController, CheckoutOutcome};
use crate::commit::CommitController;
use crate::connection::{ConnectionOptions, Connector, MySqlConnector};
use crate::domain::{BranchName, CommitId};
use crate::infrastructure::audit::{self, AuditEvent};
use crate::infrastructure::config::Settings;

/// Coordinates branch switching and committing around a run.
///
/// Lifecycle calls take `&mut self`, so one hook can never run two of them
/// at the same time.
#[derive(Debug)]
pub struct DoltHook {
    branches: BranchController,
    commits: CommitController,
    branch: BranchName,
    state: HookState,
}

impl DoltHook {
    /// Hook talking to a Dolt `sql-server` over the MySQL protocol.
    #[must_use]
    pub fn new(options: ConnectionOptions, default_branch: BranchName) -> Self {
        Self::with_connector(Arc::new(MySqlConnector::new(options)), default_branch)
    }

    /// Hook built from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.database.connection_options(),
            settings.hook.default_branch.clone(),
        )
    }

    /// Hook opening sessions from any connector.
    #[must_use]
    pub fn with_connector(connector: Arc<dyn Connector>, default_branch: BranchName) -> Self {
        Self {
            branches: BranchController::new(Arc::clone(&connector)),
            commits: CommitController::new(connector),
            branch: default_branch,
            state: HookState::Idle,
        }
    }

    /// Current state of the override state machine.
    #[must_use]
    pub fn state(&self) -> &HookState {
        &self.state
    }

    /// Branch to restore when the run ends, if any.
    #[must_use]
    pub fn original_branch(&self) -> Option<&BranchName> {
        self.state.original_branch()
    }

    /// Branch runs work on: the default, or the last branch a run requested.
    #[must_use]
    pub fn configured_branch(&self) -> &BranchName {
        &self.branch
    }

    /// Branch operations used by the hook.
    #[must_use]
    pub fn branches(&self) -> &BranchController {
        &self.branches
    }

    /// Commit operations used by the hook.
    #[must_use]
    pub fn commits(&self) -> &CommitController {
        &self.commits
    }

    /// Called when a run starts.
    ///
    /// If the run asks for a branch, the active branch is recorded and the
    /// requested branch is checked out, created if needed. Without a request
    /// nothing changes.
    ///
    /// When an override is already active the recorded branch is not the
    /// pre-call active branch: the first recorded original is kept, so
    /// [`DoltHook::after_run`] returns to the branch found before the first
    /// override rather than to an intermediate run branch.
    #[instrument(skip(self, run_params), fields(run_id = %run_params.run_id()))]
    pub async fn before_run(&mut self, run_params: &RunParams) {
        let requested = match run_params.requested_branch() {
            Ok(Some(branch)) => branch,
            Ok(None) => {
                debug!("No branch requested, staying on the active branch");
                return;
            }
            Err(e) => {
                warn!("Ignoring branch request: {e}");
                return;
            }
        };
        self.branch = requested.clone();

        let original = match &self.state {
            HookState::BranchOverridden { original, .. } => {
                warn!(
                    "A branch override is already active; {original} stays the branch to restore"
                );
                Some(original.clone())
            }
            HookState::Idle => self
                .branches
                .active_branch()
                .await
                .or_warn("active_branch")
                .flatten(),
        };

        let Some(outcome) = self.branches.checkout(&requested).await.or_warn("checkout") else {
            return;
        };

        audit::log_audit(&AuditEvent::BranchSwitched {
            run_id: run_params.run_id().to_string(),
            from: original.as_ref().map(ToString::to_string),
            to: requested.to_string(),
            created: outcome == CheckoutOutcome::Created,
        });

        match original {
            Some(original) => {
                info!("Run works on {requested}, {original} will be restored afterwards");
                self.state = HookState::BranchOverridden {
                    original,
                    active: requested,
                };
            }
            None => warn!(
                "Switched to {requested} without knowing the previous branch; it will not be restored"
            ),
        }
    }

    /// Called when a run ends.
    ///
    /// Commits pending changes, then checks out the branch recorded by
    /// [`DoltHook::before_run`], if any. Returns the new commit, or `None`
    /// when nothing was pending or the commit failed.
    #[instrument(skip(self, run_params), fields(run_id = %run_params.run_id()))]
    pub async fn after_run(&mut self, run_params: &RunParams) -> Option<CommitId> {
        let message = CommitController::commit_message(run_params);
        let commit = self.commits.commit(&message).await.or_warn("commit").flatten();

        if let Some(commit) = &commit {
            audit::log_audit(&AuditEvent::RunCommitted {
                run_id: run_params.run_id().to_string(),
                commit: commit.to_string(),
            });
        }

        if let HookState::BranchOverridden { original, active } = std::mem::take(&mut self.state)
        {
            let event = self.restore(run_params, original, active).await;
            audit::log_audit(&event);
        }

        commit
    }

    /// Checks out `original` again and describes the outcome for the audit log.
    async fn restore(
        &self,
        run_params: &RunParams,
        original: BranchName,
        active: BranchName,
    ) -> AuditEvent {
        let run_id = run_params.run_id().to_string();
        if self.branches.checkout(&original).await.or_warn("restore").is_some() {
            return AuditEvent::BranchRestored {
                run_id,
                branch: original.to_string(),
            };
        }

        warn!("Could not restore {original}; the database is likely still on {active}");
        AuditEvent::RestoreFailed {
            run_id,
            expected: original.to_string(),
            left_on: active.to_string(),
        }
    }
}
