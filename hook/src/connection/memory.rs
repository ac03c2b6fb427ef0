//! In-memory engine speaking the same session contract as the SQL adapter.
//!
//! It models one server hosting a single database with a globally active
//! branch, per-branch working sets and content-addressed commit ids. Every
//! executed verb is journaled, and any verb can be made to fail, which makes
//! partial-failure paths reproducible without a running `sql-server`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::error::EngineError;
use super::session::{CheckoutMode, Connector, EngineSession};
use super::statements;
use crate::domain::{BranchName, CommitId, CommitMessage, DatabaseName};

/// Length of generated commit ids, matching Dolt's 32-character hashes.
const COMMIT_ID_LEN: usize = 32;

/// A verb of the session contract, as recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `active_branch()`
    ActiveBranch,
    /// Existence check on `dolt_branches`.
    BranchExists,
    /// Listing of `dolt_branches`.
    ListBranches,
    /// `dolt_checkout(name)`
    Checkout,
    /// `dolt_checkout('-b', name)`
    CheckoutNew,
    /// `dolt_status`
    Status,
    /// `dolt_commit('-am', message)`
    CommitAll,
    /// `SET @@{database}_head`
    RecordHead,
    /// `SELECT @@{database}_head`
    ReadHead,
    /// `HASHOF(name)`
    BranchHead,
    /// `COMMIT` at the end of a session.
    Finish,
}

impl Operation {
    fn statement(self) -> &'static str {
        match self {
            Self::ActiveBranch => statements::ACTIVE_BRANCH,
            Self::BranchExists => statements::BRANCH_EXISTS,
            Self::ListBranches => statements::LIST_BRANCHES,
            Self::Checkout => statements::CHECKOUT,
            Self::CheckoutNew => statements::CHECKOUT_NEW,
            Self::Status => statements::STATUS,
            Self::CommitAll => statements::COMMIT_ALL,
            Self::RecordHead => statements::RECORD_HEAD,
            Self::ReadHead => statements::READ_HEAD,
            Self::BranchHead => statements::BRANCH_HEAD,
            Self::Finish => statements::END_TRANSACTION,
        }
    }
}

#[derive(Debug, Clone)]
struct BranchState {
    head: CommitId,
    pending: usize,
}

#[derive(Debug)]
struct EngineState {
    database: DatabaseName,
    active: BranchName,
    branches: BTreeMap<BranchName, BranchState>,
    commit_seq: u64,
    recorded_heads: Vec<CommitId>,
    journal: Vec<Operation>,
    failing: HashSet<Operation>,
    unavailable: Option<String>,
    live_sessions: usize,
}

impl EngineState {
    fn next_commit_id(&mut self, message: &str) -> CommitId {
        self.commit_seq += 1;
        let mut hasher = Sha256::new();
        hasher.update(self.database.as_str());
        hasher.update(self.active.as_str());
        hasher.update(self.commit_seq.to_le_bytes());
        hasher.update(message);
        let digest = hex::encode(hasher.finalize());
        CommitId::new(&digest[..COMMIT_ID_LEN])
    }

    fn active_state(&mut self) -> &mut BranchState {
        self.branches
            .get_mut(&self.active)
            .expect("active branch always has state")
    }
}

fn rejected(operation: Operation, message: impl Into<String>) -> EngineError {
    EngineError::query(
        operation.statement(),
        sqlx::Error::Protocol(message.into()),
    )
}

/// In-memory server hosting one database.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    state: Arc<Mutex<EngineState>>,
}

impl MemoryEngine {
    /// Creates a server whose database starts on `master` with one initial commit.
    ///
    /// # Panics
    /// Never in practice: `master` is a valid branch name.
    #[must_use]
    pub fn new(database: DatabaseName) -> Self {
        let master = BranchName::new("master").expect("'master' is a valid branch name");
        let mut state = EngineState {
            database,
            active: master.clone(),
            branches: BTreeMap::new(),
            commit_seq: 0,
            recorded_heads: Vec::new(),
            journal: Vec::new(),
            failing: HashSet::new(),
            unavailable: None,
            live_sessions: 0,
        };
        let initial = state.next_commit_id("Initialize data repository");
        state.branches.insert(
            master,
            BranchState {
                head: initial,
                pending: 0,
            },
        );
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Connector for `database` on this server. Opening fails if the
    /// server does not host that database.
    #[must_use]
    pub fn connector(&self, database: DatabaseName) -> MemoryConnector {
        MemoryConnector {
            engine: self.clone(),
            database,
        }
    }

    /// Connector for the hosted database.
    #[must_use]
    pub fn default_connector(&self) -> MemoryConnector {
        let database = self.state.lock().database.clone();
        self.connector(database)
    }

    /// Currently active branch.
    #[must_use]
    pub fn active_branch(&self) -> BranchName {
        self.state.lock().active.clone()
    }

    /// Head of `branch`, if it exists.
    #[must_use]
    pub fn branch_head(&self, branch: &str) -> Option<CommitId> {
        let state = self.state.lock();
        state
            .branches
            .iter()
            .find(|(name, _)| name.as_str() == branch)
            .map(|(_, b)| b.head.clone())
    }

    /// Head of the active branch.
    #[must_use]
    pub fn head(&self) -> CommitId {
        let mut state = self.state.lock();
        state.active_state().head.clone()
    }

    /// Creates `branch` at the active head without switching to it.
    ///
    /// # Panics
    /// Panics if `branch` is not a valid branch name.
    pub fn create_branch(&self, branch: &str) {
        let name = BranchName::new(branch).expect("valid branch name");
        let mut state = self.state.lock();
        let head = state.active_state().head.clone();
        state
            .branches
            .entry(name)
            .or_insert(BranchState { head, pending: 0 });
    }

    /// Records one uncommitted change on the active branch, as a pipeline
    /// write would.
    pub fn stage_change(&self) {
        self.state.lock().active_state().pending += 1;
    }

    /// Number of uncommitted changes on the active branch.
    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.state.lock().active_state().pending
    }

    /// Every commit id written to the session head variable, oldest first.
    #[must_use]
    pub fn recorded_heads(&self) -> Vec<CommitId> {
        self.state.lock().recorded_heads.clone()
    }

    /// Every verb executed so far, in order.
    #[must_use]
    pub fn journal(&self) -> Vec<Operation> {
        self.state.lock().journal.clone()
    }

    /// Clears the journal.
    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }

    /// Makes `operation` fail until [`MemoryEngine::clear_failures`] is called.
    pub fn fail(&self, operation: Operation) {
        self.state.lock().failing.insert(operation);
    }

    /// Stops injecting failures.
    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing.clear();
        state.unavailable = None;
    }

    /// Refuses every new session with `reason`.
    pub fn refuse_connections(&self, reason: impl Into<String>) {
        self.state.lock().unavailable = Some(reason.into());
    }

    /// Sessions opened and not yet finished or dropped.
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        self.state.lock().live_sessions
    }
}

/// Opens [`MemorySession`]s on a [`MemoryEngine`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    engine: MemoryEngine,
    database: DatabaseName,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self) -> Result<Box<dyn EngineSession>, EngineError> {
        let mut state = self.engine.state.lock();
        if let Some(reason) = &state.unavailable {
            return Err(EngineError::Unavailable(reason.clone()));
        }
        if state.database != self.database {
            return Err(EngineError::Unavailable(format!(
                "unknown database '{}'",
                self.database
            )));
        }
        state.live_sessions += 1;
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.engine.state),
            head_override: None,
        }))
    }

    fn target(&self) -> String {
        format!("memory/{}", self.database)
    }
}

/// A session on a [`MemoryEngine`].
pub struct MemorySession {
    state: Arc<Mutex<EngineState>>,
    head_override: Option<CommitId>,
}

impl MemorySession {
    fn run<T>(
        &self,
        operation: Operation,
        f: impl FnOnce(&mut EngineState) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut state = self.state.lock();
        state.journal.push(operation);
        if state.failing.contains(&operation) {
            return Err(EngineError::Unavailable(format!(
                "injected failure on {operation:?}"
            )));
        }
        f(&mut state)
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.live_sessions = state.live_sessions.saturating_sub(1);
    }
}

#[async_trait]
impl EngineSession for MemorySession {
    async fn active_branch(&mut self) -> Result<Option<BranchName>, EngineError> {
        self.run(Operation::ActiveBranch, |s| Ok(Some(s.active.clone())))
    }

    async fn branch_exists(&mut self, name: &BranchName) -> Result<bool, EngineError> {
        self.run(Operation::BranchExists, |s| Ok(s.branches.contains_key(name)))
    }

    async fn list_branches(&mut self) -> Result<Vec<BranchName>, EngineError> {
        self.run(Operation::ListBranches, |s| {
            Ok(s.branches.keys().cloned().collect())
        })
    }

    async fn checkout(
        &mut self,
        name: &BranchName,
        mode: CheckoutMode,
    ) -> Result<(), EngineError> {
        let operation = match mode {
            CheckoutMode::Switch => Operation::Checkout,
            CheckoutMode::Create => Operation::CheckoutNew,
        };
        self.run(operation, |s| {
            match mode {
                CheckoutMode::Switch if !s.branches.contains_key(name) => {
                    return Err(rejected(operation, format!("branch not found: {name}")));
                }
                CheckoutMode::Create if s.branches.contains_key(name) => {
                    return Err(rejected(
                        operation,
                        format!("fatal: A branch named '{name}' already exists."),
                    ));
                }
                CheckoutMode::Create => {
                    let head = s.active_state().head.clone();
                    s.branches
                        .insert(name.clone(), BranchState { head, pending: 0 });
                }
                CheckoutMode::Switch => {}
            }
            s.active = name.clone();
            Ok(())
        })
    }

    async fn has_pending_changes(&mut self) -> Result<bool, EngineError> {
        self.run(Operation::Status, |s| Ok(s.active_state().pending > 0))
    }

    async fn commit_all(&mut self, message: &CommitMessage) -> Result<CommitId, EngineError> {
        self.run(Operation::CommitAll, |s| {
            if s.active_state().pending == 0 {
                return Err(rejected(Operation::CommitAll, "nothing to commit"));
            }
            let id = s.next_commit_id(message.as_str());
            let branch = s.active_state();
            branch.head = id.clone();
            branch.pending = 0;
            Ok(id)
        })
    }

    async fn record_session_head(&mut self, commit: &CommitId) -> Result<(), EngineError> {
        self.run(Operation::RecordHead, |s| {
            s.recorded_heads.push(commit.clone());
            Ok(())
        })?;
        self.head_override = Some(commit.clone());
        Ok(())
    }

    async fn session_head(&mut self) -> Result<Option<CommitId>, EngineError> {
        let head_override = self.head_override.clone();
        self.run(Operation::ReadHead, |s| {
            Ok(head_override.or_else(|| Some(s.active_state().head.clone())))
        })
    }

    async fn branch_head(&mut self, name: &BranchName) -> Result<Option<CommitId>, EngineError> {
        self.run(Operation::BranchHead, |s| {
            Ok(s.branches.get(name).map(|b| b.head.clone()))
        })
    }

    async fn finish(self: Box<Self>) -> Result<(), EngineError> {
        self.run(Operation::Finish, |_| Ok(()))
    }
}
