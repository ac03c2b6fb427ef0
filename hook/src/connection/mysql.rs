//! MySQL-protocol adapter for a Dolt `sql-server`.
//!
//! One `MySqlConnection` per session, never pooled. All values are bound.

use async_trait::async_trait;
use sqlx::{Connection, MySqlConnection};
use tracing::{debug, instrument, warn};

use super::error::EngineError;
use super::options::ConnectionOptions;
use super::session::{CheckoutMode, Connector, EngineSession};
use super::statements;
use crate::domain::{BranchName, CommitId, CommitMessage, DatabaseName};

/// Opens one MySQL connection per session.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    options: ConnectionOptions,
}

impl MySqlConnector {
    /// Creates a connector for the given options.
    #[must_use]
    pub fn new(options: ConnectionOptions) -> Self {
        Self { options }
    }

    /// The options sessions are opened with.
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    #[instrument(skip(self), fields(target = %self.options.target()))]
    async fn open(&self) -> Result<Box<dyn EngineSession>, EngineError> {
        let conn = MySqlConnection::connect_with(&self.options.to_mysql())
            .await
            .map_err(|source| EngineError::Connect {
                target: self.options.target(),
                source,
            })?;
        debug!("Session opened");
        Ok(Box::new(MySqlSession {
            conn,
            database: self.options.database().clone(),
        }))
    }

    fn target(&self) -> String {
        self.options.target()
    }
}

/// A session over a single MySQL connection.
pub struct MySqlSession {
    conn: MySqlConnection,
    database: DatabaseName,
}

/// Dolt answers some functions with a one-element array; keep only the value.
fn normalize_commit_id(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_matches('"')
}

#[async_trait]
impl EngineSession for MySqlSession {
    #[instrument(skip(self))]
    async fn active_branch(&mut self) -> Result<Option<BranchName>, EngineError> {
        let name: Option<Option<String>> = sqlx::query_scalar(statements::ACTIVE_BRANCH)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|e| EngineError::query(statements::ACTIVE_BRANCH, e))?;

        Ok(name.flatten().map(BranchName::new).transpose()?)
    }

    #[instrument(skip(self, name), fields(branch = %name))]
    async fn branch_exists(&mut self, name: &BranchName) -> Result<bool, EngineError> {
        let row = sqlx::query(statements::BRANCH_EXISTS)
            .bind(name.as_str())
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|e| EngineError::query(statements::BRANCH_EXISTS, e))?;
        Ok(row.is_some())
    }

    #[instrument(skip(self))]
    async fn list_branches(&mut self) -> Result<Vec<BranchName>, EngineError> {
        let names: Vec<String> = sqlx::query_scalar(statements::LIST_BRANCHES)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| EngineError::query(statements::LIST_BRANCHES, e))?;

        let mut branches = Vec::with_capacity(names.len());
        for name in names {
            match BranchName::new(name) {
                Ok(branch) => branches.push(branch),
                Err(e) => warn!("Skipping branch the hook cannot address: {e}"),
            }
        }
        Ok(branches)
    }

    #[instrument(skip(self, name, mode), fields(branch = %name, mode = ?mode))]
    async fn checkout(
        &mut self,
        name: &BranchName,
        mode: CheckoutMode,
    ) -> Result<(), EngineError> {
        let statement = match mode {
            CheckoutMode::Switch => statements::CHECKOUT,
            CheckoutMode::Create => statements::CHECKOUT_NEW,
        };
        sqlx::query(statement)
            .bind(name.as_str())
            .execute(&mut self.conn)
            .await
            .map_err(|e| EngineError::query(statement, e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn has_pending_changes(&mut self) -> Result<bool, EngineError> {
        let row = sqlx::query(statements::STATUS)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|e| EngineError::query(statements::STATUS, e))?;
        Ok(row.is_some())
    }

    #[instrument(skip(self, message))]
    async fn commit_all(&mut self, message: &CommitMessage) -> Result<CommitId, EngineError> {
        let id: Option<String> = sqlx::query_scalar(statements::COMMIT_ALL)
            .bind(message.as_str())
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| EngineError::query(statements::COMMIT_ALL, e))?;

        let id = id.as_deref().map(normalize_commit_id).unwrap_or_default();
        if id.is_empty() {
            return Err(EngineError::UnexpectedResult(
                "commit returned no identifier".to_string(),
            ));
        }
        Ok(CommitId::new(id))
    }

    #[instrument(skip(self, commit), fields(database = %self.database, commit = %commit))]
    async fn record_session_head(&mut self, commit: &CommitId) -> Result<(), EngineError> {
        let sql = statements::record_head(&self.database);
        sqlx::query(&sql)
            .bind(commit.as_str())
            .execute(&mut self.conn)
            .await
            .map_err(|e| EngineError::query(statements::RECORD_HEAD, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(database = %self.database))]
    async fn session_head(&mut self) -> Result<Option<CommitId>, EngineError> {
        let sql = statements::read_head(&self.database);
        let head: Option<Option<String>> = sqlx::query_scalar(&sql)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|e| EngineError::query(statements::READ_HEAD, e))?;
        Ok(head.flatten().map(CommitId::new))
    }

    #[instrument(skip(self, name), fields(branch = %name))]
    async fn branch_head(&mut self, name: &BranchName) -> Result<Option<CommitId>, EngineError> {
        let head: Option<Option<String>> = sqlx::query_scalar(statements::BRANCH_HEAD)
            .bind(name.as_str())
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|e| EngineError::query(statements::BRANCH_HEAD, e))?;
        Ok(head.flatten().map(CommitId::new))
    }

    #[instrument(skip(self))]
    async fn finish(self: Box<Self>) -> Result<(), EngineError> {
        let MySqlSession { mut conn, .. } = *self;
        let committed = sqlx::query(statements::END_TRANSACTION)
            .execute(&mut conn)
            .await
            .map_err(|e| EngineError::query(statements::END_TRANSACTION, e));

        if let Err(e) = conn.close().await {
            debug!("Connection did not close cleanly: {e}");
        }
        committed.map(|_| ())
    }
}
